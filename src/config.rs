use envconfig::Envconfig;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Deployment flavor; selects the log format at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Dev,
    Prod,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Env::Dev),
            "prod" | "production" => Ok(Env::Prod),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "HTTP_SERVER_ADDRESS", default = "0.0.0.0:8080")]
    pub http_server_address: SocketAddr,

    /// Deadline for handling a single request
    #[envconfig(from = "REQUEST_TIMEOUT", default = "5s")]
    pub request_timeout: humantime::Duration,

    /// Bound on graceful shutdown, including the limiter close
    #[envconfig(from = "SHUTDOWN_TIMEOUT", default = "10s")]
    pub shutdown_timeout: humantime::Duration,

    /// IPv4 prefix length used to group clients into subnets
    #[envconfig(from = "MASK", default = "24")]
    pub mask: u8,

    /// IPv6 prefix length used to group clients into subnets
    #[envconfig(from = "MASK_V6", default = "64")]
    pub mask_v6: u8,

    /// Requests each subnet may spend per interval
    #[envconfig(from = "REQUESTS_PER_INTERVAL", default = "10")]
    pub requests_per_interval: u64,

    /// Length of the request allowance window
    #[envconfig(from = "REQUESTS_INTERVAL", default = "10s")]
    pub requests_interval: humantime::Duration,

    /// Blackout applied to a subnet that drains its window
    #[envconfig(from = "REQUEST_COOLDOWN", default = "10s")]
    pub request_cooldown: humantime::Duration,

    /// dev for human-readable logs, prod for JSON
    #[envconfig(from = "ENV", default = "dev")]
    pub env: Env,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> std::result::Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    /// Bounds checks that per-field parsing cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.requests_per_interval == 0 {
            return Err(Error::InvalidConfiguration(
                "REQUESTS_PER_INTERVAL must be at least 1",
            ));
        }
        if self.requests_interval.is_zero() {
            return Err(Error::InvalidConfiguration(
                "REQUESTS_INTERVAL must be non-zero",
            ));
        }
        if self.request_cooldown.is_zero() {
            return Err(Error::InvalidConfiguration(
                "REQUEST_COOLDOWN must be non-zero",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfiguration(
                "REQUEST_TIMEOUT must be non-zero",
            ));
        }
        if self.mask > 32 {
            return Err(Error::InvalidConfiguration("MASK must be at most 32"));
        }
        if self.mask_v6 > 128 {
            return Err(Error::InvalidConfiguration("MASK_V6 must be at most 128"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            http_server_address: "0.0.0.0:8080".parse().unwrap(),
            request_timeout: "5s".parse().unwrap(),
            shutdown_timeout: "10s".parse().unwrap(),
            mask: 24,
            mask_v6: 64,
            requests_per_interval: 10,
            requests_interval: "10s".parse().unwrap(),
            request_cooldown: "10s".parse().unwrap(),
            env: Env::Dev,
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_zero_allowance_rejected() {
        let mut config = base_config();
        config.requests_per_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = base_config();
        config.requests_interval = "0s".parse().unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_masks_rejected() {
        let mut config = base_config();
        config.mask = 33;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.mask_v6 = 129;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_parsing() {
        assert_eq!("dev".parse::<Env>().unwrap(), Env::Dev);
        assert_eq!("PROD".parse::<Env>().unwrap(), Env::Prod);
        assert_eq!("production".parse::<Env>().unwrap(), Env::Prod);
        assert!("staging".parse::<Env>().is_err());
    }
}
