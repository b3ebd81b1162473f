use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Masks an address down to its network address and renders it as the
/// throttling key, e.g. 203.0.113.57 with a /24 prefix becomes "203.0.113.0".
pub fn subnet_key(addr: IpAddr, v4_prefix: u8, v6_prefix: u8) -> String {
    match addr {
        IpAddr::V4(v4) => mask_v4(v4, v4_prefix).to_string(),
        IpAddr::V6(v6) => mask_v6(v6, v6_prefix).to_string(),
    }
}

fn mask_v4(addr: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    let bits = u32::from(addr);
    let masked = match prefix {
        0 => 0,
        p if p >= 32 => bits,
        p => bits & (u32::MAX << (32 - p)),
    };
    Ipv4Addr::from(masked)
}

fn mask_v6(addr: Ipv6Addr, prefix: u8) -> Ipv6Addr {
    let bits = u128::from(addr);
    let masked = match prefix {
        0 => 0,
        p if p >= 128 => bits,
        p => bits & (u128::MAX << (128 - p)),
    };
    Ipv6Addr::from(masked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v4_slash_24() {
        let addr: IpAddr = "203.0.113.57".parse().unwrap();
        assert_eq!(subnet_key(addr, 24, 64), "203.0.113.0");
    }

    #[test]
    fn test_v4_slash_16() {
        let addr: IpAddr = "10.42.7.200".parse().unwrap();
        assert_eq!(subnet_key(addr, 16, 64), "10.42.0.0");
    }

    #[test]
    fn test_v4_host_prefix_is_identity() {
        let addr: IpAddr = "192.168.1.77".parse().unwrap();
        assert_eq!(subnet_key(addr, 32, 64), "192.168.1.77");
    }

    #[test]
    fn test_v4_zero_prefix_groups_everyone() {
        let a: IpAddr = "8.8.8.8".parse().unwrap();
        let b: IpAddr = "1.2.3.4".parse().unwrap();
        assert_eq!(subnet_key(a, 0, 64), subnet_key(b, 0, 64));
        assert_eq!(subnet_key(a, 0, 64), "0.0.0.0");
    }

    #[test]
    fn test_v6_slash_64() {
        let addr: IpAddr = "2001:db8:85a3:8d3:1319:8a2e:370:7348".parse().unwrap();
        assert_eq!(subnet_key(addr, 24, 64), "2001:db8:85a3:8d3::");
    }

    #[test]
    fn test_v6_slash_48() {
        let a: IpAddr = "2001:db8:85a3:1::1".parse().unwrap();
        let b: IpAddr = "2001:db8:85a3:ffff::2".parse().unwrap();
        assert_eq!(subnet_key(a, 24, 48), subnet_key(b, 24, 48));
    }

    #[test]
    fn test_same_subnet_shares_key() {
        let a: IpAddr = "198.51.100.3".parse().unwrap();
        let b: IpAddr = "198.51.100.250".parse().unwrap();
        let c: IpAddr = "198.51.101.3".parse().unwrap();
        assert_eq!(subnet_key(a, 24, 64), subnet_key(b, 24, 64));
        assert_ne!(subnet_key(a, 24, 64), subnet_key(c, 24, 64));
    }
}
