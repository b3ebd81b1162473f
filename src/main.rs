use anyhow::Result;
use subnet_throttler::config::{Config, Env};
use subnet_throttler::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_tracing(config.env);

    tracing::info!("Starting subnet throttler");
    tracing::info!(
        "Configuration: address={}, mask=/{}, mask_v6=/{}, allowance={} per {}, cooldown={}",
        config.http_server_address,
        config.mask,
        config.mask_v6,
        config.requests_per_interval,
        config.requests_interval,
        config.request_cooldown
    );

    // Create and run the server
    let server = Server::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

fn init_tracing(env: Env) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subnet_throttler=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    match env {
        Env::Dev => registry.with(tracing_subscriber::fmt::layer()).init(),
        Env::Prod => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
