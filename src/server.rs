use crate::config::Config;
use crate::error::Error;
use crate::handlers::{health, home, reset, AppState, SharedState};
use crate::middleware::{logging_middleware, throttle_middleware};
use crate::throttler::Throttler;
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub struct Server {
    app: Router,
    state: SharedState,
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let throttler = Throttler::new(
            config.requests_per_interval,
            config.requests_interval.into(),
            config.request_cooldown.into(),
        )?;
        let state: SharedState = Arc::new(AppState {
            throttler,
            mask: config.mask,
            mask_v6: config.mask_v6,
        });
        let app = create_app(state.clone(), &config);

        Ok(Self { app, state, config })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(self.config.http_server_address).await?;

        tracing::info!(
            "Subnet throttler listening on {}",
            self.config.http_server_address
        );

        // Peer addresses feed the subnet keys when no proxy header is set.
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        // In-flight connections are drained by this point.
        tracing::info!("Closing limiter store");
        tokio::time::timeout(
            self.config.shutdown_timeout.into(),
            self.state.throttler.close(),
        )
        .await
        .map_err(Error::from)??;

        Ok(())
    }
}

/// Builds the application router. Exposed for integration tests, which
/// drive it without binding a socket.
pub fn create_app(state: SharedState, config: &Config) -> Router {
    let guarded = Router::new()
        .route("/", get(home))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            throttle_middleware,
        ));

    Router::new()
        .merge(guarded)
        // Operator and probe endpoints stay outside the throttle.
        .route("/reset", get(reset))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout.into()))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
