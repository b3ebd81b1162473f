use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::response::ResetResponse;
use crate::throttler::Throttler;

/// Shared application state
pub struct AppState {
    pub throttler: Throttler,
    pub mask: u8,
    pub mask_v6: u8,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    pub ip: Option<String>,
}

/// GET / - home page, behind the throttle
pub async fn home() -> &'static str {
    "Welcome to the home page!"
}

/// GET /reset?ip= - operator unblock for a masked subnet key
pub async fn reset(
    State(state): State<SharedState>,
    Query(params): Query<ResetParams>,
) -> Result<impl IntoResponse, Error> {
    let subnet = params.ip.unwrap_or_default();
    debug!(target: "subnet_throttler::handlers", ip = %subnet, "reset ip");

    if subnet.is_empty() {
        warn!(target: "subnet_throttler::handlers", ip = %subnet, "bad ip address");
        return Err(Error::InvalidKey);
    }

    if let Err(err) = state.throttler.reset(&subnet).await {
        warn!(
            target: "subnet_throttler::handlers",
            ip = %subnet,
            error = %err,
            "can't reset subnet"
        );
        return Err(err);
    }

    info!(target: "subnet_throttler::handlers", subnet = %subnet, "subnet limit reset");
    Ok(Json(ResetResponse::ok(&subnet)))
}

/// GET /health - liveness probe, outside the throttle
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
