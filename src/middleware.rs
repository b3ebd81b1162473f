use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::handlers::SharedState;
use crate::response::{retry_after_secs, too_many_requests_page};
use crate::subnet::subnet_key;
use crate::throttler::CooldownStatus;

/// Logging middleware for request/response tracking
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = raw_client_ip(&request).unwrap_or_else(|| "unknown".to_string());

    info!(
        target: "subnet_throttler::middleware",
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    let status = response.status();
    info!(
        target: "subnet_throttler::middleware",
        method = %method,
        uri = %uri,
        status = %status,
        "Request completed"
    );

    response
}

/// Subnet throttle in front of guarded routes: one token per request, and a
/// full blackout once the subnet drains its window.
pub async fn throttle_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let raw = raw_client_ip(&request).unwrap_or_default();
    let ip: IpAddr = match raw.parse() {
        Ok(ip) => ip,
        Err(_) => {
            warn!(target: "subnet_throttler::middleware", ip = %raw, "bad ip address");
            return (StatusCode::BAD_REQUEST, format!("wrong ip: {}", raw)).into_response();
        }
    };
    let subnet = subnet_key(ip, state.mask, state.mask_v6);

    if state.throttler.is_timed_out(&subnet) {
        match state.throttler.get(&subnet) {
            Ok(status) => {
                debug!(
                    target: "subnet_throttler::middleware",
                    ip = %ip,
                    subnet = %subnet,
                    "too many requests"
                );
                return cooldown_response(status);
            }
            // The cooldown can lapse between the check and the lookup; let
            // the token window decide.
            Err(Error::NotInCooldown(_)) => {}
            Err(err) => return err.into_response(),
        }
    }

    let take = match state.throttler.take(&subnet).await {
        Ok(take) => take,
        Err(err) => {
            error!(
                target: "subnet_throttler::middleware",
                error = %err,
                ip = %ip,
                subnet = %subnet,
                "can't take limiter token"
            );
            return err.into_response();
        }
    };

    if !take.allowed {
        debug!(
            target: "subnet_throttler::middleware",
            ip = %ip,
            subnet = %subnet,
            "too many requests"
        );
        return (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    }

    // A drained window rejects the whole subnet for a while.
    if take.remaining == 0 {
        info!(target: "subnet_throttler::middleware", subnet = %subnet, "subnet cooldown");
        state.throttler.cooldown_subnet(&subnet);
    }

    next.run(request).await
}

fn cooldown_response(status: CooldownStatus) -> Response {
    let retry_secs = retry_after_secs(status.expires_at);
    let body = too_many_requests_page(
        status.capacity,
        status.interval,
        Duration::from_secs(retry_secs),
    );

    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_secs.to_string())],
        Html(body),
    )
        .into_response()
}

/// Client address as reported upstream: first X-Forwarded-For entry, then
/// X-Real-Ip, then the socket peer.
fn raw_client_ip(request: &Request) -> Option<String> {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return Some(first_ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.trim().to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect| connect.0.ip().to_string())
}
