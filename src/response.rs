use humantime::format_duration;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Body of the 429 page served to a cooled-down subnet.
pub fn too_many_requests_page(capacity: u64, interval: Duration, retry_after: Duration) -> String {
    format!(
        "<html>\n  <head>\n    <title>Too Many Requests</title>\n  </head>\n  <body>\n    <h1>Too Many Requests</h1>\n    <p>I only allow {} requests per {} to this Web site per subnet. Try again after {}.</p>\n  </body>\n</html>\n",
        capacity,
        format_duration(interval),
        format_duration(retry_after)
    )
}

/// Whole seconds until `expires_at`, rounded up so clients never retry
/// early. Never less than one second, even if the deadline slips past
/// between lookup and rendering.
pub fn retry_after_secs(expires_at: Instant) -> u64 {
    let remaining = expires_at.saturating_duration_since(Instant::now());
    let secs = if remaining.subsec_nanos() > 0 {
        remaining.as_secs() + 1
    } else {
        remaining.as_secs()
    };
    secs.max(1)
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: String,
    pub subnet: String,
}

impl ResetResponse {
    pub fn ok(subnet: &str) -> Self {
        Self {
            status: "ok".to_string(),
            subnet: subnet.to_string(),
        }
    }
}
