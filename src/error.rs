use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the throttling core and its HTTP surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("key must be a non-empty string")]
    InvalidKey,

    #[error("subnet {0} does not exist")]
    UnknownKey(String),

    #[error("subnet {0} is not in cooldown")]
    NotInCooldown(String),

    #[error("limiter store is closed")]
    StoreClosed,

    #[error("operation deadline elapsed")]
    Elapsed(#[from] tokio::time::error::Elapsed),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::InvalidKey | Error::UnknownKey(_) | Error::NotInCooldown(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::StoreClosed => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidConfiguration(_) | Error::Elapsed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration(_) => "invalid_configuration",
            Error::InvalidKey => "invalid_key",
            Error::UnknownKey(_) => "unknown_subnet",
            Error::NotInCooldown(_) => "not_in_cooldown",
            Error::StoreClosed => "service_unavailable",
            Error::Elapsed(_) => "deadline_elapsed",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse::new(self.kind(), &self.to_string(), status.as_u16());
        (status, Json(body)).into_response()
    }
}
