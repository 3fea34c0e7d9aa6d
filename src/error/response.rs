//! Caller-facing error bodies.
//!
//! Internally every failure keeps its own kind. Externally all of the
//! "unauthorized" kinds collapse into one response so that a caller cannot
//! tell an unknown user from a wrong password or a user outside the
//! allow-list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GatekeeperError;

pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_UNAUTHORIZED: u16 = 401;
pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_INTERNAL_ERROR: u16 = 500;
pub const HTTP_SERVICE_UNAVAILABLE: u16 = 503;

/// Error body returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Generic message; never carries internal detail.
    pub error: String,
}

impl ErrorResponse {
    fn new(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            error: message.to_string(),
        }
    }
}

impl GatekeeperError {
    /// HTTP status the front end should answer with.
    pub fn http_status(&self) -> u16 {
        if self.is_unauthorized() {
            return HTTP_UNAUTHORIZED;
        }
        if self.is_retryable() {
            return HTTP_SERVICE_UNAVAILABLE;
        }
        match self {
            GatekeeperError::Secret {
                kind: super::SecretErrorKind::DeviceNotFound { .. },
            } => HTTP_NOT_FOUND,
            GatekeeperError::Secret {
                kind: super::SecretErrorKind::NoPassword { .. },
            } => HTTP_BAD_REQUEST,
            _ => HTTP_INTERNAL_ERROR,
        }
    }

    /// Build the sanitized response body for this error.
    ///
    /// The full error is logged at debug level for correlation.
    pub fn to_response(&self) -> ErrorResponse {
        debug!(code = self.code(), error = %self, "Error response (sanitized for client)");

        if self.is_unauthorized() {
            return ErrorResponse::new("Failed Authentication");
        }
        if self.is_retryable() {
            return ErrorResponse::new("Directory service unavailable, try again");
        }
        match self {
            GatekeeperError::Secret {
                kind: super::SecretErrorKind::DeviceNotFound { .. },
            } => ErrorResponse::new("Device not found"),
            GatekeeperError::Secret {
                kind: super::SecretErrorKind::NoPassword { .. },
            } => ErrorResponse::new("Device does not use password authentication"),
            _ => ErrorResponse::new("Internal server error"),
        }
    }
}
