//! Error types for the gatekeeper.

use thiserror::Error;

/// Main error type for the gatekeeper.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Fatal errors raised while the process is starting.
    #[error("Startup error: {message}")]
    Startup { message: String },

    /// Caller authentication and authorization errors.
    #[error("Authentication error: {kind}")]
    Auth { kind: AuthErrorKind },

    /// Device secret retrieval errors.
    #[error("Secret error: {kind}")]
    Secret { kind: SecretErrorKind },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller authentication error kinds.
#[derive(Error, Debug)]
pub enum AuthErrorKind {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Malformed credential token: {reason}")]
    MalformedToken { reason: String },

    #[error("Directory rejected credentials for '{username}'")]
    InvalidCredentials { username: String },

    #[error("Principal '{username}' is not in the allow-list")]
    NotPermitted { username: String },

    #[error("Directory did not answer within {timeout_ms} ms")]
    DirectoryTimeout { timeout_ms: u64 },

    #[error("Directory unreachable: {message}")]
    DirectoryUnavailable { message: String },

    #[error("Directory protocol error: {message}")]
    DirectoryProtocol { message: String },
}

/// Device secret error kinds.
#[derive(Error, Debug)]
pub enum SecretErrorKind {
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("Device '{device_id}' has no stored password")]
    NoPassword { device_id: String },

    #[error("Decryption failed: {reason}")]
    Decryption { reason: String },

    #[error("Encryption failed: {reason}")]
    Encryption { reason: String },
}

impl GatekeeperError {
    /// Shorthand for a malformed token error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        GatekeeperError::Auth {
            kind: AuthErrorKind::MalformedToken {
                reason: reason.into(),
            },
        }
    }

    /// Shorthand for a decryption error.
    pub fn decryption(reason: impl Into<String>) -> Self {
        GatekeeperError::Secret {
            kind: SecretErrorKind::Decryption {
                reason: reason.into(),
            },
        }
    }

    /// Stable internal code, used in logs, audit entries and tests.
    pub fn code(&self) -> &'static str {
        match self {
            GatekeeperError::Config { .. } => "CONFIG_ERROR",
            GatekeeperError::Startup { .. } => "STARTUP_ERROR",
            GatekeeperError::Auth { kind } => match kind {
                AuthErrorKind::MissingHeader => "AUTH_MISSING_HEADER",
                AuthErrorKind::MalformedToken { .. } => "AUTH_MALFORMED_TOKEN",
                AuthErrorKind::InvalidCredentials { .. } => "AUTH_INVALID_CREDENTIALS",
                AuthErrorKind::NotPermitted { .. } => "AUTH_NOT_PERMITTED",
                AuthErrorKind::DirectoryTimeout { .. } => "DIRECTORY_TIMEOUT",
                AuthErrorKind::DirectoryUnavailable { .. } => "DIRECTORY_UNAVAILABLE",
                AuthErrorKind::DirectoryProtocol { .. } => "DIRECTORY_PROTOCOL_ERROR",
            },
            GatekeeperError::Secret { kind } => match kind {
                SecretErrorKind::DeviceNotFound { .. } => "DEVICE_NOT_FOUND",
                SecretErrorKind::NoPassword { .. } => "DEVICE_NO_PASSWORD",
                SecretErrorKind::Decryption { .. } => "DECRYPTION_ERROR",
                SecretErrorKind::Encryption { .. } => "ENCRYPTION_ERROR",
            },
            GatekeeperError::Io(_) => "IO_ERROR",
            GatekeeperError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the operation may succeed if attempted again.
    ///
    /// Only transient directory failures qualify. A wrong master key or bad
    /// credentials will not succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatekeeperError::Auth {
                kind: AuthErrorKind::DirectoryTimeout { .. }
                    | AuthErrorKind::DirectoryUnavailable { .. }
            }
        )
    }

    /// Whether this is one of the caller-facing "unauthorized" failures.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            GatekeeperError::Auth {
                kind: AuthErrorKind::MissingHeader
                    | AuthErrorKind::MalformedToken { .. }
                    | AuthErrorKind::InvalidCredentials { .. }
                    | AuthErrorKind::NotPermitted { .. }
            }
        )
    }
}

/// Result type alias for gatekeeper operations.
pub type GatekeeperResult<T> = Result<T, GatekeeperError>;
