//! Directory service interface.

use async_trait::async_trait;

use crate::error::GatekeeperError;

/// An external directory that can validate a principal's password.
///
/// Implementations return `Ok(())` when the directory accepts the
/// credentials and `AuthErrorKind::InvalidCredentials` when it rejects them.
/// Connection problems must be reported as `DirectoryUnavailable` so that
/// callers can retry them.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Validate `password` for the user principal name `upn`.
    async fn bind(&self, upn: &str, password: &str) -> Result<(), GatekeeperError>;
}
