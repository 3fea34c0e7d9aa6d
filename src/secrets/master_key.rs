//! The process-wide master key.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::GatekeeperError;

/// Environment variable that holds the master key.
pub const MASTER_KEY_ENV: &str = "api_master_pw";

/// Master key used to derive device secret keys.
///
/// Loaded once at startup and shared read-only. The bytes are wiped on drop
/// and never appear in `Debug` output.
pub struct MasterKey {
    secret: Zeroizing<Vec<u8>>,
}

impl MasterKey {
    /// Wrap raw key material.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Read the master key from `api_master_pw`.
    pub fn from_env() -> Result<Self, GatekeeperError> {
        Self::from_env_var(MASTER_KEY_ENV)
    }

    /// Read the master key from the named environment variable.
    ///
    /// A missing or empty variable is a startup error.
    pub fn from_env_var(name: &str) -> Result<Self, GatekeeperError> {
        let value = std::env::var(name).map_err(|e| GatekeeperError::Startup {
            message: format!("Master key variable '{}' is not usable: {}", name, e),
        })?;
        let value = Zeroizing::new(value);

        if value.is_empty() {
            return Err(GatekeeperError::Startup {
                message: format!("Master key variable '{}' is empty", name),
            });
        }

        Ok(Self::new(value.as_bytes()))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
