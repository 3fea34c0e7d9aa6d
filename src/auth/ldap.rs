//! LDAP directory client.
//!
//! Validates a password by performing an LDAPv3 simple bind as the user
//! over a fresh connection, then unbinding. No search or other operation
//! is issued.

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapError};
use tracing::{debug, warn};

use crate::config::LdapConfig;
use crate::error::{AuthErrorKind, GatekeeperError};

use super::Directory;

/// LDAP result codes we act on.
mod result_code {
    pub const SUCCESS: u32 = 0;
    pub const INAPPROPRIATE_AUTHENTICATION: u32 = 48;
    pub const INVALID_CREDENTIALS: u32 = 49;
    pub const INSUFFICIENT_ACCESS_RIGHTS: u32 = 50;
    pub const BUSY: u32 = 51;
    pub const UNAVAILABLE: u32 = 52;
    pub const UNWILLING_TO_PERFORM: u32 = 53;
}

/// Directory client backed by an LDAP server.
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    url: String,
}

impl LdapDirectory {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            url: format!("ldap://{}:{}", host, port),
        }
    }

    pub fn from_config(config: &LdapConfig) -> Self {
        Self::new(&config.ldap_server, config.ldap_port)
    }

    /// The `ldap://` URL binds are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn bind(&self, upn: &str, password: &str) -> Result<(), GatekeeperError> {
        // An empty password would be an unauthenticated bind, which most
        // servers accept without checking anything
        if password.is_empty() {
            return Err(invalid_credentials(upn));
        }

        // Connect and drive the connection in the background
        let (conn, mut ldap) = LdapConnAsync::new(&self.url)
            .await
            .map_err(|e| connection_error(&self.url, e))?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                debug!(error = %e, "LDAP connection closed with error");
            }
        });

        // Simple bind as the caller
        let result = ldap
            .simple_bind(upn, password)
            .await
            .map_err(|e| connection_error(&self.url, e))?;
        debug!(upn = %upn, result_code = result.rc, "LDAP bind completed");

        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "LDAP unbind failed");
        }

        bind_outcome(upn, result.rc, &result.text)
    }
}

/// Map a bind result code to the gatekeeper's error taxonomy.
///
/// Codes that mean "these credentials are not acceptable" collapse to
/// `InvalidCredentials`; `busy` and `unavailable` are retryable; anything
/// else is a protocol error.
pub fn bind_outcome(upn: &str, rc: u32, diagnostic: &str) -> Result<(), GatekeeperError> {
    match rc {
        result_code::SUCCESS => Ok(()),
        result_code::INAPPROPRIATE_AUTHENTICATION
        | result_code::INVALID_CREDENTIALS
        | result_code::INSUFFICIENT_ACCESS_RIGHTS
        | result_code::UNWILLING_TO_PERFORM => Err(invalid_credentials(upn)),
        result_code::BUSY | result_code::UNAVAILABLE => Err(GatekeeperError::Auth {
            kind: AuthErrorKind::DirectoryUnavailable {
                message: format!("directory reported result code {}: {}", rc, diagnostic),
            },
        }),
        other => Err(GatekeeperError::Auth {
            kind: AuthErrorKind::DirectoryProtocol {
                message: format!("bind failed with result code {}: {}", other, diagnostic),
            },
        }),
    }
}

fn invalid_credentials(upn: &str) -> GatekeeperError {
    GatekeeperError::Auth {
        kind: AuthErrorKind::InvalidCredentials {
            username: upn.to_string(),
        },
    }
}

fn connection_error(url: &str, e: LdapError) -> GatekeeperError {
    GatekeeperError::Auth {
        kind: AuthErrorKind::DirectoryUnavailable {
            message: format!("{}: {}", url, e),
        },
    }
}
