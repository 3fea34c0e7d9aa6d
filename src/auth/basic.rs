//! HTTP Basic credential decoding.
//!
//! The `Authorization` header carries `Basic <base64(username:password)>`.
//! A token must decode to exactly two non-empty fields separated by a single
//! colon; anything else is rejected before the directory is contacted.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::error::{AuthErrorKind, GatekeeperError};

/// A decoded `username:password` pair.
///
/// Lives only for the duration of one request. The password is wiped on
/// drop and never shown by `Debug`.
pub struct BasicCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Decode a base64 token into a credential pair.
    pub fn decode(token: &str) -> Result<Self, GatekeeperError> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(token.trim())
                .map_err(|e| GatekeeperError::malformed(format!("invalid base64: {}", e)))?,
        );

        let text = std::str::from_utf8(&bytes)
            .map_err(|_| GatekeeperError::malformed("credentials are not valid UTF-8"))?;

        let colons = text.matches(':').count();
        if colons != 1 {
            return Err(GatekeeperError::malformed(format!(
                "expected exactly one ':' separator, found {}",
                colons
            )));
        }

        let (username, password) = text
            .split_once(':')
            .ok_or_else(|| GatekeeperError::malformed("missing ':' separator"))?;

        if username.is_empty() {
            return Err(GatekeeperError::malformed("empty username"));
        }
        if password.is_empty() {
            return Err(GatekeeperError::malformed("empty password"));
        }

        Ok(Self::new(username, password))
    }

    /// Decode the value of an `Authorization` header.
    ///
    /// Accepts `Basic <token>` (scheme is case-insensitive) or a bare token.
    pub fn from_header(header: Option<&str>) -> Result<Self, GatekeeperError> {
        let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(
            GatekeeperError::Auth {
                kind: AuthErrorKind::MissingHeader,
            },
        )?;

        let token = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("basic") => rest.trim(),
            Some((scheme, _)) => {
                return Err(GatekeeperError::malformed(format!(
                    "unsupported authorization scheme '{}'",
                    scheme
                )))
            }
            None => header,
        };

        Self::decode(token)
    }

    /// Encode back into a base64 token.
    pub fn encode(&self) -> String {
        let joined = Zeroizing::new(format!("{}:{}", self.username, self.password.as_str()));
        STANDARD.encode(joined.as_bytes())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
