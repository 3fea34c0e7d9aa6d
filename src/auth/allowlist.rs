//! Permitted API callers.
//!
//! The allow-list is built once from configuration and never changes for
//! the life of the process. Principals are user principal names
//! (`user@domain`), compared case-insensitively.

use crate::config::LdapConfig;
use crate::error::GatekeeperError;

/// A user principal name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user: String,
    domain: String,
}

impl Principal {
    /// Parse `user@domain`.
    pub fn parse(upn: &str) -> Result<Self, GatekeeperError> {
        match upn.trim().split_once('@') {
            Some((user, domain)) if !user.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self {
                    user: user.to_lowercase(),
                    domain: domain.to_lowercase(),
                })
            }
            _ => Err(GatekeeperError::Config {
                message: format!("Invalid user principal name '{}'", upn),
            }),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn upn(&self) -> String {
        format!("{}@{}", self.user, self.domain)
    }
}

/// Immutable set of principals permitted to call the API.
#[derive(Debug, Clone)]
pub struct AllowList {
    principals: Vec<Principal>,
    default_domain: String,
}

impl AllowList {
    /// Build from a list of UPNs.
    ///
    /// The default bind domain is the domain of the first entry.
    pub fn new<I, S>(upns: I) -> Result<Self, GatekeeperError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let principals = upns
            .into_iter()
            .map(|upn| Principal::parse(upn.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let default_domain = principals
            .first()
            .map(|p| p.domain.clone())
            .ok_or_else(|| GatekeeperError::Config {
                message: "Allow-list must contain at least one principal".to_string(),
            })?;

        Ok(Self {
            principals,
            default_domain,
        })
    }

    /// Build from the LDAP section of the configuration.
    pub fn from_config(config: &LdapConfig) -> Result<Self, GatekeeperError> {
        let list = Self::new(config.ldap_user.to_vec())?;
        Ok(match &config.domain {
            Some(domain) if !domain.trim().is_empty() => list.with_default_domain(domain),
            _ => list,
        })
    }

    /// Override the bind domain used for names without an `@`.
    pub fn with_default_domain(mut self, domain: &str) -> Self {
        self.default_domain = domain.trim().to_lowercase();
        self
    }

    /// Find the entry a caller-supplied name refers to.
    ///
    /// A bare name matches an entry's user part; a full UPN must match an
    /// entry exactly.
    pub fn find(&self, username: &str) -> Option<&Principal> {
        let wanted = username.trim().to_lowercase();
        match wanted.split_once('@') {
            Some((user, domain)) => self
                .principals
                .iter()
                .find(|p| p.user == user && p.domain == domain),
            None => self.principals.iter().find(|p| p.user == wanted),
        }
    }

    pub fn is_permitted(&self, username: &str) -> bool {
        self.find(username).is_some()
    }

    /// The name to bind to the directory with.
    pub fn bind_upn(&self, username: &str) -> String {
        if username.contains('@') {
            return username.to_string();
        }
        match self.find(username) {
            Some(principal) => principal.upn(),
            None => format!("{}@{}", username, self.default_domain),
        }
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}
