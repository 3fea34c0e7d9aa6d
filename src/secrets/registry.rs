//! Device credential registry.
//!
//! The registry maps device identifiers to their encrypted login records.
//! It is read-only once loaded.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GatekeeperError;

use super::EncryptedSecret;

/// How a device authenticates its management sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAuthType {
    Password,
    Token,
}

/// A device and its encrypted login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceCredentialRecord {
    /// Opaque device identifier.
    #[serde(rename = "id")]
    pub device_id: String,
    /// Host name the device is reached at.
    pub name: String,
    pub site: Option<String>,
    pub vendor: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub auth_type: DeviceAuthType,
    /// Device login user.
    pub username: Option<String>,
    #[serde(flatten)]
    pub encrypted_password: Option<EncryptedSecret>,
}

impl DeviceCredentialRecord {
    /// Check that the stored secret agrees with the auth type.
    ///
    /// Password devices need a sealed password; token devices must not
    /// carry one.
    ///
    /// # Errors
    ///
    /// Returns `GatekeeperError::Config` naming the device on a mismatch.
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        match (self.auth_type, &self.encrypted_password) {
            (DeviceAuthType::Password, Some(_)) | (DeviceAuthType::Token, None) => Ok(()),
            (DeviceAuthType::Password, None) => Err(GatekeeperError::Config {
                message: format!(
                    "Device '{}' uses password authentication but has no stored secret",
                    self.device_id
                ),
            }),
            (DeviceAuthType::Token, Some(_)) => Err(GatekeeperError::Config {
                message: format!(
                    "Device '{}' uses token authentication but carries a stored secret",
                    self.device_id
                ),
            }),
        }
    }
}

/// A record as written in the registry file, before its secret fields are
/// checked.
#[derive(Debug, Deserialize)]
struct RawDeviceRecord {
    id: String,
    name: String,
    #[serde(default)]
    site: Option<String>,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(rename = "type", default)]
    device_type: Option<String>,
    #[serde(default = "default_auth_type")]
    auth_type: DeviceAuthType,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    salt: Option<String>,
}

impl TryFrom<RawDeviceRecord> for DeviceCredentialRecord {
    type Error = GatekeeperError;

    fn try_from(raw: RawDeviceRecord) -> Result<Self, Self::Error> {
        // A lone secret or salt is a damaged record, never "no password"
        let encrypted_password = match (raw.secret, raw.salt) {
            (Some(secret), Some(salt)) => Some(EncryptedSecret { secret, salt }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(GatekeeperError::Config {
                    message: format!("Device '{}' has a secret but no salt", raw.id),
                })
            }
            (None, Some(_)) => {
                return Err(GatekeeperError::Config {
                    message: format!("Device '{}' has a salt but no secret", raw.id),
                })
            }
        };

        let record = Self {
            device_id: raw.id,
            name: raw.name,
            site: raw.site,
            vendor: raw.vendor,
            device_type: raw.device_type,
            auth_type: raw.auth_type,
            username: raw.username,
            encrypted_password,
        };
        record.validate()?;
        Ok(record)
    }
}

fn default_auth_type() -> DeviceAuthType {
    DeviceAuthType::Password
}

/// Lookup of device credential records by identifier.
pub trait DeviceRegistry: Send + Sync {
    /// Return the record for `device_id`, or `None` if unknown.
    fn lookup(&self, device_id: &str) -> Result<Option<DeviceCredentialRecord>, GatekeeperError>;
}

/// Registry held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: HashMap<String, DeviceCredentialRecord>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from records.
    ///
    /// # Errors
    ///
    /// Returns `GatekeeperError::Config` if:
    /// - Two records share an identifier
    /// - A record's stored secret disagrees with its auth type
    pub fn from_records(
        records: impl IntoIterator<Item = DeviceCredentialRecord>,
    ) -> Result<Self, GatekeeperError> {
        let mut registry = Self::new();
        for record in records {
            record.validate()?;
            if registry.records.contains_key(&record.device_id) {
                return Err(GatekeeperError::Config {
                    message: format!("Duplicate device id '{}' in registry", record.device_id),
                });
            }
            registry.records.insert(record.device_id.clone(), record);
        }
        Ok(registry)
    }

    /// Load records from a YAML file, or JSON when the extension is `.json`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the device credential file
    ///
    /// # Errors
    ///
    /// Returns `GatekeeperError::Config` if the file cannot be read or
    /// parsed, or if any record is damaged or duplicated.
    pub fn load(path: &Path) -> Result<Self, GatekeeperError> {
        let content = std::fs::read_to_string(path).map_err(|e| GatekeeperError::Config {
            message: format!("Failed to read device registry '{}': {}", path.display(), e),
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let records: Vec<RawDeviceRecord> = if is_json {
            serde_json::from_str(&content).map_err(|e| GatekeeperError::Config {
                message: format!("Failed to parse device registry '{}': {}", path.display(), e),
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| GatekeeperError::Config {
                message: format!("Failed to parse device registry '{}': {}", path.display(), e),
            })?
        };

        let records = records
            .into_iter()
            .map(DeviceCredentialRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| match e {
                GatekeeperError::Config { message } => GatekeeperError::Config {
                    message: format!("{} ({})", message, path.display()),
                },
                other => other,
            })?;

        let registry = Self::from_records(records)?;
        debug!(path = %path.display(), devices = registry.len(), "Device registry loaded");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DeviceRegistry for InMemoryRegistry {
    fn lookup(&self, device_id: &str) -> Result<Option<DeviceCredentialRecord>, GatekeeperError> {
        Ok(self.records.get(device_id).cloned())
    }
}
