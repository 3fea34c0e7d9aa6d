//! Configuration settings for the gatekeeper.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::auth::Principal;
use crate::error::GatekeeperError;

/// Lowest PBKDF2 iteration count accepted from configuration.
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// Main configuration structure.
///
/// The file is shared with the rest of the API system, so the web, SQL,
/// API and plugin sections are recognized even though the gatekeeper does
/// not act on them.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub web_server: WebServerConfig,
    #[serde(default)]
    pub sql_server: SqlServerConfig,
    pub ldap_server: LdapConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginConfig>,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Web front end configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebServerConfig {
    #[serde(default = "default_web_port")]
    pub web_port: u16,
    #[serde(default = "default_host_ip")]
    pub host_ip: String,
    #[serde(default)]
    pub debug: bool,
}

/// SQL server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SqlServerConfig {
    #[serde(default)]
    pub db_server: String,
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub log_table: String,
    #[serde(default)]
    pub site_table: String,
    #[serde(default)]
    pub device_table: String,
}

/// LDAP directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LdapConfig {
    /// Directory host name or address.
    pub ldap_server: String,
    /// Directory port.
    #[serde(default = "default_ldap_port")]
    pub ldap_port: u16,
    /// Permitted API callers as UPNs (`user@domain`).
    pub ldap_user: OneOrMany,
    /// Bind domain for callers who are not in the allow-list.
    ///
    /// Defaults to the domain of the first `ldap_user` entry.
    pub domain: Option<String>,
}

/// A YAML value that may be a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flatten into a list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

/// API information.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_version")]
    pub version: String,
    #[serde(default = "default_api_status")]
    pub status: String,
}

/// A vendor RPC plugin.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub vendor: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub description: String,
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Environment variable holding the master key.
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,
    /// PBKDF2 iterations used to derive device secret keys.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
    /// Per-attempt timeout for directory calls.
    #[serde(default = "default_directory_timeout")]
    pub directory_timeout_ms: u64,
    /// Extra attempts after a transient directory failure.
    #[serde(default = "default_directory_retries")]
    pub directory_retries: u32,
    /// First backoff delay between directory attempts.
    #[serde(default = "default_backoff_initial")]
    pub backoff_initial_ms: u64,
    /// Upper bound on the backoff delay.
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
}

/// Device registry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    /// Path to the device credential file (YAML, or JSON by extension).
    pub path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Path to the audit log file.
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

// Default value functions
fn default_web_port() -> u16 {
    5000
}

fn default_host_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_ldap_port() -> u16 {
    389
}

fn default_api_version() -> String {
    "beta".to_string()
}

fn default_api_status() -> String {
    "up".to_string()
}

fn default_master_key_env() -> String {
    crate::secrets::MASTER_KEY_ENV.to_string()
}

fn default_kdf_iterations() -> u32 {
    100_000
}

fn default_directory_timeout() -> u64 {
    5_000
}

fn default_directory_retries() -> u32 {
    2
}

fn default_backoff_initial() -> u64 {
    200
}

fn default_backoff_max() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("/var/log/netapi/gatekeeper-audit.log")
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            web_port: default_web_port(),
            host_ip: default_host_ip(),
            debug: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: default_api_version(),
            status: default_api_status(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            master_key_env: default_master_key_env(),
            kdf_iterations: default_kdf_iterations(),
            directory_timeout_ms: default_directory_timeout(),
            directory_retries: default_directory_retries(),
            backoff_initial_ms: default_backoff_initial(),
            backoff_max_ms: default_backoff_max(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: default_audit_log_path(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns `GatekeeperError::Config` if:
    /// - The file cannot be read
    /// - The YAML is invalid or missing the `ldap_server` section
    /// - Validation fails (see [`Settings::from_yaml`])
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GatekeeperError> {
        let path = path.as_ref();

        // Read file contents
        let content = std::fs::read_to_string(path).map_err(|e| GatekeeperError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        // Parse and validate, naming the file in any error
        Self::from_yaml(&content).map_err(|e| match e {
            GatekeeperError::Config { message } => GatekeeperError::Config {
                message: format!("{} ({})", message, path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate settings from a YAML string.
    ///
    /// Rejects unknown log levels and formats, an empty or malformed
    /// allow-list, a zero LDAP port, a KDF iteration count below
    /// [`MIN_KDF_ITERATIONS`], a zero directory timeout, and an initial
    /// backoff larger than the cap.
    pub fn from_yaml(content: &str) -> Result<Self, GatekeeperError> {
        let settings: Settings =
            serde_yaml::from_str(content).map_err(|e| GatekeeperError::Config {
                message: format!("Failed to parse config: {}", e),
            })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Allow-listed principals as configured.
    pub fn allowed_principals(&self) -> Vec<String> {
        self.ldap_server.ldap_user.to_vec()
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), GatekeeperError> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(GatekeeperError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        // Validate log format
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(GatekeeperError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.ldap_server.ldap_server.trim().is_empty() {
            return Err(GatekeeperError::Config {
                message: "ldap_server.ldap_server must not be empty".to_string(),
            });
        }

        if self.ldap_server.ldap_port == 0 {
            return Err(GatekeeperError::Config {
                message: "ldap_server.ldap_port must not be 0".to_string(),
            });
        }

        // Fail closed: an empty allow-list would reject every caller
        let principals = self.allowed_principals();
        if principals.is_empty() {
            return Err(GatekeeperError::Config {
                message: "ldap_server.ldap_user must name at least one principal".to_string(),
            });
        }
        for upn in &principals {
            Principal::parse(upn).map_err(|_| GatekeeperError::Config {
                message: format!("Invalid UPN '{}' in ldap_server.ldap_user", upn),
            })?;
        }

        if self.security.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(GatekeeperError::Config {
                message: format!(
                    "security.kdf_iterations {} is below the minimum of {}",
                    self.security.kdf_iterations, MIN_KDF_ITERATIONS
                ),
            });
        }

        if self.security.directory_timeout_ms == 0 {
            return Err(GatekeeperError::Config {
                message: "security.directory_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.security.backoff_initial_ms > self.security.backoff_max_ms {
            return Err(GatekeeperError::Config {
                message: format!(
                    "security.backoff_initial_ms ({}) exceeds backoff_max_ms ({})",
                    self.security.backoff_initial_ms, self.security.backoff_max_ms
                ),
            });
        }

        Ok(())
    }
}
