//! The credential gatekeeper.
//!
//! Two independent, stateless validation paths:
//!
//! - [`Gatekeeper::authenticate`] checks an API caller's Basic token against
//!   the directory and the allow-list.
//! - [`Gatekeeper::device_secret`] looks up a managed device and decrypts its
//!   stored login password with the master key.
//!
//! Every decision is written to the audit log when one is configured.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditLogger};
use crate::auth::{AllowList, BasicCredentials, Directory, LdapDirectory, RetryPolicy};
use crate::config::Settings;
use crate::error::{AuthErrorKind, GatekeeperError, GatekeeperResult, SecretErrorKind};
use crate::secrets::{
    DeviceCredentialRecord, DeviceRegistry, DeviceSecret, InMemoryRegistry, MasterKey,
    SecretCipher,
};

const OP_AUTH: &str = "auth.basic";
const OP_DEVICE_SECRET: &str = "device.secret";
const OP_DEVICE_LOGIN: &str = "device.login";

/// A caller that passed both the directory bind and the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Name as presented by the caller.
    pub username: String,
    /// Principal the directory bind succeeded for.
    pub upn: String,
}

/// Everything a vendor plugin needs to open a management session.
#[derive(Debug)]
pub struct DeviceLogin {
    pub device_id: String,
    pub host: String,
    pub username: Option<String>,
    pub password: DeviceSecret,
}

/// Front-end request details carried into the audit trail.
///
/// Both fields are optional; an entry without a request id gets a fresh
/// one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Caller address as seen by the front end.
    pub source: Option<String>,
    /// Id to correlate the audit entry with front-end logs.
    pub request_id: Option<Uuid>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

pub struct Gatekeeper {
    directory: Arc<dyn Directory>,
    allow_list: AllowList,
    registry: Arc<dyn DeviceRegistry>,
    cipher: SecretCipher,
    retry: RetryPolicy,
    audit: Option<Arc<AuditLogger>>,
}

impl Gatekeeper {
    pub fn new(
        directory: Arc<dyn Directory>,
        allow_list: AllowList,
        registry: Arc<dyn DeviceRegistry>,
        cipher: SecretCipher,
    ) -> Self {
        Self {
            directory,
            allow_list,
            registry,
            cipher,
            retry: RetryPolicy::default(),
            audit: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Wire up a gatekeeper from validated settings.
    ///
    /// A missing registry path yields an empty registry; an unopenable audit
    /// log disables auditing with a warning.
    pub fn from_settings(settings: &Settings, master_key: Arc<MasterKey>) -> GatekeeperResult<Self> {
        let directory = Arc::new(LdapDirectory::from_config(&settings.ldap_server));
        let allow_list = AllowList::from_config(&settings.ldap_server)?;
        let cipher = SecretCipher::new(master_key, settings.security.kdf_iterations)?;

        let registry = match &settings.registry.path {
            Some(path) => InMemoryRegistry::load(path)?,
            None => {
                warn!("No device registry configured, device lookups will fail");
                InMemoryRegistry::new()
            }
        };

        let mut gatekeeper = Self::new(directory, allow_list, Arc::new(registry), cipher)
            .with_retry_policy(RetryPolicy::from_config(&settings.security));

        if settings.audit.enabled {
            match AuditLogger::new(&settings.audit.log_path) {
                Ok(logger) => {
                    info!(
                        path = %settings.audit.log_path.display(),
                        "Audit logging enabled"
                    );
                    gatekeeper = gatekeeper.with_audit_logger(Arc::new(logger));
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        path = %settings.audit.log_path.display(),
                        "Failed to create audit logger, audit logging disabled"
                    );
                }
            }
        } else {
            info!("Audit logging disabled");
        }

        info!(
            directory = %settings.ldap_server.ldap_server,
            principals = gatekeeper.allow_list.len(),
            "Gatekeeper ready"
        );

        Ok(gatekeeper)
    }

    /// Authenticate an API caller from a base64 `username:password` token.
    ///
    /// Equivalent to [`Gatekeeper::authenticate_from`] with an empty
    /// request context.
    pub async fn authenticate(&self, token: &str) -> GatekeeperResult<AuthenticatedUser> {
        self.authenticate_from(token, &RequestContext::default()).await
    }

    /// Authenticate an API caller on behalf of a front-end request.
    ///
    /// The token is decoded, bound against the directory (with timeout and
    /// bounded retry), and finally checked against the allow-list.
    ///
    /// # Arguments
    ///
    /// * `token` - Base64 of `username:password`
    /// * `request` - Caller address and request id recorded in the audit log
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token is not a valid credential pair (`AUTH_MALFORMED_TOKEN`)
    /// - The directory rejects the password (`AUTH_INVALID_CREDENTIALS`)
    /// - The principal is not allow-listed (`AUTH_NOT_PERMITTED`)
    /// - The directory stays unreachable or slow after all retries
    pub async fn authenticate_from(
        &self,
        token: &str,
        request: &RequestContext,
    ) -> GatekeeperResult<AuthenticatedUser> {
        let started = Instant::now();

        // Decode the token; a malformed one is audited under "unknown"
        match BasicCredentials::decode(token) {
            Ok(credentials) => self.verify(credentials, request, started).await,
            Err(e) => Err(self.reject_undecoded(e, request, started)),
        }
    }

    /// Authenticate an API caller from a raw `Authorization` header value.
    pub async fn authenticate_header(
        &self,
        header: Option<&str>,
    ) -> GatekeeperResult<AuthenticatedUser> {
        self.authenticate_header_from(header, &RequestContext::default())
            .await
    }

    /// Header variant of [`Gatekeeper::authenticate_from`].
    ///
    /// A missing or blank header fails with `AUTH_MISSING_HEADER`.
    pub async fn authenticate_header_from(
        &self,
        header: Option<&str>,
        request: &RequestContext,
    ) -> GatekeeperResult<AuthenticatedUser> {
        let started = Instant::now();
        match BasicCredentials::from_header(header) {
            Ok(credentials) => self.verify(credentials, request, started).await,
            Err(e) => Err(self.reject_undecoded(e, request, started)),
        }
    }

    async fn verify(
        &self,
        credentials: BasicCredentials,
        request: &RequestContext,
        started: Instant,
    ) -> GatekeeperResult<AuthenticatedUser> {
        let username = credentials.username().to_string();
        let upn = self.allow_list.bind_upn(&username);

        // Bind, then check the allow-list
        let result = self.check(&credentials, &upn).await;
        let context = json!({ "upn": &upn });

        // Log and audit the outcome
        match &result {
            Ok(_) => {
                info!(
                    username = %username,
                    upn = %upn,
                    source = request.source.as_deref().unwrap_or("-"),
                    "Caller authenticated"
                );
                self.record(
                    AuditEntry::success(OP_AUTH, &username, &context, elapsed_ms(started)),
                    request,
                );
            }
            Err(e) => {
                warn!(
                    username = %username,
                    source = request.source.as_deref().unwrap_or("-"),
                    code = e.code(),
                    error = %e,
                    "Caller rejected"
                );
                self.record(
                    AuditEntry::failure(
                        OP_AUTH,
                        &username,
                        &context,
                        e.code(),
                        e.to_string(),
                        elapsed_ms(started),
                    ),
                    request,
                );
            }
        }

        result.map(|_| AuthenticatedUser { username, upn })
    }

    /// Directory bind first, then the allow-list.
    async fn check(&self, credentials: &BasicCredentials, upn: &str) -> GatekeeperResult<()> {
        let directory = &self.directory;
        let password = credentials.password();
        self.retry
            .run("ldap.bind", move || directory.bind(upn, password))
            .await?;

        if !self.allow_list.is_permitted(credentials.username()) {
            return Err(GatekeeperError::Auth {
                kind: AuthErrorKind::NotPermitted {
                    username: credentials.username().to_string(),
                },
            });
        }

        Ok(())
    }

    fn reject_undecoded(
        &self,
        error: GatekeeperError,
        request: &RequestContext,
        started: Instant,
    ) -> GatekeeperError {
        debug!(code = error.code(), error = %error, "Authorization token rejected");
        self.record(
            AuditEntry::failure(
                OP_AUTH,
                "unknown",
                &json!({}),
                error.code(),
                error.to_string(),
                elapsed_ms(started),
            ),
            request,
        );
        error
    }

    /// Decrypt the stored login password of a device.
    ///
    /// Equivalent to [`Gatekeeper::device_secret_from`] with an empty
    /// request context.
    pub fn device_secret(&self, device_id: &str) -> GatekeeperResult<DeviceSecret> {
        self.device_secret_from(device_id, &RequestContext::default())
    }

    /// Decrypt the stored login password of a device for a front-end request.
    ///
    /// The cleartext is returned to the caller only; it is never logged.
    ///
    /// # Arguments
    ///
    /// * `device_id` - Registry identifier of the device
    /// * `request` - Caller address and request id recorded in the audit log
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device is unknown (`DEVICE_NOT_FOUND`)
    /// - The device uses token authentication (`DEVICE_NO_PASSWORD`)
    /// - The stored secret does not open under the master key (`DECRYPTION_ERROR`)
    pub fn device_secret_from(
        &self,
        device_id: &str,
        request: &RequestContext,
    ) -> GatekeeperResult<DeviceSecret> {
        let started = Instant::now();

        // Look up the record, then open its stored secret
        let result = self
            .lookup(device_id)
            .and_then(|record| self.decrypt(&record));

        // Audit without the cleartext
        self.record_device(OP_DEVICE_SECRET, device_id, &result, request, started);
        result
    }

    /// Host, login user and decrypted password of a device.
    pub fn device_login(&self, device_id: &str) -> GatekeeperResult<DeviceLogin> {
        self.device_login_from(device_id, &RequestContext::default())
    }

    /// Request-scoped variant of [`Gatekeeper::device_login`].
    pub fn device_login_from(
        &self,
        device_id: &str,
        request: &RequestContext,
    ) -> GatekeeperResult<DeviceLogin> {
        let started = Instant::now();
        let result = self.lookup(device_id).and_then(|record| {
            let password = self.decrypt(&record)?;
            Ok(DeviceLogin {
                device_id: record.device_id,
                host: record.name,
                username: record.username,
                password,
            })
        });
        self.record_device(OP_DEVICE_LOGIN, device_id, &result, request, started);
        result
    }

    fn lookup(&self, device_id: &str) -> GatekeeperResult<DeviceCredentialRecord> {
        self.registry
            .lookup(device_id)?
            .ok_or_else(|| GatekeeperError::Secret {
                kind: SecretErrorKind::DeviceNotFound {
                    device_id: device_id.to_string(),
                },
            })
    }

    fn decrypt(&self, record: &DeviceCredentialRecord) -> GatekeeperResult<DeviceSecret> {
        let encrypted = record
            .encrypted_password
            .as_ref()
            .ok_or_else(|| GatekeeperError::Secret {
                kind: SecretErrorKind::NoPassword {
                    device_id: record.device_id.clone(),
                },
            })?;

        self.cipher.decrypt(encrypted).map_err(|e| {
            error!(
                device_id = %record.device_id,
                host = %record.name,
                error = %e,
                "Failed to decrypt device password"
            );
            e
        })
    }

    fn record_device<T>(
        &self,
        operation: &str,
        device_id: &str,
        result: &GatekeeperResult<T>,
        request: &RequestContext,
        started: Instant,
    ) {
        let duration_ms = elapsed_ms(started);
        let context = json!({ "device_id": device_id });
        let source = request.source.as_deref().unwrap_or("-");
        match result {
            Ok(_) => {
                info!(device_id = %device_id, operation, source, "Device secret released");
                self.record(
                    AuditEntry::success(operation, device_id, &context, duration_ms),
                    request,
                );
            }
            Err(e) => {
                warn!(
                    device_id = %device_id,
                    operation,
                    source,
                    code = e.code(),
                    "Device secret request failed"
                );
                self.record(
                    AuditEntry::failure(
                        operation,
                        device_id,
                        &context,
                        e.code(),
                        e.to_string(),
                        duration_ms,
                    ),
                    request,
                );
            }
        }
    }

    /// Stamp the entry with the request's source and id, then write it.
    ///
    /// Audit write failures are logged and never fail the operation.
    fn record(&self, mut entry: AuditEntry, request: &RequestContext) {
        let Some(logger) = &self.audit else {
            return;
        };

        if let Some(source) = &request.source {
            entry = entry.with_source(source.as_str());
        }
        if let Some(request_id) = request.request_id {
            entry = entry.with_request_id(request_id);
        }

        if let Err(e) = logger.log(&entry) {
            error!(error = %e, "Failed to write audit log entry");
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::secrets::{DeviceAuthType, EncryptedSecret};

    const ITERATIONS: u32 = 1_000;

    /// Directory that accepts a fixed set of UPN/password pairs.
    struct StaticDirectory {
        accounts: HashMap<String, String>,
        calls: AtomicU32,
        stalls: u32,
    }

    impl StaticDirectory {
        fn new(accounts: &[(&str, &str)]) -> Self {
            Self {
                accounts: accounts
                    .iter()
                    .map(|(u, p)| (u.to_string(), p.to_string()))
                    .collect(),
                calls: AtomicU32::new(0),
                stalls: 0,
            }
        }

        fn stalling(mut self, stalls: u32) -> Self {
            self.stalls = stalls;
            self
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Directory for StaticDirectory {
        async fn bind(&self, upn: &str, password: &str) -> Result<(), GatekeeperError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.stalls {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            match self.accounts.get(upn) {
                Some(expected) if expected == password => Ok(()),
                _ => Err(GatekeeperError::Auth {
                    kind: AuthErrorKind::InvalidCredentials {
                        username: upn.to_string(),
                    },
                }),
            }
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: Duration::from_millis(50),
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    fn cipher(master: &str) -> SecretCipher {
        SecretCipher::new(Arc::new(MasterKey::new(master)), ITERATIONS).unwrap()
    }

    fn device(id: &str, secret: Option<EncryptedSecret>) -> DeviceCredentialRecord {
        DeviceCredentialRecord {
            device_id: id.to_string(),
            name: format!("{}.corp.example", id),
            site: Some("hq".to_string()),
            vendor: Some("juniper".to_string()),
            device_type: Some("switch".to_string()),
            auth_type: if secret.is_some() {
                DeviceAuthType::Password
            } else {
                DeviceAuthType::Token
            },
            username: Some("netops".to_string()),
            encrypted_password: secret,
        }
    }

    struct Fixture {
        gatekeeper: Gatekeeper,
        directory: Arc<StaticDirectory>,
    }

    fn fixture_with(directory: StaticDirectory, master: &str) -> Fixture {
        let sealed = cipher("correct-master").encrypt("s3cr3t!").unwrap();
        let registry = InMemoryRegistry::from_records(vec![
            device("6f1c2a", Some(sealed)),
            device("fw-token", None),
        ])
        .unwrap();

        let directory = Arc::new(directory);
        let gatekeeper = Gatekeeper::new(
            directory.clone(),
            AllowList::new(["alice@corp.example"]).unwrap(),
            Arc::new(registry),
            cipher(master),
        )
        .with_retry_policy(fast_retry());

        Fixture {
            gatekeeper,
            directory,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            StaticDirectory::new(&[
                ("alice@corp.example", "correcthorse"),
                ("bob@corp.example", "hunter2"),
            ]),
            "correct-master",
        )
    }

    fn token(user: &str, password: &str) -> String {
        BasicCredentials::new(user, password).encode()
    }

    #[tokio::test]
    async fn test_allow_listed_user_with_valid_password() {
        let f = fixture();
        let user = f
            .gatekeeper
            .authenticate("YWxpY2U6Y29ycmVjdGhvcnNl")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.upn, "alice@corp.example");
    }

    #[tokio::test]
    async fn test_wrong_password_is_authentication_error() {
        let f = fixture();
        let err = f
            .gatekeeper
            .authenticate(&token("eve", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AUTH_INVALID_CREDENTIALS");
        assert!(err.is_unauthorized());

        let err = f
            .gatekeeper
            .authenticate(&token("alice", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AUTH_INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_valid_directory_user_outside_allow_list_is_rejected() {
        let f = fixture();
        let err = f
            .gatekeeper
            .authenticate(&token("bob", "hunter2"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AUTH_NOT_PERMITTED");
        assert_eq!(f.directory.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_tokens_never_reach_directory() {
        let f = fixture();
        for bad in ["not base64!", "YWxpY2U=", "OnB3", "YWxpY2U6", "YTpiOmM="] {
            let err = f.gatekeeper.authenticate(bad).await.unwrap_err();
            assert_eq!(err.code(), "AUTH_MALFORMED_TOKEN", "token {:?}", bad);
        }
        assert_eq!(f.directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_password_is_malformed_before_directory() {
        let f = fixture();

        // "alice:"
        let err = f.gatekeeper.authenticate("YWxpY2U6").await.unwrap_err();
        assert_eq!(err.code(), "AUTH_MALFORMED_TOKEN");

        let err = f
            .gatekeeper
            .authenticate_header(Some("Basic YWxpY2U6"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AUTH_MALFORMED_TOKEN");
        assert_eq!(f.directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_header() {
        let f = fixture();
        let user = f
            .gatekeeper
            .authenticate_header(Some("Basic YWxpY2U6Y29ycmVjdGhvcnNl"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");

        let err = f.gatekeeper.authenticate_header(None).await.unwrap_err();
        assert_eq!(err.code(), "AUTH_MISSING_HEADER");
        assert_eq!(err.to_response().error, "Failed Authentication");
    }

    #[tokio::test]
    async fn test_directory_stalls_are_retried() {
        let f = fixture_with(
            StaticDirectory::new(&[("alice@corp.example", "correcthorse")]).stalling(2),
            "correct-master",
        );
        let user = f
            .gatekeeper
            .authenticate(&token("alice", "correcthorse"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(f.directory.calls(), 3);
    }

    #[tokio::test]
    async fn test_directory_timeout_is_distinct_and_retryable() {
        let f = fixture_with(
            StaticDirectory::new(&[("alice@corp.example", "correcthorse")]).stalling(10),
            "correct-master",
        );
        let err = f
            .gatekeeper
            .authenticate(&token("alice", "correcthorse"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DIRECTORY_TIMEOUT");
        assert!(err.is_retryable());
        assert!(!err.is_unauthorized());
        assert_eq!(f.directory.calls(), 3);
    }

    #[test]
    fn test_device_secret_decrypts() {
        let f = fixture();
        let secret = f.gatekeeper.device_secret("6f1c2a").unwrap();
        assert_eq!(secret.expose(), "s3cr3t!");
    }

    #[test]
    fn test_unknown_device_is_not_found() {
        let f = fixture();
        let err = f.gatekeeper.device_secret("sw1").unwrap_err();
        assert_eq!(err.code(), "DEVICE_NOT_FOUND");
    }

    #[test]
    fn test_token_device_has_no_password() {
        let f = fixture();
        let err = f.gatekeeper.device_secret("fw-token").unwrap_err();
        assert_eq!(err.code(), "DEVICE_NO_PASSWORD");
    }

    #[test]
    fn test_wrong_master_key_is_decryption_error() {
        let f = fixture_with(StaticDirectory::new(&[]), "wrong-master");
        let err = f.gatekeeper.device_secret("6f1c2a").unwrap_err();
        assert_eq!(err.code(), "DECRYPTION_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_device_login() {
        let f = fixture();
        let login = f.gatekeeper.device_login("6f1c2a").unwrap();
        assert_eq!(login.host, "6f1c2a.corp.example");
        assert_eq!(login.username.as_deref(), Some("netops"));
        assert_eq!(login.password.expose(), "s3cr3t!");
        assert!(!format!("{:?}", login).contains("s3cr3t!"));
    }

    #[tokio::test]
    async fn test_request_context_reaches_audit_entries() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let f = fixture();
        let gatekeeper = f
            .gatekeeper
            .with_audit_logger(Arc::new(AuditLogger::new(&log_path).unwrap()));

        let request_id = Uuid::new_v4();
        let request = RequestContext::new()
            .with_source("10.20.30.40")
            .with_request_id(request_id);

        gatekeeper
            .authenticate_from(&token("alice", "correcthorse"), &request)
            .await
            .unwrap();
        assert!(gatekeeper
            .authenticate_header_from(None, &request)
            .await
            .is_err());
        gatekeeper.device_secret_from("6f1c2a", &request).unwrap();
        gatekeeper.device_login_from("6f1c2a", &request).unwrap();
        // No context: no source field, fresh request id
        gatekeeper.device_secret("6f1c2a").unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 5);

        for line in &lines[..4] {
            assert_eq!(line["source"], "10.20.30.40");
            assert_eq!(line["request_id"], request_id.to_string());
        }
        assert_eq!(lines[3]["operation"], "device.login");
        assert!(lines[4].get("source").is_none());
        assert_ne!(lines[4]["request_id"], request_id.to_string());
    }

    #[tokio::test]
    async fn test_decisions_are_audited_without_secrets() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let f = fixture();
        let gatekeeper = f
            .gatekeeper
            .with_audit_logger(Arc::new(AuditLogger::new(&log_path).unwrap()));

        gatekeeper
            .authenticate(&token("alice", "correcthorse"))
            .await
            .unwrap();
        gatekeeper.device_secret("6f1c2a").unwrap();
        assert!(gatekeeper.device_secret("sw1").is_err());

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["operation"], "auth.basic");
        assert_eq!(lines[0]["result"]["status"], "success");
        assert_eq!(lines[1]["subject"], "6f1c2a");
        assert_eq!(lines[2]["result"]["error_code"], "DEVICE_NOT_FOUND");

        assert!(!content.contains("correcthorse"));
        assert!(!content.contains("s3cr3t!"));
    }
}
