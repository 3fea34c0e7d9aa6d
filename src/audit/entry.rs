//! Audit entry types.
//!
//! Defines the structure of audit log entries.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::sanitize_params;

/// A single audit log entry.
///
/// Records one gatekeeper decision: which operation ran for which subject,
/// the (sanitized) context, the outcome, and how long it took.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp when the decision was made.
    pub timestamp: String,
    /// Unique identifier for the request.
    pub request_id: Uuid,
    /// Operation name (e.g. `auth.basic`, `device.secret`).
    pub operation: String,
    /// Username or device id the operation concerned.
    pub subject: String,
    /// Caller address, when the front end supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Sanitized context (sensitive values redacted).
    pub context: serde_json::Value,
    /// Outcome of the operation.
    pub result: AuditResult,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl AuditEntry {
    /// Create an entry for a successful operation.
    pub fn success(
        operation: impl Into<String>,
        subject: impl Into<String>,
        context: &serde_json::Value,
        duration_ms: u64,
    ) -> Self {
        Self::new(operation, subject, context, AuditResult::Success, duration_ms)
    }

    /// Create an entry for a failed operation.
    pub fn failure(
        operation: impl Into<String>,
        subject: impl Into<String>,
        context: &serde_json::Value,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self::new(
            operation,
            subject,
            context,
            AuditResult::Failure {
                error_code: error_code.into(),
                error_message: error_message.into(),
            },
            duration_ms,
        )
    }

    fn new(
        operation: impl Into<String>,
        subject: impl Into<String>,
        context: &serde_json::Value,
        result: AuditResult,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            request_id: Uuid::new_v4(),
            operation: operation.into(),
            subject: subject.into(),
            source: None,
            context: sanitize_params(context),
            result,
            duration_ms,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Correlate the entry with an existing request id.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Result of an operation for audit purposes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum AuditResult {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failure")]
    Failure {
        /// Internal error code.
        error_code: String,
        /// Error message.
        error_message: String,
    },
}
