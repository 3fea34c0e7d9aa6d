//! Audit logging module.
//!
//! Records every gatekeeper decision as a JSON line: caller
//! authentications and device secret retrievals, successful or not.
//! Context is sanitized before it is written, so credentials, stored
//! ciphertext and salts never reach the audit file.

mod entry;
mod logger;
mod sanitize;

pub use entry::{AuditEntry, AuditResult};
pub use logger::AuditLogger;
pub use sanitize::sanitize_params;
