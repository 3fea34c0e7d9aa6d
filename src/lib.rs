//! NetAPI Credential Gatekeeper
//!
//! Authenticates inbound API callers against an LDAP directory and a fixed
//! allow-list, and releases decrypted per-device login passwords to the
//! vendor plugins that open management sessions.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod secrets;

pub use gatekeeper::{AuthenticatedUser, DeviceLogin, Gatekeeper, RequestContext};
