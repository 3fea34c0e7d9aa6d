//! Authentication module.
//!
//! Handles Basic credential decoding, the principal allow-list, the
//! directory interface with its LDAP implementation, and the bounded
//! retry policy for directory calls.

mod allowlist;
mod basic;
mod directory;
mod ldap;
mod retry;

pub use allowlist::{AllowList, Principal};
pub use basic::BasicCredentials;
pub use directory::Directory;
pub use ldap::{bind_outcome, LdapDirectory};
pub use retry::{with_timeout, RetryPolicy};
