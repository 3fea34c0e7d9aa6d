//! Error types for the gatekeeper.
//!
//! Provides a unified error handling system using thiserror, plus the
//! mapping from internal error kinds to the collapsed caller-facing body.

mod response;
mod types;

pub use response::*;
pub use types::*;
