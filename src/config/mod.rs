//! Configuration module for the gatekeeper.
//!
//! Handles loading and validating configuration from YAML files.

mod settings;

pub use settings::*;
