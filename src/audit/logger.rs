//! Audit logger for writing audit entries to file.
//!
//! Writes structured audit entries as JSON lines (one JSON object per line)
//! for easy parsing by log analysis tools.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::GatekeeperError;

use super::entry::AuditEntry;

/// Logger for audit entries.
///
/// Writes one JSON object per line. Thread-safe via internal mutex.
pub struct AuditLogger {
    /// The file handle wrapped in a mutex for thread safety.
    file: Mutex<File>,
    /// Path to the audit log file.
    path: PathBuf,
}

impl AuditLogger {
    /// Open (or create) the audit log at `path` in append mode.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the audit log file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - File cannot be opened for appending
    pub fn new(path: &Path) -> Result<Self, GatekeeperError> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!(path = %parent.display(), "Creating audit log directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        // Open file in append mode
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        debug!(path = %path.display(), "Audit logger initialized");

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Append one entry and sync it to disk.
    ///
    /// # Arguments
    ///
    /// * `entry` - The audit entry to log
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails. A failed sync is
    /// only logged.
    pub fn log(&self, entry: &AuditEntry) -> Result<(), GatekeeperError> {
        // Serialize to JSON
        let json = serde_json::to_string(entry)?;

        // A panic in another writer leaves the file usable
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        writeln!(file, "{}", json)?;

        // Sync for durability
        if let Err(e) = file.sync_data() {
            warn!(error = %e, "Failed to sync audit log");
        }

        debug!(
            request_id = %entry.request_id,
            operation = %entry.operation,
            "Audit entry logged"
        );

        Ok(())
    }

    /// Get the path to the audit log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
