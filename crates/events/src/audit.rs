//! Append-only audit log.
//!
//! [`AuditLog`] writes one timestamped line per [`RunEvent`]. The file is
//! opened in append mode and never truncated, so consecutive runs share a
//! single history. Writes are serialized through a mutex; a failed write
//! is reported via `tracing` and never interrupts the run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::event::RunEvent;
use crate::sink::EventSink;

/// Timestamp prefix, e.g. `2024/05/01 13:04:05`.
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Error opening the audit log destination.
#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Line-oriented audit sink shared by the whole run.
pub struct AuditLog {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl AuditLog {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditLogError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AuditLogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_writer(file))
    }

    /// Wrap an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// An audit log that discards everything.
    pub fn disabled() -> Self {
        Self::from_writer(std::io::sink())
    }

    /// Append one event.
    pub fn record(&self, event: &RunEvent) {
        let line = format!(
            "{} {event}\n",
            chrono::Local::now().format(TIMESTAMP_FORMAT)
        );

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = writer.write_all(line.as_bytes());
        if let Err(e) = result.and_then(|()| writer.flush()) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

impl EventSink for AuditLog {
    fn emit(&self, event: &RunEvent) {
        self.record(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
