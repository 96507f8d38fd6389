//! Append-only anomaly log.
//!
//! One line per event, flushed as soon as it is written so the file is
//! current even if the process is killed:
//!
//! ```text
//! Anomaly at index 137 with value 5.912046
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::AnomalyLogConfig;
use crate::types::AnomalyEvent;

#[derive(Debug, Error)]
pub enum AnomalyLogError {
    #[error("Failed to open anomaly log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write anomaly log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Receives every admitted anomaly event, in order.
pub trait AnomalyLogger: Send + 'static {
    fn record(&mut self, event: &AnomalyEvent) -> Result<(), AnomalyLogError>;

    fn flush(&mut self) -> Result<(), AnomalyLogError> {
        Ok(())
    }
}

/// Discards events.
impl AnomalyLogger for () {
    fn record(&mut self, _event: &AnomalyEvent) -> Result<(), AnomalyLogError> {
        Ok(())
    }
}

/// Keeps events in memory.
impl AnomalyLogger for Vec<AnomalyEvent> {
    fn record(&mut self, event: &AnomalyEvent) -> Result<(), AnomalyLogError> {
        self.push(*event);
        Ok(())
    }
}

// ============================================================================
// File Logger
// ============================================================================

/// Writes events to a text file, one line each.
#[derive(Debug)]
pub struct FileAnomalyLogger {
    path: PathBuf,
    writer: BufWriter<File>,
    lines_written: u64,
}

impl FileAnomalyLogger {
    /// Open `path` for logging. With `append = false` any existing contents
    /// are discarded.
    pub fn create<P: AsRef<Path>>(path: P, append: bool) -> Result<Self, AnomalyLogError> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options.open(&path).map_err(|source| AnomalyLogError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), append, "Anomaly log opened");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            lines_written: 0,
        })
    }

    pub fn from_config(config: &AnomalyLogConfig) -> Result<Self, AnomalyLogError> {
        Self::create(&config.path, config.append)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines written by this logger (excludes pre-existing lines in append mode).
    pub const fn lines_written(&self) -> u64 {
        self.lines_written
    }

    fn write_error(&self, source: std::io::Error) -> AnomalyLogError {
        AnomalyLogError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl AnomalyLogger for FileAnomalyLogger {
    fn record(&mut self, event: &AnomalyEvent) -> Result<(), AnomalyLogError> {
        writeln!(self.writer, "{event}").map_err(|e| self.write_error(e))?;
        self.writer.flush().map_err(|e| self.write_error(e))?;
        self.lines_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), AnomalyLogError> {
        self.writer.flush().map_err(|e| self.write_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_visible_without_explicit_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomaly_log.txt");
        let mut logger = FileAnomalyLogger::create(&path, false).unwrap();

        logger.record(&AnomalyEvent::new(3, 5.25)).unwrap();
        logger.record(&AnomalyEvent::new(17, -4.5)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Anomaly at index 3 with value 5.25\nAnomaly at index 17 with value -4.5\n"
        );
        assert_eq!(logger.lines_written(), 2);
    }

    #[test]
    fn test_truncate_mode_discards_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "stale line\n").unwrap();

        let mut logger = FileAnomalyLogger::create(&path, false).unwrap();
        logger.record(&AnomalyEvent::new(0, 1.0)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Anomaly at index 0 with value 1\n");
    }

    #[test]
    fn test_append_mode_keeps_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "Anomaly at index 9 with value 6\n").unwrap();

        let mut logger = FileAnomalyLogger::create(&path, true).unwrap();
        logger.record(&AnomalyEvent::new(10, -6.0)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.ends_with("Anomaly at index 10 with value -6\n"));
    }

    #[test]
    fn test_open_failure_reports_path() {
        let err = FileAnomalyLogger::create("/nonexistent-dir/zwatch/log.txt", false).unwrap_err();
        assert!(matches!(err, AnomalyLogError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent-dir/zwatch/log.txt"));
    }

    #[test]
    fn test_vec_logger_collects() {
        let mut events: Vec<AnomalyEvent> = Vec::new();
        events.record(&AnomalyEvent::new(1, 2.0)).unwrap();
        assert_eq!(events, vec![AnomalyEvent::new(1, 2.0)]);
    }
}
