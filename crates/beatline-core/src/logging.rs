//! Logging configuration shared by the outer applications.
//!
//! The core only logs through `tracing` macros; installing a subscriber is up
//! to the binary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{fs, io};
use tracing::Level;

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name (trace, debug, info, warn, error)
    pub level: String,
    /// Write logs to stderr
    pub console_output: bool,
    /// Also write logs to a file
    pub file_output: bool,
    /// Directory for log files
    pub log_directory: PathBuf,
    /// Log file name inside `log_directory`
    pub file_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
            file_name: "beatline.log".to_string(),
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    /// Create `log_directory` if it does not exist
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_directory)
    }

    /// Full path of the log file
    pub fn current_log_path(&self) -> PathBuf {
        self.log_directory.join(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), Level::INFO);

        config.level = "DEBUG".to_string();
        assert_eq!(config.parse_level(), Level::DEBUG);

        config.level = "chatty".to_string();
        assert_eq!(config.parse_level(), Level::INFO);
    }

    #[test]
    fn test_log_path() {
        let config = LogConfig {
            log_directory: PathBuf::from("/tmp/beatline"),
            ..Default::default()
        };
        assert_eq!(
            config.current_log_path(),
            PathBuf::from("/tmp/beatline/beatline.log")
        );
    }

    #[test]
    fn test_ensure_log_directory_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_directory: dir.path().join("a").join("b"),
            ..Default::default()
        };
        config.ensure_log_directory().unwrap();
        assert!(config.log_directory.is_dir());
        // Existing directory is fine
        config.ensure_log_directory().unwrap();
    }
}
