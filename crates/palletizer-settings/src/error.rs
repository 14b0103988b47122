//! Error types for the settings crate.
//!
//! This module provides structured error types for loading, saving and
//! validating configuration files.

use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be loaded.
    #[error("Failed to load settings from {path}: {reason}")]
    LoadError {
        /// File that failed to load.
        path: String,
        /// Why it failed.
        reason: String,
    },

    /// The configuration file could not be saved.
    #[error("Failed to save settings to {path}: {reason}")]
    SaveError {
        /// File that failed to save.
        path: String,
        /// Why it failed.
        reason: String,
    },

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Dotted key of the offending setting.
        key: String,
        /// Why the value is rejected.
        reason: String,
    },

    /// The configuration directory could not be found or created.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl SettingsError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        SettingsError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::LoadError {
            path: "cfg.yaml".to_string(),
            reason: "file not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load settings from cfg.yaml: file not found"
        );

        let err = SettingsError::invalid("connection.baud_rate", "unsupported baud rate 250000");
        assert_eq!(
            err.to_string(),
            "Invalid setting 'connection.baud_rate': unsupported baud rate 250000"
        );

        let err = SettingsError::ConfigDirectory("permission denied".to_string());
        assert_eq!(err.to_string(), "Config directory error: permission denied");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let settings_err: SettingsError = io_err.into();
        assert!(matches!(settings_err, SettingsError::IoError(_)));

        let yaml_err = serde_yaml::from_str::<u32>("[").unwrap_err();
        let settings_err: SettingsError = yaml_err.into();
        assert!(matches!(settings_err, SettingsError::YamlError(_)));
    }
}
