//! Configuration and settings management for the palletizer controller
//!
//! Provides the YAML configuration file, validation, and the default
//! location under the user's config directory.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (port, baud rate, timeouts)
//! - Axis settings (speed, jog range, display inversion)
//! - Execution settings (completion timeout, automatic advance)

use crate::error::{SettingsError, SettingsResult};
use palletizer_communication::ConnectionParams;
use palletizer_core::constants::{BAUDRATES, MAX_SPEED, MIN_SPEED};
use palletizer_core::{Axis, AxisSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR_NAME: &str = "palletizer";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Settings of every axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    /// Horizontal rail
    pub x: AxisSettings,
    /// Depth rail
    pub y: AxisSettings,
    /// Vertical lift
    pub z: AxisSettings,
    /// Rotation
    pub t: AxisSettings,
    /// Gripper
    pub g: AxisSettings,
}

impl AxesConfig {
    /// Settings of one axis
    pub fn get(&self, axis: Axis) -> &AxisSettings {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::T => &self.t,
            Axis::G => &self.g,
        }
    }

    /// Settings of one axis for editing
    pub fn get_mut(&mut self, axis: Axis) -> &mut AxisSettings {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::T => &mut self.t,
            Axis::G => &mut self.g,
        }
    }

    /// Every axis with its settings, in wire order
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisSettings)> + '_ {
        Axis::ALL.iter().map(move |axis| (*axis, self.get(*axis)))
    }
}

/// Sequence execution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Give up waiting for the completion handshake after this long;
    /// unset waits forever
    pub completion_timeout_ms: Option<u64>,
    /// Advance to the next row as soon as the previous one completes
    pub auto_advance: bool,
}

impl ExecutionSettings {
    /// Completion timeout as a duration
    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial link settings
    pub connection: ConnectionParams,
    /// Per-axis settings
    pub axes: AxesConfig,
    /// Execution settings
    pub execution: ExecutionSettings,
}

impl AppConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, `<config dir>/palletizer/config.yaml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no user config directory on this platform".into())
            })
    }

    /// Load config from a YAML file
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| SettingsError::LoadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from a file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to a YAML file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let save_error = |reason: String| SettingsError::SaveError {
            path: path.display().to_string(),
            reason,
        };

        let content = serde_yaml::to_string(self).map_err(|e| save_error(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_error(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_error(e.to_string()))?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    ///
    /// An empty port is allowed here; it is only required when connecting.
    pub fn validate(&self) -> SettingsResult<()> {
        let connection = &self.connection;

        if !BAUDRATES.contains(&connection.baud_rate) {
            return Err(SettingsError::invalid(
                "connection.baud_rate",
                format!(
                    "unsupported baud rate {}, expected one of {:?}",
                    connection.baud_rate, BAUDRATES
                ),
            ));
        }

        if connection.read_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.read_timeout_ms",
                "must be > 0",
            ));
        }

        if connection.poll_interval_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.poll_interval_ms",
                "must be > 0",
            ));
        }

        if !(5..=8).contains(&connection.data_bits) {
            return Err(SettingsError::invalid(
                "connection.data_bits",
                "must be between 5 and 8",
            ));
        }

        if !(1..=2).contains(&connection.stop_bits) {
            return Err(SettingsError::invalid(
                "connection.stop_bits",
                "must be 1 or 2",
            ));
        }

        for (axis, settings) in self.axes.iter() {
            if settings.min > settings.max {
                return Err(SettingsError::invalid(
                    &format!("axes.{axis}"),
                    format!("min {} is above max {}", settings.min, settings.max),
                ));
            }
            if !(MIN_SPEED..=MAX_SPEED).contains(&settings.speed) {
                return Err(SettingsError::invalid(
                    &format!("axes.{axis}.speed"),
                    format!("must be within [{MIN_SPEED}, {MAX_SPEED}]"),
                ));
            }
        }

        if self.execution.completion_timeout_ms == Some(0) {
            return Err(SettingsError::invalid(
                "execution.completion_timeout_ms",
                "must be > 0 when set",
            ));
        }

        Ok(())
    }

    /// Connection parameters with the port and baud rate overridden where given
    pub fn connection_params(&self, port: Option<&str>, baud_rate: Option<u32>) -> ConnectionParams {
        let mut params = self.connection.clone();
        if let Some(port) = port {
            params.port = port.to_string();
        }
        if let Some(baud_rate) = baud_rate {
            params.baud_rate = baud_rate;
        }
        params
    }
}
