//! Visualization layout files
//!
//! Rail lengths, offsets, per-axis display ranges and the camera pose of the
//! 3D view. Only the file format lives here; rendering is out of scope.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_NAME: &str = "Default Configuration";

/// Display range of one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisRange {
    /// Lowest displayed value
    pub min: f64,
    /// Highest displayed value
    pub max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            min: -1000.0,
            max: 1000.0,
        }
    }
}

/// Camera pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Distance from the scene origin
    pub distance: f64,
    /// Elevation angle in degrees
    pub elevation: f64,
    /// Azimuth angle in degrees
    pub azimuth: f64,
    /// Horizontal pan offset
    pub pan_x: f64,
    /// Vertical pan offset
    pub pan_y: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 2000.0,
            elevation: 30.0,
            azimuth: 45.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Line drawing options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Width of rail and arm lines
    pub line_width: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { line_width: 2.0 }
    }
}

/// A saved visualization layout
///
/// Keys are kept as strings so files written by other tools load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Layout name
    pub name: String,
    /// Rail length of the `x`, `y` and `z` axes
    pub rail_lengths: BTreeMap<String, f64>,
    /// Mounting offsets (`x_offset`, `y_offset`, `z_offset`)
    pub relative_positions: BTreeMap<String, f64>,
    /// Whether an axis is drawn mirrored
    pub axis_inverted: BTreeMap<String, bool>,
    /// Display range per axis
    pub axis_ranges: BTreeMap<String, AxisRange>,
    /// Camera pose
    pub camera: CameraSettings,
    /// Line drawing options
    pub display: DisplaySettings,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        let axes = ["x", "y", "z", "t", "g"];
        let rail_lengths = [("x", 1500.0), ("y", 500.0), ("z", 1200.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let relative_positions = ["x_offset", "y_offset", "z_offset"]
            .into_iter()
            .map(|k| (k.to_string(), 0.0))
            .collect();
        let axis_inverted = axes
            .iter()
            .map(|axis| (axis.to_string(), *axis == "x"))
            .collect();
        let axis_ranges = axes
            .iter()
            .map(|axis| (axis.to_string(), AxisRange::default()))
            .collect();

        Self {
            name: DEFAULT_NAME.to_string(),
            rail_lengths,
            relative_positions,
            axis_inverted,
            axis_ranges,
            camera: CameraSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl VisualizationConfig {
    /// Load a layout; a missing name falls back to the file stem
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let raw: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| SettingsError::LoadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let has_name = raw.get("name").is_some();

        let mut config: Self = if raw.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(raw).map_err(|e| SettingsError::LoadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        };
        if !has_name {
            if let Some(stem) = path.file_stem() {
                config.name = stem.to_string_lossy().into_owned();
            }
        }
        Ok(config)
    }

    /// Save a layout
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|e| SettingsError::SaveError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VisualizationConfig::default();
        assert_eq!(config.rail_lengths.get("x"), Some(&1500.0));
        assert_eq!(config.axis_inverted.get("x"), Some(&true));
        assert_eq!(config.axis_inverted.get("g"), Some(&false));
        assert_eq!(config.axis_ranges.len(), 5);
        assert_eq!(config.camera.distance, 2000.0);
    }

    #[test]
    fn test_missing_sections_default() {
        let yaml = "name: cell\ncamera:\n  distance: 900\n  elevation: 10\n  azimuth: 0\nextra: 1\n";
        let config: VisualizationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "cell");
        assert_eq!(config.camera.distance, 900.0);
        assert_eq!(config.camera.pan_x, 0.0);
        assert_eq!(config.display, DisplaySettings::default());
        assert_eq!(config.rail_lengths.get("z"), Some(&1200.0));
    }
}
