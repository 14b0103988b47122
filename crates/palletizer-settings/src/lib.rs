//! Palletizer Settings Crate
//!
//! Application configuration (serial link, axes, execution) and the
//! visualization layout, both stored as YAML with missing keys defaulted.

pub mod config;
pub mod error;
pub mod visualization;

pub use config::{AppConfig, AxesConfig, ExecutionSettings};
pub use error::{SettingsError, SettingsResult};
pub use visualization::{AxisRange, CameraSettings, DisplaySettings, VisualizationConfig};
