use palletizer_core::Axis;
use palletizer_settings::{AppConfig, SettingsError, VisualizationConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_app_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let mut config = AppConfig::new();
    config.connection.port = "/dev/ttyACM0".to_string();
    config.connection.baud_rate = 57_600;
    config.axes.get_mut(Axis::T).speed = 1500;
    config.axes.get_mut(Axis::X).inverted = true;
    config.execution.completion_timeout_ms = Some(30_000);
    config.execution.auto_advance = true;

    config.save_to_file(&path).unwrap();
    let loaded = AppConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "connection:\n  baud_rate: 1234\n").unwrap();
    assert!(matches!(
        AppConfig::load_from_file(&path),
        Err(SettingsError::InvalidSetting { .. })
    ));

    fs::write(&path, "connection: [1, 2\n").unwrap();
    assert!(matches!(
        AppConfig::load_from_file(&path),
        Err(SettingsError::LoadError { .. })
    ));
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.yaml");
    assert!(AppConfig::load_from_file(&path).is_err());
    assert_eq!(AppConfig::load_or_default(&path).unwrap(), AppConfig::default());
}

#[test]
fn test_visualization_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cell.yaml");

    let mut config = VisualizationConfig::default();
    config.name = "Cell 2".to_string();
    config.camera.azimuth = 90.0;
    config.rail_lengths.insert("y".to_string(), 750.0);
    config.save_to_file(&path).unwrap();

    assert_eq!(VisualizationConfig::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_visualization_name_falls_back_to_stem() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("line_three.yaml");
    fs::write(&path, "display:\n  line_width: 4\n").unwrap();

    let config = VisualizationConfig::load_from_file(&path).unwrap();
    assert_eq!(config.name, "line_three");
    assert_eq!(config.display.line_width, 4.0);
    assert_eq!(config.axis_ranges.len(), 5);
}
