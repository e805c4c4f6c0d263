//! Configuration loading and failure-mode tests.

use metrics_preprocessor::{Pipeline, PrepError, PreprocessorConfig};
use std::fs;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> PreprocessorConfig {
    let mut config = PreprocessorConfig::default();
    config.input_glob = dir.path().join("*.csv").to_string_lossy().into_owned();
    config.output_dir = dir.path().join("out");
    config.metrics = vec!["cpu".to_string()];
    config.sliding_window.target_metric = "cpu".to_string();
    config.sliding_window.forecast_steps = vec![1];
    config.sliding_window.sequence_length = 3;
    config.features.lags = vec![1];
    config.features.rolling_windows = vec![2];
    config
}

#[test]
fn test_generated_config_runs() {
    let dir = TempDir::new().unwrap();
    let mut csv = String::from("ts,name,val,host\n");
    for i in 0..40 {
        csv.push_str(&format!("2024-03-01 10:{i:02}:00,cpu,{},web-1\n", i % 4));
    }
    fs::write(dir.path().join("a.csv"), csv).unwrap();

    let mut config = config_in(&dir);
    config.timestamp_column = "ts".to_string();
    config.metric_column = "name".to_string();
    config.value_column = "val".to_string();

    let path = dir.path().join("preprocess.toml");
    config.save(&path).unwrap();
    let loaded = PreprocessorConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let output = Pipeline::new(loaded).unwrap().run().unwrap();
    assert_eq!(output.stats.rows_loaded, 40);
    assert_eq!(output.stats.dataset_rows, 38);
}

#[test]
fn test_invalid_config_fails_before_io() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.splits.train = 0.9;

    let err = Pipeline::new(config).unwrap_err();
    assert!(matches!(err, PrepError::InvalidSplitConfig { .. }));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_unconfigured_target_metric_fails_before_io() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.csv"),
        "timestamp,metric,value\n2024-03-01T10:00:00Z,latency,1\n",
    )
    .unwrap();

    let mut config = config_in(&dir);
    config.sliding_window.target_metric = "latency".to_string();

    let err = Pipeline::new(config).unwrap_err();
    assert!(err.is_config_error(), "{err}");
    assert!(err.to_string().contains("latency"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_colliding_metric_name_is_config_error() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.metrics = vec!["cpu".to_string(), "cpu_lag_1".to_string()];

    let err = Pipeline::new(config).unwrap_err();
    assert!(err.is_config_error(), "{err}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "metrics: [cpu\n  sliding_window: {").unwrap();
    assert!(PreprocessorConfig::load(&path).unwrap_err().is_config_error());

    let path = dir.path().join("bad.json");
    fs::write(&path, "{\"metrics\": 3}").unwrap();
    assert!(PreprocessorConfig::load(&path).unwrap_err().is_config_error());
}

#[test]
fn test_no_input_files() {
    let dir = TempDir::new().unwrap();
    let err = Pipeline::new(config_in(&dir)).unwrap().run().unwrap_err();
    assert!(matches!(err, PrepError::NoInputFiles { .. }));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_mixed_timezones_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.csv"),
        "timestamp,metric,value\n2024-03-01T10:00:00Z,cpu,1\n2024-03-01 10:01:00,cpu,2\n",
    )
    .unwrap();

    let err = Pipeline::new(config_in(&dir)).unwrap().run().unwrap_err();
    assert!(matches!(err, PrepError::MixedTimezones { .. }));
}

#[test]
fn test_missing_header_column() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.csv"),
        "timestamp,metric_name,value\n2024-03-01T10:00:00Z,cpu,1\n",
    )
    .unwrap();

    let err = Pipeline::new(config_in(&dir)).unwrap().run().unwrap_err();
    assert!(matches!(err, PrepError::MissingColumn { ref column, .. } if column == "metric"));
}
