//! Metrics Preprocessing Tool
//!
//! Configuration-driven command-line entry point for the preprocessing
//! pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Run from a YAML, TOML or JSON config
//! cargo run --release --bin preprocess -- --config configs/preprocess.yaml
//!
//! # Generate a default config (format picked by extension)
//! cargo run --release --bin preprocess -- --generate-config configs/preprocess.yaml
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use metrics_preprocessor::{verify_outputs, Pipeline, PreprocessorConfig};

/// Main entry point for the preprocessing tool
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--config" => {
            if args.len() < 3 {
                eprintln!("Error: --config requires a path argument");
                std::process::exit(1);
            }
            run_from_config(&args[2]);
        }
        "--generate-config" => {
            if args.len() < 3 {
                eprintln!("Error: --generate-config requires a path argument");
                std::process::exit(1);
            }
            generate_config(&args[2]);
        }
        "--help" | "-h" => {
            print_usage(&args[0]);
        }
        _ => {
            eprintln!("Unknown argument: {}", args[1]);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        r#"
Metrics Preprocessing Tool

Usage:
    {program} --config <path>            Run the pipeline from a config file
    {program} --generate-config <path>   Write a default config file
    {program} --help                     Show this help

Config files may be YAML (.yaml/.yml), TOML (.toml) or JSON (.json).

Examples:
    {program} --generate-config configs/preprocess.yaml
    {program} --config configs/preprocess.yaml
"#
    );
}

/// Write the default configuration
fn generate_config(path: &str) {
    match PreprocessorConfig::default().save(path) {
        Ok(()) => {
            println!("Generated default config: {path}");
            println!("\nEdit the following fields before running:");
            println!("  - input_glob: CSV files with timestamp, metric, value columns");
            println!("  - metrics: metric names to keep");
            println!("  - output_dir: where datasets are written");
            println!("  - sliding_window.target_metric: metric to forecast");
        }
        Err(e) => {
            eprintln!("Error generating config: {e}");
            std::process::exit(1);
        }
    }
}

/// Load, validate and run
fn run_from_config(config_path: &str) {
    let config = match PreprocessorConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(2);
        }
    };
    print_config_summary(&config);

    let pipeline = match Pipeline::new(config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            std::process::exit(2);
        }
    };

    let output = match pipeline.run() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Preprocessing failed: {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("┌─ Results ─────────────────────────────────────────────────────┐");
    println!("│ Rows loaded:        {}", output.stats.rows_loaded);
    println!("│ Rows resampled:     {}", output.stats.rows_resampled);
    println!("│ Anomalies removed:  {}", output.stats.anomaly_rows_removed);
    println!("│ Dataset rows:       {}", output.stats.dataset_rows);
    for (split, rows) in &output.stats.split_rows {
        let sequences = output.stats.split_sequences.get(split).copied().unwrap_or(0);
        println!("│   {split:<11} {rows:>8} rows {sequences:>8} sequences");
    }
    println!("│ Output:             {}", output.output_dir.display());
    println!("└────────────────────────────────────────────────────────────────┘");
    print!("{}", output.validation);

    let missing = verify_outputs(&output.output_dir);
    if !missing.is_empty() {
        for path in &missing {
            eprintln!("Missing output: {}", path.display());
        }
        std::process::exit(1);
    }
}

fn print_config_summary(config: &PreprocessorConfig) {
    println!("┌─ Configuration Summary ───────────────────────────────────────┐");
    println!("│ Input:      {}", config.input_glob);
    println!("│ Metrics:    {}", config.metrics.join(", "));
    println!("│ Resample:   {} ({:?})", config.resample_rule, config.interpolation_method);
    println!(
        "│ Features:   time={} lags={:?} rolling={:?}",
        config.features.enable_time_features,
        config.features.lags,
        config.features.rolling_windows
    );
    println!(
        "│ Target:     {} @ {:?}",
        config.sliding_window.target_metric, config.sliding_window.forecast_steps
    );
    println!(
        "│ Window:     {} rows, stride {}",
        config.sliding_window.sequence_length, config.sliding_window.stride
    );
    println!("│ Scaler fit: {}", config.scaler_fit_scope.as_str());
    println!("│ Output:     {}", config.output_dir.display());
    println!("└────────────────────────────────────────────────────────────────┘");
}
