//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - resolves the pipeline configuration (defaults -> config file -> flags)
//! - runs every timepoint and prints the summary
//! - writes optional exports

use std::path::Path;

use clap::Parser;

use crate::cli::{Command, DemoArgs, InspectArgs, RunArgs};
use crate::data::{DemoOptions, generate_demo_dataset};
use crate::domain::{AggregationMode, PipelineConfig, SampleKey, StorageKind};
use crate::error::AppError;

pub mod pipeline;

/// Config file written next to generated demo data.
pub const DEMO_CONFIG_NAME: &str = "ccmp.json";

/// Entry point for the `ccmp` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    // Allow RUST_LOG / CCMP_FONT to come from a local `.env`.
    dotenvy::dotenv().ok();
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Demo(args) => handle_demo(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = resolve_config(&args)?;
    config.validate()?;

    let report = match args.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| AppError::new(4, format!("Failed to build worker pool: {e}")))?;
            pool.install(|| pipeline::run_all(&config))
        }
        None => pipeline::run_all(&config),
    };

    println!("{}", crate::report::format_run_summary(&report, &config));

    if let Some(path) = &args.export_summary {
        crate::io::export::write_summary_csv(path, &report)?;
    }

    let failed = report.failed().count();
    if failed > 0 {
        return Err(AppError::new(
            3,
            format!("{failed} of {} timepoints failed.", report.outcomes.len()),
        ));
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = PipelineConfig {
        data_dir: args.out_dir.clone(),
        output_dir: args.out_dir.join("charts"),
        // Demo files list every sample; keep the trailing replicate group.
        aggregation: AggregationMode::Complete,
        ..PipelineConfig::default()
    };
    let opts = DemoOptions {
        samples: args.samples,
        replicates: args.replicates,
        seed: args.seed,
    };

    let written = generate_demo_dataset(&config, &opts)?;
    let config_path = args.out_dir.join(DEMO_CONFIG_NAME);
    crate::io::config::write_config_json(&config_path, &config)?;

    println!(
        "Wrote {} files to '{}'.\nRun: ccmp run --config '{}'",
        written.len(),
        args.out_dir.display(),
        config_path.display()
    );
    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<(), AppError> {
    let rows = crate::io::load_count_rows(&args.file)?;
    let samples = match args.storage {
        StorageKind::Replicates => {
            crate::aggregate::aggregate_replicates(&rows, args.aggregation, SampleKey(args.first_key))
        }
        StorageKind::PerSample => crate::aggregate::per_sample(&rows),
    };

    println!("{}: {} rows", args.file.display(), rows.len());
    println!("{}", crate::report::format_samples(&samples));
    Ok(())
}

/// Layer CLI overrides on top of the config file (or defaults).
pub fn resolve_config(args: &RunArgs) -> Result<PipelineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(timepoints) = &args.timepoints {
        config.timepoints = timepoints.iter().map(|s| s.trim().to_string()).collect();
    }
    if let Some(template) = &args.template {
        config.file_template = template.clone();
    }
    if let Some(name) = &args.x_technique {
        config.x_technique.name = name.clone();
    }
    if let Some(name) = &args.y_technique {
        config.y_technique.name = name.clone();
    }
    if let Some(mode) = args.aggregation {
        config.aggregation = mode;
    }
    if let Some(key) = args.first_key {
        config.first_key = key;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(font) = &args.font {
        config.font = Some(font.clone());
    }

    Ok(config)
}

fn load_config_file(path: &Path) -> Result<PipelineConfig, AppError> {
    let config = crate::io::config::read_config_json(path)?;
    log::info!("loaded config '{}'", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = RunArgs {
            timepoints: Some(vec![" 6h".to_string(), "12h ".to_string()]),
            aggregation: Some(AggregationMode::Complete),
            x_technique: Some("Brightfield".to_string()),
            ..RunArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.timepoints, vec!["6h".to_string(), "12h".to_string()]);
        assert_eq!(config.aggregation, AggregationMode::Complete);
        assert_eq!(config.x_technique.name, "Brightfield");
        assert_eq!(config.chart_title("6h"), "6h - DAPI vs Brightfield Count");
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "width": 640, "height": 480, "timepoints": ["1d"] }"#).unwrap();

        let args = RunArgs {
            config: Some(path),
            height: Some(300),
            output_dir: Some(PathBuf::from("out")),
            ..RunArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!((config.width, config.height), (640, 300));
        assert_eq!(config.timepoints, vec!["1d".to_string()]);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn missing_config_file_is_a_usage_error() {
        let args = RunArgs {
            config: Some(PathBuf::from("no/such/config.json")),
            ..RunArgs::default()
        };
        assert_eq!(resolve_config(&args).unwrap_err().exit_code(), 2);
    }
}
