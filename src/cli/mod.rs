//! Command-line parsing for the replicate-count comparison tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline. Every run option is optional here; unset values fall back to the
//! config file (if any) and then to `PipelineConfig::default()`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{AggregationMode, StorageKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ccmp", version, about = "Compare two cell-counting techniques across timepoints")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate, pair, fit and chart every timepoint.
    Run(RunArgs),
    /// Write synthetic source files to try the pipeline with.
    Demo(DemoArgs),
    /// Print the aggregated samples of a single source file.
    Inspect(InspectArgs),
}

/// Options for a pipeline run.
#[derive(Debug, Parser, Clone, Default)]
pub struct RunArgs {
    /// JSON config file; flags below override its values.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Directory containing the source CSV files.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory charts are written into.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated timepoint labels (e.g. 24h,48h).
    #[arg(long, value_delimiter = ',')]
    pub timepoints: Option<Vec<String>>,

    /// Source file name template with {technique} and {timepoint}.
    #[arg(long)]
    pub template: Option<String>,

    /// Technique plotted on the x axis (stored as replicates).
    #[arg(long)]
    pub x_technique: Option<String>,

    /// Technique plotted on the y axis (stored per sample).
    #[arg(long)]
    pub y_technique: Option<String>,

    /// Replicate aggregation behaviour.
    #[arg(long, value_enum)]
    pub aggregation: Option<AggregationMode>,

    /// First sample key expected by partial and reference aggregation.
    #[arg(long)]
    pub first_key: Option<i64>,

    /// Chart width (pixels).
    #[arg(long)]
    pub width: Option<u32>,

    /// Chart height (pixels).
    #[arg(long)]
    pub height: Option<u32>,

    /// TTF font used for chart text.
    #[arg(long, value_name = "TTF")]
    pub font: Option<PathBuf>,

    /// Write a per-timepoint results CSV.
    #[arg(long, value_name = "CSV")]
    pub export_summary: Option<PathBuf>,

    /// Worker threads (defaults to one per core).
    #[arg(long)]
    pub jobs: Option<usize>,
}

/// Options for demo data generation.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Directory to write the demo dataset into.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Samples (culture numbers) per file.
    #[arg(long, default_value_t = 12)]
    pub samples: usize,

    /// Replicate rows per sample for replicate-stored techniques.
    #[arg(long, default_value_t = 3)]
    pub replicates: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for inspecting one file.
#[derive(Debug, Parser, Clone)]
pub struct InspectArgs {
    /// Source CSV file.
    #[arg(long, value_name = "CSV")]
    pub file: PathBuf,

    /// How the file stores its counts.
    #[arg(long, value_enum, default_value_t = StorageKind::Replicates)]
    pub storage: StorageKind,

    /// Replicate aggregation behaviour.
    #[arg(long, value_enum, default_value_t = AggregationMode::Partial)]
    pub aggregation: AggregationMode,

    /// First sample key expected by partial and reference aggregation.
    #[arg(long, default_value_t = 1)]
    pub first_key: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::parse_from([
            "ccmp",
            "-vv",
            "run",
            "--timepoints",
            "24h,48h",
            "--aggregation",
            "complete",
            "--width",
            "800",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.timepoints, Some(vec!["24h".to_string(), "48h".to_string()]));
        assert_eq!(args.aggregation, Some(AggregationMode::Complete));
        assert_eq!(args.width, Some(800));
        assert!(args.config.is_none());
    }

    #[test]
    fn inspect_defaults_to_partial_replicates() {
        let cli = Cli::parse_from(["ccmp", "inspect", "--file", "a.csv"]);
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.storage, StorageKind::Replicates);
        assert_eq!(args.aggregation, AggregationMode::Partial);
        assert_eq!(args.first_key, 1);
    }
}
