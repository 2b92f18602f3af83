//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns and output changes are localized.

use crate::app::pipeline::RunReport;
use crate::domain::{AggregatedSample, PipelineConfig};

/// Format the run summary: settings, then one line per timepoint.
pub fn format_run_summary(report: &RunReport, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== ccmp - {} vs {} ===\n",
        config.y_technique.name, config.x_technique.name
    ));
    out.push_str(&format!("Data: {}\n", config.data_dir.display()));
    out.push_str(&format!("Aggregation: {:?}\n", config.aggregation));
    out.push('\n');

    out.push_str(&format!(
        "{:<10} {:>5} {:>12} {:>12} {:>8}  {}\n",
        "timepoint", "n", "slope", "intercept", "r2", "artifact"
    ));
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(run) => out.push_str(&format!(
                "{:<10} {:>5} {:>12.4} {:>12.4} {:>8.4}  {}\n",
                outcome.timepoint,
                run.pairs.len(),
                run.line.slope,
                run.line.intercept,
                run.line.r_squared,
                run.artifact.display()
            )),
            Err(e) => out.push_str(&format!("{:<10} FAILED: {e}\n", outcome.timepoint)),
        }
    }

    let failed = report.failed().count();
    out.push_str(&format!(
        "\n{} of {} timepoints succeeded\n",
        report.outcomes.len() - failed,
        report.outcomes.len()
    ));

    out
}

/// Format aggregated samples as a two-column table.
pub fn format_samples(samples: &[AggregatedSample]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>8} {:>12}\n", "sample", "mean count"));
    for s in samples {
        out.push_str(&format!("{:>8} {:>12.4}\n", s.sample, s.value));
    }
    out.push_str(&format!("({} samples)\n", samples.len()));
    out
}
