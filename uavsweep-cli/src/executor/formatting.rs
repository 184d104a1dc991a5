//! Output Formatting
//!
//! Plain-text rendering of a sweep report, in three sections:
//! - a header with the resolved parameters and host metadata
//! - `=== Individual results ===`, one block per run
//! - `=== Averages per combination ===`, one block per group

use uavsweep_report::{ReportSummary, SweepReport, format_metric_value};

/// Format a report as the text written to `run_<stamp>_<slug>.txt`
pub fn format_text_report(report: &SweepReport) -> String {
    let params = &report.parameters;
    let meta = &report.meta;
    let mut output = String::new();

    output.push_str(&format!(
        "PSP-UAV batch run - {} | Experiment: {}\n",
        meta.timestamp.format("%Y-%m-%d %H:%M:%S"),
        params.experiment
    ));
    output.push_str(&format!("Binary: {}\n", meta.binary.display()));
    output.push_str(&format!("Harness: uavsweep {}\n", meta.version));
    if let Some(commit) = &meta.git_commit {
        output.push_str(&format!("Git commit: {}\n", commit));
    }
    output.push_str(&format!("Host: {}/{}\n", meta.os, meta.arch));
    output.push_str(&format!("Instances: {}\n", params.instances.join(", ")));
    output.push_str(&format!("Default iterations: {:?}\n", params.iterations));
    if !params.iterations_by_instance.is_empty() {
        let overrides: Vec<String> = params
            .iterations_by_instance
            .iter()
            .map(|(instance, iterations)| format!("{}={:?}", instance, iterations))
            .collect();
        output.push_str(&format!("Per-instance iterations: {}\n", overrides.join(", ")));
    }
    output.push_str(&format!("Drones: {:?}\n", params.drones));
    output.push_str(&format!("T (ticks): {:?}\n", params.ticks));
    output.push_str(&format!("Repeats per combination: {}\n", params.repeats));
    output.push_str(&format!(
        "--export: {} (overwrites exported_data/ on every run)\n",
        params.export_data
    ));
    output.push_str(&format!("--times: {}\n", params.include_time_breakdown));
    output.push('\n');

    output.push_str("=== Individual results ===\n");
    for outcome in &report.outcomes {
        output.push_str(&format!(
            "[{}] drones={} iter={} T={} rep={}/{}\n",
            outcome.instance,
            outcome.drones,
            outcome.iterations,
            outcome.ticks,
            outcome.repeat_index,
            params.repeats
        ));
        output.push_str(&format!("cmd: {}\n", outcome.command.join(" ")));
        output.push_str(&format!("exit_code: {}\n", outcome.exit_code));

        if outcome.metrics.is_empty() {
            output.push_str("No metrics could be extracted (the run may have failed).\n");
        } else {
            for (metric, value) in &outcome.metrics {
                output.push_str(&format!("{}: {}\n", metric, format_metric_value(*value)));
            }
        }

        for (label, text) in [("stderr", &outcome.stderr), ("stdout", &outcome.stdout)] {
            let text = text.trim();
            if !text.is_empty() {
                output.push_str(&format!("{}:\n{}\n", label, text));
            }
        }
        output.push('\n');
    }

    output.push_str("=== Averages per combination ===\n");
    for group in &report.averages {
        output.push_str(&format!(
            "[{}] drones={} iter={} T={} runs={}\n",
            group.key.instance,
            group.key.drones,
            group.key.iterations,
            group.key.ticks,
            group.runs
        ));
        for (metric, mean) in &group.means {
            output.push_str(&format!("avg_{}: {:.6}\n", metric, mean));
        }
        output.push('\n');
    }

    output
}

/// One-line console summary printed after an experiment
pub fn format_summary_line(summary: &ReportSummary) -> String {
    let mut line = format!(
        "{} runs: {} successful, {} failed",
        summary.total_runs, summary.succeeded, summary.failed
    );
    if summary.without_metrics > 0 {
        line.push_str(&format!(" ({} without metrics)", summary.without_metrics));
    }
    line.push_str(&format!(" in {:.1}s", summary.total_duration_ms / 1000.0));
    line
}
