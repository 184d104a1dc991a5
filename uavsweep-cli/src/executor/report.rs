//! Report Building
//!
//! Assembles the complete per-experiment report from run outcomes.
//!
//! ```text
//! RunOutcome × N
//!       │
//!       ├──► compute_averages ──► CombinationAverages
//!       │
//!       └──► summary counts   ──► ReportSummary
//!                                       │
//!                                       ▼
//!                                  SweepReport
//! ```

use super::statistics::compute_averages;
use uavsweep_report::{ReportMeta, ReportSummary, RunOutcome, SweepParameters, SweepReport};

/// Build a complete SweepReport from execution results
///
/// # Arguments
/// * `meta` - Header metadata (version, timestamp, binary, host)
/// * `parameters` - Resolved parameters of the experiment
/// * `outcomes` - Run outcomes in execution order
/// * `total_duration_ms` - Wall-clock duration of the sweep in milliseconds
pub fn build_report(
    meta: ReportMeta,
    parameters: SweepParameters,
    outcomes: Vec<RunOutcome>,
    total_duration_ms: f64,
) -> SweepReport {
    let mut summary = ReportSummary {
        total_runs: outcomes.len(),
        total_duration_ms,
        ..Default::default()
    };

    for outcome in &outcomes {
        if outcome.succeeded() {
            summary.succeeded += 1;
            if outcome.metrics.is_empty() {
                summary.without_metrics += 1;
            }
        } else {
            summary.failed += 1;
        }
    }

    let averages = compute_averages(&outcomes);

    SweepReport {
        meta,
        parameters,
        outcomes,
        averages,
        summary,
    }
}
