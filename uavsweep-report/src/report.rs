//! Report Data Structures

use crate::metric::{Metric, MetricValues};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Result of one simulator invocation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Experiment the run belongs to
    pub experiment: String,
    /// Instance identifier as written in the configuration
    pub instance: String,
    /// File stem of the instance (e.g. `PSP-UAV_02_b`)
    pub instance_stem: String,
    /// Trailing `a`/`b` variant of the stem, empty when absent
    pub instance_variant: String,
    pub drones: u32,
    pub iterations: u32,
    pub ticks: u32,
    /// 1-based repetition index
    pub repeat_index: u32,
    /// Process exit code (negated signal number when killed by a signal)
    pub exit_code: i32,
    /// Extracted metrics; always empty when `exit_code != 0`
    pub metrics: MetricValues,
    pub stdout: String,
    pub stderr: String,
    /// Exact argument vector, executable first
    pub command: Vec<String>,
}

impl RunOutcome {
    /// Whether the simulator exited cleanly.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Value of a metric, if it was extracted.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    /// Key identifying the combination this run belongs to (repetitions collapse).
    pub fn combination(&self) -> CombinationKey {
        CombinationKey {
            instance: self.instance.clone(),
            drones: self.drones,
            iterations: self.iterations,
            ticks: self.ticks,
        }
    }
}

/// Grouping key for per-combination averages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinationKey {
    pub instance: String,
    pub drones: u32,
    pub iterations: u32,
    pub ticks: u32,
}

/// Arithmetic means for one combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationAverages {
    pub key: CombinationKey,
    /// Number of runs in the group (all repetitions, failed ones included)
    pub runs: usize,
    /// Means in [`Metric::ALL`] order; metrics absent from every run are left out
    pub means: Vec<(Metric, f64)>,
}

impl CombinationAverages {
    /// Mean of one metric, if any run in the group reported it.
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, v)| *v)
    }
}

/// Resolved sweep parameters echoed in the report header
#[derive(Debug, Clone, PartialEq)]
pub struct SweepParameters {
    pub experiment: String,
    pub instances: Vec<String>,
    pub iterations: Vec<u32>,
    pub iterations_by_instance: BTreeMap<String, Vec<u32>>,
    pub drones: Vec<u32>,
    pub ticks: Vec<u32>,
    pub repeats: u32,
    pub export_data: bool,
    pub include_time_breakdown: bool,
    pub export_csv: bool,
}

/// Report metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    /// Harness version
    pub version: String,
    pub timestamp: DateTime<Local>,
    /// Resolved simulator executable
    pub binary: PathBuf,
    pub git_commit: Option<String>,
    pub os: String,
    pub arch: String,
}

/// Run counts for one experiment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub total_runs: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Runs that exited cleanly but printed none of the expected metrics
    pub without_metrics: usize,
    pub total_duration_ms: f64,
}

/// Complete report for one experiment
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub meta: ReportMeta,
    pub parameters: SweepParameters,
    /// Outcomes in execution order
    pub outcomes: Vec<RunOutcome>,
    /// Averages in first-seen combination order
    pub averages: Vec<CombinationAverages>,
    pub summary: ReportSummary,
}
