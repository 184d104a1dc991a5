#![warn(missing_docs)]
//! # uavsweep
//!
//! Parameter-sweep experiment harness for the PSP-UAV solver.
//!
//! uavsweep runs the external simulator over the cartesian product of its
//! inputs and collects the results:
//! - **Layered configuration**: built-in defaults → `defaults` → per-experiment entries,
//!   from JSON (or TOML) documents
//! - **Deterministic grid**: instance → iterations → ticks → drones → repetition
//! - **Process boundary**: one blocking simulator process per run; failures are recorded, never retried
//! - **Metric extraction**: labelled stdout lines parsed into named values
//! - **Reports**: a text report with per-combination averages and an optional CSV
//!
//! ## Quick Start
//!
//! ```ignore
//! use uavsweep::{PatternSet, MetricsParser};
//!
//! let parser = PatternSet::psp_uav()?;
//! let metrics = parser.parse("Urgencia acumulada: 12\n", false);
//! ```

// Re-export configuration and engine types
pub use uavsweep_cli::{
    ConfigError, ConfigSource, Experiment, ExperimentOverrides, SweepConfig, SweepDocument,
    resolve, verify_instances,
};
pub use uavsweep_cli::{
    ExecutionPlan, Executor, MetricsParser, PatternSet, ProcessOutput, RunSpec, Simulator,
    SupervisorError, build_plan, build_report, compute_averages, format_text_report,
};

// Re-export report types
pub use uavsweep_report::{
    CSV_HEADERS, CombinationAverages, CombinationKey, Metric, MetricValues, ReportMeta, ReportPaths,
    ReportSummary, RunOutcome, SweepReport, generate_csv_report, slugify,
};

/// Run the uavsweep CLI harness.
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     uavsweep::run()
/// }
/// ```
pub use uavsweep_cli::{is_interrupted, run};
