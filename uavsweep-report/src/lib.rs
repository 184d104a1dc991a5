#![warn(missing_docs)]
//! uavsweep Report - Run Outcomes and Exports
//!
//! Data model shared by the executor and the output writers:
//! - [`RunOutcome`] for a single simulator invocation
//! - [`CombinationAverages`] and [`SweepReport`] for one experiment
//! - CSV export ([`generate_csv_report`])
//! - Output file naming ([`ReportPaths`], [`slugify`])

mod csv;
mod metric;
mod naming;
mod report;

pub use csv::{CSV_HEADERS, generate_csv_report};
pub use metric::{Metric, MetricValues, format_metric_value};
pub use naming::{FALLBACK_SLUG, FILE_STAMP_FORMAT, ReportPaths, slugify};
pub use report::{
    CombinationAverages, CombinationKey, ReportMeta, ReportSummary, RunOutcome, SweepParameters,
    SweepReport,
};
