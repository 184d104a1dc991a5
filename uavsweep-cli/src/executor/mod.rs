//! Sweep Executor
//!
//! Runs an experiment's plan against the simulator and turns the outcomes
//! into a report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ExecutionPlan (from planner)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  One simulator process per run, metrics parsed
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ statistics  │  Per-combination means
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  SweepReport with header metadata and summary
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Text report
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Sequential run loop with progress and interruption
//! - [`statistics`] - Grouping and averaging
//! - [`report`] - Report assembly
//! - [`formatting`] - Text report rendering
//! - [`metadata`] - Harness, git and host metadata

mod execution;
mod formatting;
mod metadata;
mod report;
mod statistics;

// Re-export public API
pub use execution::Executor;
pub use formatting::{format_summary_line, format_text_report};
pub use metadata::build_report_meta;
pub use report::build_report;
pub use statistics::compute_averages;
