//! Metric Names and Values
//!
//! The simulator reports a small, fixed vocabulary of numeric results. Each
//! one is a [`Metric`] variant; a run's extracted values live in a
//! [`MetricValues`] map keyed by metric.

use std::collections::BTreeMap;
use std::fmt;

/// A named numeric result printed by the simulator.
///
/// Variant order is the order metrics are extracted and listed per run.
/// Aggregation and CSV columns use [`Metric::ALL`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Accumulated urgency of the final solution (signed integer)
    Urgencia,
    /// Wall-clock solve time in seconds
    TiempoEjecucion,
    /// Collisions detected in the decoded routes (signed integer)
    Colisiones,
    /// Accumulated evaluator time in seconds (`--times` only)
    TiempoEvaluador,
    /// Accumulated decoder time in seconds (`--times` only)
    TiempoDecodificador,
}

impl Metric {
    /// Every metric, in aggregation and CSV column order.
    pub const ALL: [Metric; 5] = [
        Metric::Urgencia,
        Metric::Colisiones,
        Metric::TiempoEjecucion,
        Metric::TiempoEvaluador,
        Metric::TiempoDecodificador,
    ];

    /// Stable snake_case name used in reports and CSV headers.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Urgencia => "urgencia",
            Metric::TiempoEjecucion => "tiempo_ejecucion",
            Metric::Colisiones => "colisiones",
            Metric::TiempoEvaluador => "tiempo_evaluador",
            Metric::TiempoDecodificador => "tiempo_decodificador",
        }
    }

    /// Whether the metric is only printed when the simulator runs with `--times`.
    pub fn is_time_breakdown(self) -> bool {
        matches!(self, Metric::TiempoEvaluador | Metric::TiempoDecodificador)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extracted metric values for one run. Missing keys mean the value was not
/// found (or the run failed); they are never filled with zero.
pub type MetricValues = BTreeMap<Metric, f64>;

/// Format a metric value with its shortest round-trip representation.
///
/// Integral values keep a trailing `.0` so counts read as `0.0`, not `0`.
pub fn format_metric_value(value: f64) -> String {
    format!("{:?}", value)
}
