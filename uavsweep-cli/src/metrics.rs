//! Metrics Parser
//!
//! Extracts numeric results from the simulator's stdout. Each metric is a
//! labelled line; the first match of its pattern wins and a pattern that
//! does not match simply leaves the metric out.

use regex::Regex;
use uavsweep_report::{Metric, MetricValues};

/// Turns captured simulator output into metric values.
pub trait MetricsParser {
    /// Extract every metric found in `stdout`.
    fn parse(&self, stdout: &str, include_time_breakdown: bool) -> MetricValues;
}

/// Compiled label patterns, one capture group per metric value
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<(Metric, Regex)>,
}

impl PatternSet {
    /// Patterns for the labels printed by the PSP-UAV solver.
    pub fn psp_uav() -> Result<Self, regex::Error> {
        Self::from_patterns(&[
            (Metric::Urgencia, r"Urgencia acumulada:\s+(-?\d+)"),
            (
                Metric::TiempoEjecucion,
                r"Tiempo de ejecución:\s+([0-9]*\.?[0-9]+)\s+segundos",
            ),
            (Metric::Colisiones, r"Colisiones detectadas:\s+(-?\d+)"),
            (
                Metric::TiempoEvaluador,
                r"Tiempo acumulado Evaluador:\s+([0-9]*\.?[0-9]+)\s+segundos",
            ),
            (
                Metric::TiempoDecodificador,
                r"Tiempo acumulado Decodificador:\s+([0-9]*\.?[0-9]+)\s+segundos",
            ),
        ])
    }

    /// Compile a pattern set. Patterns for time-breakdown metrics only apply
    /// when the experiment asks for the breakdown.
    pub fn from_patterns(patterns: &[(Metric, &str)]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|(metric, pattern)| Ok((*metric, Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }
}

impl MetricsParser for PatternSet {
    fn parse(&self, stdout: &str, include_time_breakdown: bool) -> MetricValues {
        let active = self
            .patterns
            .iter()
            .filter(|(metric, _)| include_time_breakdown || !metric.is_time_breakdown());

        let mut values = MetricValues::new();
        for (metric, pattern) in active {
            let Some(raw) = pattern
                .captures(stdout)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
            else {
                continue;
            };

            match parse_number(raw) {
                Some(value) => {
                    values.insert(*metric, value);
                }
                None => tracing::debug!("Unparseable value for {}: {:?}", metric, raw),
            }
        }
        values
    }
}

/// Decimal text is read as a float; anything else as an integer first.
fn parse_number(raw: &str) -> Option<f64> {
    if raw.contains('.') {
        return raw.parse::<f64>().ok();
    }
    raw.parse::<i64>()
        .map(|v| v as f64)
        .ok()
        .or_else(|| raw.parse::<f64>().ok())
}
