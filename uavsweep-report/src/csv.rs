//! CSV Output
//!
//! One row per run (not per combination), fixed column order. Absent metrics
//! are written as empty cells.

use crate::metric::{Metric, format_metric_value};
use crate::report::RunOutcome;

/// Column headers, in output order
pub const CSV_HEADERS: [&str; 14] = [
    "experiment",
    "instance",
    "instance_stem",
    "instance_variant",
    "drones",
    "iterations",
    "ticks",
    "repeat",
    "exit_code",
    "urgencia",
    "colisiones",
    "tiempo_ejecucion",
    "tiempo_evaluador",
    "tiempo_decodificador",
];

/// Generate a CSV export of every run outcome.
pub fn generate_csv_report(outcomes: &[RunOutcome]) -> String {
    let mut output = String::new();
    output.push_str(&CSV_HEADERS.join(","));
    output.push('\n');

    for o in outcomes {
        let mut row = vec![
            escape_field(&o.experiment),
            escape_field(&o.instance),
            escape_field(&o.instance_stem),
            escape_field(&o.instance_variant),
            o.drones.to_string(),
            o.iterations.to_string(),
            o.ticks.to_string(),
            o.repeat_index.to_string(),
            o.exit_code.to_string(),
        ];
        row.extend(
            Metric::ALL
                .iter()
                .map(|m| o.metric(*m).map(format_metric_value).unwrap_or_default()),
        );
        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
