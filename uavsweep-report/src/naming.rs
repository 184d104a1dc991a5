//! Output File Naming
//!
//! Reports are written as `run_<stamp>_<slug>.txt`, with the CSV export next
//! to it under the same stem.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Slug used when an experiment name has no alphanumeric characters
pub const FALLBACK_SLUG: &str = "exp";

/// Timestamp format embedded in file names
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Normalize an experiment name for use in a file name.
///
/// Runs of characters outside `[A-Za-z0-9]` collapse to a single `_`,
/// leading/trailing underscores are trimmed and the result is lowercased.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Paths of the artifacts written for one experiment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub csv: PathBuf,
}

impl ReportPaths {
    /// Derive report paths from the output directory, a timestamp and the experiment name.
    pub fn new(output_dir: &Path, timestamp: &DateTime<Local>, experiment: &str) -> Self {
        let stem = format!(
            "run_{}_{}",
            timestamp.format(FILE_STAMP_FORMAT),
            slugify(experiment)
        );
        let text = output_dir.join(format!("{}.txt", stem));
        let csv = text.with_extension("csv");
        Self { text, csv }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Exp #1 (fast)"), "exp_1_fast");
        assert_eq!(slugify("default"), "default");
        assert_eq!(slugify("__Drones--3__"), "drones_3");
        assert_eq!(slugify("Iteración alta"), "iteraci_n_alta");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify(""), "exp");
        assert_eq!(slugify("#!?"), "exp");
    }

    #[test]
    fn test_report_paths() {
        let ts = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let paths = ReportPaths::new(Path::new("/tmp/out"), &ts, "Exp #1 (fast)");
        assert_eq!(
            paths.text,
            PathBuf::from("/tmp/out/run_20260304_050607_exp_1_fast.txt")
        );
        assert_eq!(
            paths.csv,
            PathBuf::from("/tmp/out/run_20260304_050607_exp_1_fast.csv")
        );
    }
}
