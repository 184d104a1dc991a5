//! Report Metadata Collection
//!
//! Collects the context printed in a report header: harness version, local
//! timestamp, simulator path, git commit of the project root, and host
//! OS/architecture. Git information degrades to `None` outside a repository
//! or when `git` is unavailable.

use chrono::Local;
use std::path::Path;
use uavsweep_report::ReportMeta;

/// Build report metadata for a sweep of `binary` rooted at `root`
pub fn build_report_meta(binary: &Path, root: &Path) -> ReportMeta {
    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Local::now(),
        binary: binary.to_path_buf(),
        git_commit: git_commit(root),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

/// Current commit of the repository containing `root`
fn git_commit(root: &Path) -> Option<String> {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let commit = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!commit.is_empty()).then_some(commit)
}
