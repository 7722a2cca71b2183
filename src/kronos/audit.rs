use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::kronos::orchestrator::RunReport;

pub const RUN_LOG_NAME: &str = "runs.jsonl";
const RUN_LOG_ROLL_BYTES: u64 = 256 * 1024;

/// One line of the run history.
#[derive(Debug, Serialize)]
struct RunRecord {
    recorded_at: String,
    today: Option<String>,
    moon: String,
    saturn: String,
    stagger_applied: bool,
    saved: Option<bool>,
}

impl RunRecord {
    fn from_report(report: &RunReport) -> Self {
        Self {
            recorded_at: Local::now().to_rfc3339(),
            today: report.today.map(|d| d.to_string()),
            moon: report.moon.to_string(),
            saturn: report.saturn.to_string(),
            stagger_applied: report.stagger_applied,
            saved: report.saved,
        }
    }
}

pub fn run_log_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join(RUN_LOG_NAME)
}

/// Append the outcome of a completed run to `<logs_dir>/runs.jsonl`.
pub fn record_run(logs_dir: &Path, report: &RunReport) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let path = run_log_path(logs_dir);
    roll_if_full(&path);

    let mut line = serde_json::to_vec(&RunRecord::from_report(report))?;
    line.push(b'\n');
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| file.write_all(&line))
        .with_context(|| format!("failed to append to {}", path.display()))
}

// Keeps one previous generation as `runs.jsonl.old`.
fn roll_if_full(path: &Path) {
    let full = fs::metadata(path).is_ok_and(|meta| meta.len() >= RUN_LOG_ROLL_BYTES);
    if full {
        let _ = fs::rename(path, path.with_extension("jsonl.old"));
    }
}
