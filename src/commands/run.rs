use anyhow::Result;
use chrono::NaiveDate;
use tracing::warn;

use crate::commands::CommandReport;
use crate::kronos::audit;
use crate::kronos::config::{HostBackend, load_config_or_default};
use crate::kronos::host::SystemHost;
use crate::kronos::orchestrator::{RunContext, run_once};
use crate::kronos::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub boot_wait_secs: Option<u64>,
    pub dry_run: bool,
    pub date: Option<NaiveDate>,
}

fn saved_label(saved: Option<bool>) -> String {
    saved.map_or_else(|| "skipped".to_string(), |ok| ok.to_string())
}

pub fn run(opts: &RunOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut cfg = load_config_or_default(&paths);
    if let Some(secs) = opts.boot_wait_secs {
        cfg.boot.wait_secs = secs;
    }
    if opts.dry_run {
        cfg.host.backend = HostBackend::Log;
    }

    let mut report = CommandReport::new("run");
    report.detail(format!("state_file={}", paths.state_file.display()));
    report.detail(format!("backend={}", cfg.host.backend.label()));

    let host = SystemHost::new(&paths, &cfg);
    host.clear_stale_abort();
    let outcome = run_once(&RunContext {
        host: &host,
        paths: &paths,
        config: &cfg,
        today: opts.date,
    });

    report.detail(format!("aborted={}", outcome.aborted));
    if outcome.aborted {
        return Ok(report);
    }

    if let Some(today) = outcome.today {
        report.detail(format!("today={today}"));
    }
    report.detail(format!("moon={}", outcome.moon));
    report.detail(format!("saturn={}", outcome.saturn));
    report.detail(format!("stagger_applied={}", outcome.stagger_applied));
    report.detail(format!("state_saved={}", saved_label(outcome.saved)));

    if let Err(err) = audit::record_run(&paths.logs_dir, &outcome) {
        warn!("failed to record run history: {err:#}");
    }
    Ok(report)
}
