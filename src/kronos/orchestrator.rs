use anyhow::{Result, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

use crate::error::KronosError;
use crate::kronos::boot::{BootOutcome, boot_wait};
use crate::kronos::config::KronosConfig;
use crate::kronos::host::Host;
use crate::kronos::moon::{is_full_moon, moon_age};
use crate::kronos::notify::{FULLMOON_ICON, SATURN_ICON, notify};
use crate::kronos::paths::KronosPaths;
use crate::kronos::saturn::ingress_sign;
use crate::kronos::state::{self, NotificationState};

pub const FULLMOON_MESSAGE: &str = "Step into the light.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Notified { delivered: bool },
    AlreadyNotified,
    NotDue,
    Failed { reason: String },
    Skipped,
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notified { delivered: true } => write!(f, "notified"),
            Self::Notified { delivered: false } => write!(f, "notified(undelivered)"),
            Self::AlreadyNotified => write!(f, "already-notified"),
            Self::NotDue => write!(f, "not-due"),
            Self::Failed { reason } => write!(f, "failed({reason})"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub aborted: bool,
    pub today: Option<NaiveDate>,
    pub moon: CheckOutcome,
    pub saturn: CheckOutcome,
    pub stagger_applied: bool,
    /// `None` when nothing changed and the write was skipped.
    pub saved: Option<bool>,
}

impl RunReport {
    fn aborted() -> Self {
        Self {
            aborted: true,
            today: None,
            moon: CheckOutcome::Skipped,
            saturn: CheckOutcome::Skipped,
            stagger_applied: false,
            saved: None,
        }
    }
}

pub struct RunContext<'a> {
    pub host: &'a dyn Host,
    pub paths: &'a KronosPaths,
    pub config: &'a KronosConfig,
    /// Pins the calendar date; the local wall clock is read after the boot wait otherwise.
    pub today: Option<NaiveDate>,
}

struct RunState {
    state: NotificationState,
    dirty: bool,
    moon_fired: bool,
    stagger_applied: bool,
}

/// A recorded period of the wrong type matches nothing, so the check fires and overwrites it.
fn recorded<T>(block: &str, value: Result<Option<T>, KronosError>) -> Option<T> {
    value.unwrap_or_else(|err| {
        error!(block, "ignoring unusable state value: {err}");
        None
    })
}

fn moon_check(ctx: &RunContext<'_>, run: &mut RunState, today: NaiveDate) -> Result<CheckOutcome> {
    let today_key = today.to_string();
    if recorded("full-moon", run.state.last_fullmoon()) == Some(today_key.as_str()) {
        info!("full moon already notified today; skipping");
        return Ok(CheckOutcome::AlreadyNotified);
    }

    let age = moon_age(today).ok_or_else(|| anyhow!("moon age undefined for {today}"))?;
    let full = is_full_moon(today);
    info!(moon_age = %format!("{age:.2}"), full, "moon phase evaluated");
    if !full {
        info!("not full moon today; no toast");
        return Ok(CheckOutcome::NotDue);
    }

    let delivered = notify(
        ctx.host,
        &ctx.paths.media_dir,
        FULLMOON_MESSAGE,
        FULLMOON_ICON,
    );
    run.state.set_last_fullmoon(today);
    run.dirty = true;
    run.moon_fired = true;
    Ok(CheckOutcome::Notified { delivered })
}

fn saturn_check(ctx: &RunContext<'_>, run: &mut RunState, year: i32) -> Result<CheckOutcome> {
    let Some(sign) = ingress_sign(year) else {
        info!(year, "no Saturn ingress configured for this year; skipping");
        return Ok(CheckOutcome::NotDue);
    };
    if recorded("saturn", run.state.last_saturn_year()) == Some(i64::from(year)) {
        info!(year, "Saturn ingress already notified this year; skipping");
        return Ok(CheckOutcome::AlreadyNotified);
    }

    if run.moon_fired {
        let stagger = Duration::from_millis(ctx.config.notify.stagger_ms);
        info!(stagger_ms = ctx.config.notify.stagger_ms, "staggering Saturn toast");
        ctx.host.sleep(stagger);
        run.stagger_applied = true;
    }

    let delivered = notify(
        ctx.host,
        &ctx.paths.media_dir,
        &format!("Saturn has entered {sign}"),
        SATURN_ICON,
    );
    run.state.set_last_saturn_year(year);
    run.dirty = true;
    Ok(CheckOutcome::Notified { delivered })
}

fn isolate(block: &str, result: Result<CheckOutcome>) -> CheckOutcome {
    result.unwrap_or_else(|err| {
        error!(block, "check failed: {err:#}");
        CheckOutcome::Failed {
            reason: format!("{err:#}"),
        }
    })
}

/// One full pass: boot wait, both checks, and at most one state write.
pub fn run_once(ctx: &RunContext<'_>) -> RunReport {
    let wait = Duration::from_secs(ctx.config.boot.wait_secs);
    if boot_wait(ctx.host, wait) == BootOutcome::Aborted {
        return RunReport::aborted();
    }

    state::ensure_state_dir(&ctx.paths.state_file);
    let mut run = RunState {
        state: state::load(&ctx.paths.state_file),
        dirty: false,
        moon_fired: false,
        stagger_applied: false,
    };

    let today = ctx.today.unwrap_or_else(|| Local::now().date_naive());
    let current_year = today.year();

    let moon = isolate("full-moon", moon_check(ctx, &mut run, today));
    let saturn = isolate("saturn", saturn_check(ctx, &mut run, current_year));

    let saved = if run.dirty {
        Some(state::save_or_log(&ctx.paths.state_file, &run.state))
    } else {
        info!("no state changes; nothing to save");
        None
    };

    RunReport {
        aborted: false,
        today: Some(today),
        moon,
        saturn,
        stagger_applied: run.stagger_applied,
        saved,
    }
}
