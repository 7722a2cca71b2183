use anyhow::Result;
use chrono::{Datelike, Local};

use crate::commands::CommandReport;
use crate::kronos::config::{load_config, resolve_config_path};
use crate::kronos::moon::{is_full_moon, moon_age, next_full_moon};
use crate::kronos::notify::{FULLMOON_ICON, SATURN_ICON, icon_path};
use crate::kronos::paths::resolve_paths;
use crate::kronos::saturn::next_ingress;
use crate::kronos::state;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("status");

    report.detail(format!("kodi_home={}", paths.kodi_home.display()));
    report.detail(format!("data_dir={}", paths.data_dir.display()));
    report.detail(format!("addon_dir={}", paths.addon_dir.display()));
    report.detail(format!("state_file={}", paths.state_file.display()));
    report.detail(format!("config_file={}", resolve_config_path(&paths).display()));
    report.detail(format!("abort_file={}", paths.abort_file.display()));
    report.detail(format!("backend={}", cfg.host.backend.label()));
    report.detail(format!("boot_wait_secs={}", cfg.boot.wait_secs));

    let saved = state::load(&paths.state_file);
    if saved.is_empty() {
        report.detail("state=empty".to_string());
    }
    for (key, value) in saved.entries() {
        report.detail(format!("state.{key}={value}"));
    }

    let today = Local::now().date_naive();
    report.detail(format!("today={today}"));
    if let Some(age) = moon_age(today) {
        report.detail(format!("moon_age={age:.2}"));
    }
    report.detail(format!("full_moon_today={}", is_full_moon(today)));
    if let Some(next) = next_full_moon(today) {
        report.detail(format!("next_full_moon={next}"));
    }
    match next_ingress(today.year()) {
        Some((year, sign)) => report.detail(format!("next_saturn_ingress={year}:{sign}")),
        None => report.detail("next_saturn_ingress=none".to_string()),
    }

    for icon in [FULLMOON_ICON, SATURN_ICON] {
        let path = icon_path(&paths.media_dir, icon);
        if !path.exists() {
            report.issue(format!("missing icon ({})", path.display()));
        }
    }

    Ok(report)
}
