use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::commands::CommandReport;
use crate::kronos::moon::{is_full_moon, moon_age, next_full_moon};

pub fn run(date: Option<NaiveDate>) -> Result<CommandReport> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let mut report = CommandReport::new("phase");

    report.detail(format!("date={date}"));
    match moon_age(date) {
        Some(age) => report.detail(format!("moon_age={age:.2}")),
        None => report.issue(format!("moon age could not be computed for {date}")),
    }
    report.detail(format!("full_moon={}", is_full_moon(date)));
    if let Some(next) = next_full_moon(date) {
        report.detail(format!("next_full_moon={next}"));
    }
    Ok(report)
}
