use chrono::NaiveDate;

/// A full moon observed on 2000-01-06; every phase is measured from here.
pub const REFERENCE_FULL_MOON: (i32, u32, u32) = (2000, 1, 6);
pub const SYNODIC_MONTH_DAYS: f64 = 29.53058867;
pub const FULL_MOON_AGE_DAYS: f64 = 14.77;
pub const FULL_MOON_HALF_WINDOW_DAYS: f64 = 0.5;

fn reference_date() -> Option<NaiveDate> {
    let (year, month, day) = REFERENCE_FULL_MOON;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Days elapsed in the current synodic cycle, counted from the reference
/// epoch and normalized into `[0, SYNODIC_MONTH_DAYS)`.
///
/// Dates before the epoch wrap around with a Euclidean remainder,
/// so the age never goes negative.
pub fn moon_age(date: NaiveDate) -> Option<f64> {
    let days_passed = date.signed_duration_since(reference_date()?).num_days() as f64;
    let age = days_passed.rem_euclid(SYNODIC_MONTH_DAYS);
    age.is_finite().then_some(age)
}

/// Coarse full-moon test: the age lands within half a day of 14.77.
pub fn is_full_moon(date: NaiveDate) -> bool {
    match moon_age(date) {
        Some(age) => is_full_age(age),
        None => false,
    }
}

fn is_full_age(age: f64) -> bool {
    (age - FULL_MOON_AGE_DAYS).abs() < FULL_MOON_HALF_WINDOW_DAYS
}

pub fn next_full_moon(from: NaiveDate) -> Option<NaiveDate> {
    let horizon = SYNODIC_MONTH_DAYS.ceil() as u64 + 2;
    from.iter_days()
        .take(horizon as usize)
        .find(|date| is_full_moon(*date))
}
