use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::error::KronosError;

pub const LAST_FULLMOON_KEY: &str = "last_fullmoon";
pub const LAST_SATURN_YEAR_KEY: &str = "last_saturn_year";

/// Persisted notification bookkeeping.
///
/// Only two keys are interpreted; anything else found on disk is carried
/// through untouched and written back on the next save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    entries: Map<String, Value>,
}

fn type_name(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

impl NotificationState {
    pub fn from_entries(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_fullmoon(&self) -> Result<Option<&str>, KronosError> {
        match self.entries.get(LAST_FULLMOON_KEY) {
            None => Ok(None),
            Some(Value::String(raw)) => Ok(Some(raw.as_str())),
            Some(other) => Err(KronosError::MalformedState {
                key: LAST_FULLMOON_KEY,
                expected: "ISO date string",
                found: type_name(other),
            }),
        }
    }

    pub fn set_last_fullmoon(&mut self, date: NaiveDate) {
        self.entries
            .insert(LAST_FULLMOON_KEY.to_string(), Value::String(date.to_string()));
    }

    pub fn last_saturn_year(&self) -> Result<Option<i64>, KronosError> {
        match self.entries.get(LAST_SATURN_YEAR_KEY) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| KronosError::MalformedState {
                    key: LAST_SATURN_YEAR_KEY,
                    expected: "integer year",
                    found: type_name(value),
                }),
        }
    }

    pub fn set_last_saturn_year(&mut self, year: i32) {
        self.entries
            .insert(LAST_SATURN_YEAR_KEY.to_string(), Value::from(year));
    }
}

fn read_state(file: &Path) -> Result<NotificationState> {
    let raw =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} as JSON", file.display()))?;
    match parsed {
        Value::Object(entries) => Ok(NotificationState::from_entries(entries)),
        other => anyhow::bail!(
            "state file {} holds a {} instead of an object",
            file.display(),
            type_name(&other)
        ),
    }
}

/// Load prior state, degrading to an empty state on any failure.
pub fn load(file: &Path) -> NotificationState {
    if !file.exists() {
        return NotificationState::default();
    }
    match read_state(file) {
        Ok(state) => state,
        Err(err) => {
            error!(path = %file.display(), "load state failed, starting fresh: {err:#}");
            NotificationState::default()
        }
    }
}

pub fn ensure_state_dir(file: &Path) {
    let Some(parent) = file.parent() else {
        return;
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return;
    }
    if let Err(err) = fs::create_dir_all(parent) {
        error!(dir = %parent.display(), "failed to ensure data dir: {err}");
    }
}

/// Atomically replace `file` with the serialized state.
///
/// The bytes go to a sibling temp file which is synced before being renamed
/// over the target. A temp file left behind by a failed write is removed when
/// it is dropped.
pub fn save(file: &Path, state: &NotificationState) -> Result<()> {
    let parent = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    serde_json::to_writer(&mut temp, &state.entries)?;
    temp.flush()?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("failed to sync {}", temp.path().display()))?;

    temp.persist(file).map_err(|e| {
        anyhow::anyhow!(
            "failed persisting state atomically to {}: {}",
            file.display(),
            e.error
        )
    })?;
    Ok(())
}

pub fn save_or_log(file: &Path, state: &NotificationState) -> bool {
    match save(file, state) {
        Ok(()) => {
            info!(path = %file.display(), "state saved atomically");
            true
        }
        Err(err) => {
            error!(path = %file.display(), "save state failed: {err:#}");
            false
        }
    }
}
