use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::error::KronosError;
use crate::kronos::paths::KronosPaths;

pub const DEFAULT_BOOT_WAIT_SECS: u64 = 60;
pub const DEFAULT_STAGGER_MS: u64 = 2_500;
pub const DEFAULT_JSONRPC_URL: &str = "http://127.0.0.1:8080/jsonrpc";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub wait_secs: u64,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            wait_secs: DEFAULT_BOOT_WAIT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub stagger_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            stagger_ms: DEFAULT_STAGGER_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostBackend {
    #[default]
    Kodi,
    Desktop,
    Log,
}

impl HostBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "kodi" => Some(Self::Kodi),
            "desktop" | "notify-send" => Some(Self::Desktop),
            "log" | "none" => Some(Self::Log),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Kodi => "kodi",
            Self::Desktop => "desktop",
            Self::Log => "log",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub backend: HostBackend,
    pub jsonrpc_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            backend: HostBackend::Kodi,
            jsonrpc_url: DEFAULT_JSONRPC_URL.to_string(),
            username: None,
            password: None,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct KronosConfig {
    pub boot: BootConfig,
    pub notify: NotifyConfig,
    pub host: HostConfig,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_optional(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

fn validate(cfg: &KronosConfig) -> Result<()> {
    if cfg.host.timeout_secs == 0 {
        return Err(anyhow!("invalid host timeout: must be >= 1 second"));
    }
    if cfg.host.backend == HostBackend::Kodi && cfg.host.jsonrpc_url.trim().is_empty() {
        return Err(anyhow!("invalid host config: jsonrpc_url is required for backend=kodi"));
    }
    Ok(())
}

pub fn resolve_config_path(paths: &KronosPaths) -> PathBuf {
    if let Ok(custom) = env::var("KRONOS_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    paths.data_dir.join("kronos.toml")
}

fn parse_file_config(path: &Path) -> Result<Option<KronosConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|err| {
        KronosError::InvalidConfig(format!("failed to read {}: {err}", path.display()))
    })?;
    let parsed: KronosConfig = toml::from_str(&raw).map_err(|err| {
        KronosError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    Ok(Some(parsed))
}

/// Apply env overrides; values that do not parse are reported and skipped.
fn apply_env_overrides(cfg: &mut KronosConfig) -> Vec<String> {
    let mut rejected = Vec::new();
    cfg.boot.wait_secs = env_or_u64("KRONOS_BOOT_WAIT_SECS", cfg.boot.wait_secs);
    cfg.notify.stagger_ms = env_or_u64("KRONOS_STAGGER_MS", cfg.notify.stagger_ms);
    let backend_raw = env_or_string("KRONOS_HOST_BACKEND", cfg.host.backend.label());
    match HostBackend::parse(&backend_raw) {
        Some(backend) => cfg.host.backend = backend,
        None => rejected.push(format!(
            "invalid host backend `{backend_raw}`: use `kodi`, `desktop`, or `log`"
        )),
    }
    cfg.host.jsonrpc_url = env_or_string("KODI_JSONRPC_URL", &cfg.host.jsonrpc_url);
    cfg.host.username = env_or_optional("KODI_USERNAME", cfg.host.username.take());
    cfg.host.password = env_or_optional("KODI_PASSWORD", cfg.host.password.take());
    rejected
}

/// Strict load used by diagnostics: any bad file, env value, or setting is an error.
pub fn load_config(paths: &KronosPaths) -> Result<KronosConfig> {
    let mut cfg = parse_file_config(&resolve_config_path(paths))?.unwrap_or_default();
    if let Some(problem) = apply_env_overrides(&mut cfg).into_iter().next() {
        return Err(anyhow!(problem));
    }
    validate(&cfg)?;
    Ok(cfg)
}

/// Load for the notification run, which must not stop on a bad setting.
///
/// A broken or invalid file falls back to defaults; env overrides that parse
/// are still applied on top.
pub fn load_config_or_default(paths: &KronosPaths) -> KronosConfig {
    let path = resolve_config_path(paths);
    let mut cfg = match parse_file_config(&path) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(err) => {
            error!(path = %path.display(), "config unusable, using defaults: {err:#}");
            KronosConfig::default()
        }
    };
    if let Err(err) = validate(&cfg) {
        error!(path = %path.display(), "config rejected, using defaults: {err:#}");
        cfg = KronosConfig::default();
    }
    for problem in apply_env_overrides(&mut cfg) {
        error!("ignoring env override: {problem}");
    }
    if let Err(err) = validate(&cfg) {
        error!("env overrides rejected, using defaults: {err:#}");
        cfg = KronosConfig::default();
    }
    cfg
}
