use anyhow::Result;
use std::env;
use std::path::PathBuf;

pub const ADDON_ID: &str = "service.kronos.eye";
pub const STATE_FILE_NAME: &str = "saturn_moon_status.txt";

#[derive(Debug, Clone)]
pub struct KronosPaths {
    pub kodi_home: PathBuf,
    pub data_dir: PathBuf,
    pub addon_dir: PathBuf,
    pub media_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub state_file: PathBuf,
    pub abort_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    env_non_empty(var).map(PathBuf::from).unwrap_or(fallback)
}

fn kodi_home_from_inputs(home: PathBuf, kodi_home_env: Option<&str>) -> PathBuf {
    match kodi_home_env {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => home.join(".kodi"),
    }
}

pub fn resolve_kodi_home() -> Result<PathBuf> {
    let kodi_home_env = env::var("KODI_HOME").ok();
    Ok(kodi_home_from_inputs(
        required_home_dir()?,
        kodi_home_env.as_deref(),
    ))
}

pub fn resolve_paths() -> Result<KronosPaths> {
    let kodi_home = resolve_kodi_home()?;

    let data_dir = env_or_default_path(
        "KRONOS_DATA_DIR",
        kodi_home.join("userdata").join("addon_data").join(ADDON_ID),
    );
    let addon_dir = env_or_default_path(
        "KRONOS_ADDON_DIR",
        kodi_home.join("addons").join(ADDON_ID),
    );
    let media_dir = addon_dir.join("resources").join("media");
    let logs_dir = data_dir.join("logs");
    let state_file = env_or_default_path("KRONOS_STATE_FILE", data_dir.join(STATE_FILE_NAME));
    let abort_file = env_or_default_path("KRONOS_ABORT_FILE", data_dir.join("abort"));

    Ok(KronosPaths {
        kodi_home,
        data_dir,
        addon_dir,
        media_dir,
        logs_dir,
        state_file,
        abort_file,
    })
}

impl KronosPaths {
    /// Layout rooted at `data_dir` / `addon_dir` without consulting the environment.
    pub fn rooted(data_dir: impl Into<PathBuf>, addon_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let addon_dir = addon_dir.into();
        Self {
            kodi_home: data_dir.clone(),
            media_dir: addon_dir.join("resources").join("media"),
            logs_dir: data_dir.join("logs"),
            state_file: data_dir.join(STATE_FILE_NAME),
            abort_file: data_dir.join("abort"),
            data_dir,
            addon_dir,
        }
    }
}
