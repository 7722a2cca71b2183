use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvLoadOutcome {
    LoadedDefault,
    LoadedFallback(PathBuf),
    Missing,
}

fn fallback_dotenv_path(kodi_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    let base = kodi_home.or_else(|| home_dir.map(|home| home.join(".kodi")))?;
    Some(base.join("kronos-eye.env"))
}

pub fn load_dotenv() -> DotenvLoadOutcome {
    if dotenvy::dotenv().is_ok() {
        return DotenvLoadOutcome::LoadedDefault;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("KODI_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return DotenvLoadOutcome::Missing;
    };
    if path.is_file() && dotenvy::from_path(&path).is_ok() {
        return DotenvLoadOutcome::LoadedFallback(path);
    }

    DotenvLoadOutcome::Missing
}
