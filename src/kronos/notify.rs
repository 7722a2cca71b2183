use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::kronos::host::{Host, Toast};

pub const TOAST_TITLE: &str = "[B]Kronos Eye[/B]";
pub const FULLMOON_ICON: &str = "fullmoon.png";
pub const SATURN_ICON: &str = "saturn.png";
/// How long a toast stays on screen.
pub const DISPLAY_TIME_MS: u64 = 10_000;

pub fn icon_path(media_dir: &Path, icon_name: &str) -> PathBuf {
    media_dir.join(icon_name)
}

/// Fire-and-forget toast. Host failures are logged and dropped.
pub fn notify(host: &dyn Host, media_dir: &Path, message: &str, icon_name: &str) -> bool {
    let toast = Toast {
        title: TOAST_TITLE.to_string(),
        message: message.to_string(),
        icon_path: icon_path(media_dir, icon_name),
        display_time_ms: DISPLAY_TIME_MS,
    };
    match host.show_notification(&toast) {
        Ok(()) => {
            info!(title = TOAST_TITLE, text = message, icon = icon_name, "notified");
            true
        }
        Err(err) => {
            error!(text = message, icon = icon_name, "notify error: {err:#}");
            false
        }
    }
}
