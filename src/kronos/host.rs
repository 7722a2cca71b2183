use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::KronosError;
use crate::kronos::config::{HostBackend, KronosConfig};
use crate::kronos::kodi::KodiClient;
use crate::kronos::paths::KronosPaths;

const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);
const NOTIFY_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub icon_path: PathBuf,
    pub display_time_ms: u64,
}

/// Services provided by the media center the add-on runs inside.
pub trait Host {
    /// Block for up to `timeout`; `true` means the host asked us to stop.
    fn wait_for_abort(&self, timeout: Duration) -> bool;

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn show_notification(&self, toast: &Toast) -> Result<()>;
}

enum Notifier {
    Kodi(KodiClient),
    Desktop,
    Log,
}

/// The production host: abort via marker file, toasts via the configured backend.
pub struct SystemHost {
    abort_file: PathBuf,
    notifier: Notifier,
}

impl SystemHost {
    pub fn new(paths: &KronosPaths, cfg: &KronosConfig) -> Self {
        let notifier = match cfg.host.backend {
            HostBackend::Kodi => Notifier::Kodi(KodiClient::from_config(&cfg.host)),
            HostBackend::Desktop => Notifier::Desktop,
            HostBackend::Log => Notifier::Log,
        };
        Self {
            abort_file: paths.abort_file.clone(),
            notifier,
        }
    }

    /// Drop an abort marker left by an earlier run so it cannot cancel this one.
    pub fn clear_stale_abort(&self) {
        match fs::remove_file(&self.abort_file) {
            Ok(()) => info!(path = %self.abort_file.display(), "removed stale abort marker"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                path = %self.abort_file.display(),
                "failed to remove stale abort marker: {err}"
            ),
        }
    }

    fn abort_requested(&self) -> bool {
        self.abort_file.exists()
    }
}

impl Host for SystemHost {
    fn wait_for_abort(&self, timeout: Duration) -> bool {
        let started = Instant::now();
        loop {
            if self.abort_requested() {
                return true;
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return false;
            }
            thread::sleep(ABORT_POLL_INTERVAL.min(timeout - elapsed));
        }
    }

    fn show_notification(&self, toast: &Toast) -> Result<()> {
        match &self.notifier {
            Notifier::Kodi(client) => client.show_notification(toast),
            Notifier::Desktop => notify_send(toast),
            Notifier::Log => {
                info!(
                    title = %toast.title,
                    text = %toast.message,
                    icon = %toast.icon_path.display(),
                    "toast (log backend)"
                );
                Ok(())
            }
        }
    }
}

fn notify_send(toast: &Toast) -> Result<()> {
    let bin = which::which("notify-send").context("notify-send not in PATH")?;
    let mut cmd = Command::new(&bin);
    cmd.arg(format!("--expire-time={}", toast.display_time_ms))
        .arg(format!("--icon={}", toast.icon_path.display()))
        .arg(&toast.title)
        .arg(&toast.message);
    let out = output_within(&mut cmd, NOTIFY_SEND_TIMEOUT)?;
    if !out.status.success() {
        return Err(KronosError::Notification(format!(
            "notify-send exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        ))
        .into());
    }
    Ok(())
}

/// Run `cmd` with captured output, killing it once `limit` has passed.
fn output_within(cmd: &mut Command, limit: Duration) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;
    let deadline = Instant::now() + limit;
    while child.try_wait()?.is_none() {
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(KronosError::Notification(format!(
                "{program} did not finish within {}ms",
                limit.as_millis()
            ))
            .into());
        }
        thread::sleep(CHILD_POLL_INTERVAL);
    }
    Ok(child.wait_with_output()?)
}

#[cfg(test)]
mod tests {
    use super::{Host, SystemHost, Toast};
    use crate::kronos::config::{HostBackend, KronosConfig};
    use crate::kronos::paths::KronosPaths;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn log_host(paths: &KronosPaths) -> SystemHost {
        let mut cfg = KronosConfig::default();
        cfg.host.backend = HostBackend::Log;
        SystemHost::new(paths, &cfg)
    }

    #[test]
    fn wait_elapses_without_marker() {
        let tmp = tempdir().expect("tempdir");
        let paths = KronosPaths::rooted(tmp.path(), tmp.path().join("addon"));
        let host = log_host(&paths);
        let started = Instant::now();
        assert!(!host.wait_for_abort(Duration::from_millis(250)));
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn pending_marker_aborts_immediately() {
        let tmp = tempdir().expect("tempdir");
        let paths = KronosPaths::rooted(tmp.path(), tmp.path().join("addon"));
        fs::write(&paths.abort_file, "").expect("marker");
        let host = log_host(&paths);
        assert!(host.wait_for_abort(Duration::from_secs(30)));
        assert!(host.wait_for_abort(Duration::ZERO));
    }

    #[test]
    fn stale_marker_is_cleared() {
        let tmp = tempdir().expect("tempdir");
        let paths = KronosPaths::rooted(tmp.path(), tmp.path().join("addon"));
        fs::write(&paths.abort_file, "").expect("marker");
        let host = log_host(&paths);
        host.clear_stale_abort();
        assert!(!paths.abort_file.exists());
        assert!(!host.wait_for_abort(Duration::ZERO));
    }

    #[test]
    fn log_backend_always_succeeds() {
        let tmp = tempdir().expect("tempdir");
        let paths = KronosPaths::rooted(tmp.path(), tmp.path().join("addon"));
        let host = log_host(&paths);
        let toast = Toast {
            title: "t".to_string(),
            message: "m".to_string(),
            icon_path: PathBuf::from("/nowhere.png"),
            display_time_ms: 10_000,
        };
        assert!(host.show_notification(&toast).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn child_output_is_captured() {
        let mut cmd = std::process::Command::new("sh");
        cmd.args(["-c", "printf toast; printf oops >&2"]);
        let out = super::output_within(&mut cmd, Duration::from_secs(5)).expect("run");
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), "toast");
        assert_eq!(String::from_utf8_lossy(&out.stderr), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn slow_child_is_killed() {
        let mut cmd = std::process::Command::new("sh");
        cmd.args(["-c", "sleep 5"]);
        let started = Instant::now();
        let err = super::output_within(&mut cmd, Duration::from_millis(200)).expect_err("deadline");
        assert!(err.to_string().contains("did not finish"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
