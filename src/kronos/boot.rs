use std::time::Duration;
use tracing::info;

use crate::kronos::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Ready,
    Aborted,
}

/// Give the media center time to settle before touching anything.
pub fn boot_wait(host: &dyn Host, wait: Duration) -> BootOutcome {
    info!(wait_secs = wait.as_secs_f64(), "boot wait start (abort-safe)");
    if host.wait_for_abort(wait) {
        info!("abort requested during boot wait; exiting cleanly");
        return BootOutcome::Aborted;
    }
    BootOutcome::Ready
}
