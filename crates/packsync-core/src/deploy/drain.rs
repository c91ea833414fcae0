//! Graceful shutdown countdown.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::ToolError;
use crate::service::ServiceRuntime;

const TICK: Duration = Duration::from_secs(1);

/// Blocking wait primitive, injectable so tests do not sleep in real time.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub fn scheduled_message(notice_secs: u64) -> String {
    format!(
        "say Modpack upgrade scheduled in {} seconds. Get to a stopping point!",
        notice_secs
    )
}

pub const RESTART_HINT: &str = "say In ~5 minutes restart your client to pickup the changes.";

pub fn countdown_message(seconds: u64) -> String {
    format!("say Shutdown in {}", seconds_phrase(seconds))
}

/// Every 5 seconds, then every second for the final 10.
pub fn should_announce(seconds: u64) -> bool {
    seconds % 5 == 0 || seconds <= 10
}

fn seconds_phrase(seconds: u64) -> String {
    if seconds == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", seconds)
    }
}

/// Warn connected players, wait out the notice period, then stop the service.
///
/// Broadcast failures are logged and the countdown continues; only the
/// final stop result is returned. The full notice is always waited out.
pub fn drain(
    runtime: &dyn ServiceRuntime,
    name: &str,
    notice: Duration,
    sleeper: &dyn Sleeper,
) -> Result<(), ToolError> {
    let notice_secs = notice.as_secs();

    if notice_secs > 0 {
        announce(runtime, name, &scheduled_message(notice_secs));
        announce(runtime, name, RESTART_HINT);
        info!("Shutting server down in {}", seconds_phrase(notice_secs));

        for remaining in (1..notice_secs).rev() {
            sleeper.sleep(TICK);
            if should_announce(remaining) {
                announce(runtime, name, &countdown_message(remaining));
            }
            info!("Shutting server down in {}", seconds_phrase(remaining));
        }
        sleeper.sleep(TICK);
    }

    info!(service = name, "Stopping service");
    runtime.stop(name)
}

fn announce(runtime: &dyn ServiceRuntime, name: &str, command: &str) {
    if let Err(err) = runtime.exec_admin_command(name, command) {
        warn!(service = name, command, error = %err, "Failed to broadcast to players");
    }
}
