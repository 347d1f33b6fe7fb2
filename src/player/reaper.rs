//! Delayed, best-effort deletion of playback artifacts.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

/// Deletes `path` after `delay` on a detached task.
///
/// Fire-and-forget: the task holds nothing but the path, so destination
/// teardown never waits on it. A missing file is a non-event; any other
/// failure is logged and swallowed; reaping must never stall playback.
pub fn schedule_removal(path: PathBuf, delay: Duration) {
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(artifact = %path.display(), "removed artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(artifact = %path.display(), "artifact already gone");
            }
            Err(e) => warn!(artifact = %path.display(), "failed to remove artifact: {e}"),
        }
    });
}
