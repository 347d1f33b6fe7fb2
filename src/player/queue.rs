//! Per-destination playback queue and its drain task.
//!
//! One `Destination` exists per guild the relay is speaking in. Jobs are
//! played strictly in arrival order by a single long-lived drain task, so
//! no two artifacts for the same guild ever overlap; destinations are fully
//! independent of each other.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::types::GuildId;
use crate::player::reaper;
use crate::voice::gateway::VoiceConnection;

/// Idle re-check fallback when no enqueue signal arrives.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Pause between consecutive jobs of one destination.
const SETTLE_INTERVAL: Duration = Duration::from_millis(300);

/// One pending playback: which connection to speak through and what file to
/// speak. Immutable once enqueued; consumed exactly once by the drain task.
pub struct PlaybackJob {
    pub connection: Arc<dyn VoiceConnection>,
    pub artifact: PathBuf,
}

struct DestinationInner {
    jobs: VecDeque<PlaybackJob>,
    /// Connection currently bound to this destination, if any.
    connection: Option<Arc<dyn VoiceConnection>>,
    /// Connection of the job being played right now; target for `skip`.
    current: Option<Arc<dyn VoiceConnection>>,
    drain_task: Option<tokio::task::JoinHandle<()>>,
}

/// Queue state for one guild. Mutated only by `enqueue`, the drain task,
/// and teardown; the lock is never held across an await.
pub struct Destination {
    guild_id: GuildId,
    inner: Mutex<DestinationInner>,
    playing: AtomicBool,
    wake: Notify,
    cancel: CancellationToken,
    /// Grace delay between playback completion and artifact deletion.
    grace: Duration,
}

impl Destination {
    pub(crate) fn new(guild_id: GuildId, grace: Duration) -> Arc<Self> {
        Arc::new(Self {
            guild_id,
            inner: Mutex::new(DestinationInner {
                jobs: VecDeque::new(),
                connection: None,
                current: None,
                drain_task: None,
            }),
            playing: AtomicBool::new(false),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            grace,
        })
    }

    pub fn connection(&self) -> Option<Arc<dyn VoiceConnection>> {
        self.inner.lock().connection.clone()
    }

    pub fn set_connection(&self, connection: Arc<dyn VoiceConnection>) {
        self.inner.lock().connection = Some(connection);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    /// Appends a job; the first job ever also starts this destination's
    /// drain task. A job landing after teardown will never play, so its
    /// artifact goes straight to the reaper.
    pub fn enqueue(self: &Arc<Self>, job: PlaybackJob) {
        {
            let mut inner = self.inner.lock();
            if self.cancel.is_cancelled() {
                debug!(guild = %self.guild_id, "destination torn down, discarding job");
                reaper::schedule_removal(job.artifact, Duration::ZERO);
                return;
            }
            inner.jobs.push_back(job);
            if inner.drain_task.is_none() {
                inner.drain_task = Some(tokio::spawn(self.clone().drain()));
            }
        }
        self.wake.notify_one();
    }

    /// Stops the job currently mid-playback, if any. The pending `play`
    /// future resolves and the drain task advances normally (reap, settle,
    /// next job).
    pub fn skip(&self) -> bool {
        let current = self.inner.lock().current.clone();
        match current {
            Some(connection) => {
                connection.stop();
                true
            }
            None => false,
        }
    }

    /// Discards every not-yet-played job, leaving a job mid-playback
    /// untouched. Discarded artifacts will never play and are reaped
    /// immediately. Returns how many jobs were dropped.
    pub fn clear(&self) -> usize {
        let dropped: Vec<PlaybackJob> = {
            let mut inner = self.inner.lock();
            inner.jobs.drain(..).collect()
        };
        let count = dropped.len();
        for job in dropped {
            reaper::schedule_removal(job.artifact, Duration::ZERO);
        }
        count
    }

    /// Tears this destination down: stops the drain task, discards pending
    /// jobs, releases the connection. Returns whether a connection was
    /// released.
    pub(crate) async fn shutdown(&self) -> bool {
        self.cancel.cancel();
        let (connection, drain_task) = {
            let mut inner = self.inner.lock();
            (inner.connection.take(), inner.drain_task.take())
        };
        self.clear();
        self.playing.store(false, Ordering::SeqCst);
        if let Some(task) = drain_task {
            let _ = task.await;
        }
        match connection {
            Some(connection) => {
                connection.disconnect().await;
                true
            }
            None => false,
        }
    }

    async fn drain(self: Arc<Self>) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let job = self.inner.lock().jobs.pop_front();
            let Some(job) = job else {
                self.playing.store(false, Ordering::SeqCst);
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = self.wake.notified() => {}
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                }
                continue;
            };

            self.playing.store(true, Ordering::SeqCst);

            if !job.connection.is_connected() {
                debug!(guild = %self.guild_id, artifact = %job.artifact.display(),
                    "connection gone, skipping job");
                reaper::schedule_removal(job.artifact, Duration::ZERO);
                continue;
            }

            self.inner.lock().current = Some(job.connection.clone());
            let interrupted = tokio::select! {
                _ = self.cancel.cancelled() => true,
                result = job.connection.play(&job.artifact) => {
                    if let Err(e) = result {
                        warn!(guild = %self.guild_id, artifact = %job.artifact.display(),
                            "playback failed: {e}");
                    }
                    false
                }
            };
            self.inner.lock().current = None;

            // Success, player error, skip, or teardown: the artifact had its
            // one playback attempt and now ages out on the grace delay.
            reaper::schedule_removal(job.artifact, self.grace);

            if interrupted {
                break;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(SETTLE_INTERVAL) => {}
            }
        }
        self.playing.store(false, Ordering::SeqCst);
    }
}
