//! Expiry Reaper Task
//!
//! Background task, one per cache, that periodically removes expired
//! entries from every generation segment. Its interval can be changed at
//! runtime through a single-slot signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{GenerationStore, StatsRecorder, MAX_TTL};

/// Shortest period the reaper will tick at.
pub const MIN_REAP_INTERVAL: Duration = Duration::from_millis(10);

// == Reaper Handle ==
/// Owning side of a running reaper.
///
/// Dropping the handle closes the signal channel, which ends the task.
#[derive(Debug)]
pub struct ReaperHandle {
    updates: watch::Sender<Duration>,
    applied: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    // == Reconfigure ==
    /// Asks the reaper to switch to `interval` and reap right away.
    ///
    /// Never blocks. The slot holds a single value: a value that has not been
    /// picked up yet is overwritten, so only the most recent interval is
    /// guaranteed to be applied.
    pub fn reconfigure(&self, interval: Duration) {
        let previous = self.updates.send_replace(interval);
        debug!(
            "Reaper interval change requested: {:?} -> {:?}",
            previous, interval
        );
    }

    /// Period the running task is currently ticking at.
    ///
    /// Lags behind [`reconfigure`](Self::reconfigure) until the task has
    /// picked up the new value.
    pub fn applied_interval(&self) -> Duration {
        Duration::from_millis(self.applied.load(Ordering::Acquire))
    }

    /// Closes the signal channel and hands back the task for joining.
    pub fn close(self) -> JoinHandle<()> {
        let Self { updates, task, .. } = self;
        drop(updates);
        task
    }
}

// == Spawn ==
/// Spawns the reaper for one cache's store.
///
/// The first pass happens one interval after spawning.
pub fn spawn_reaper(
    class: String,
    store: Arc<RwLock<GenerationStore>>,
    stats: Arc<StatsRecorder>,
    interval: Duration,
) -> ReaperHandle {
    let (updates, mut signal) = watch::channel(interval);
    let applied = Arc::new(AtomicU64::new(0));
    let mut ticker = reap_ticker(interval, &applied);
    let task_applied = applied.clone();

    let task = tokio::spawn(async move {
        debug!(class = %class, "Starting reaper with interval {:?}", ticker.period());

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = signal.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = *signal.borrow_and_update();
                    debug!(class = %class, "Reaper interval reset to {:?}", next);
                    ticker = reap_ticker(next, &task_applied);
                }
            }

            let removed = reap(&store).await;
            stats.record_reaped(removed);
            if removed > 0 {
                info!(class = %class, "Reaper removed {} expired entries", removed);
            } else {
                debug!(class = %class, "Reaper found no expired entries");
            }
        }

        debug!(class = %class, "Reaper stopped");
    });

    ReaperHandle {
        updates,
        applied,
        task,
    }
}

// == Reap ==
/// Runs one pass under the store's write lock.
pub async fn reap(store: &RwLock<GenerationStore>) -> usize {
    store.write().await.remove_expired()
}

/// Builds the ticker for `period`, clamped to
/// [`MIN_REAP_INTERVAL`]..=[`MAX_TTL`], and publishes the clamped value.
fn reap_ticker(period: Duration, applied: &AtomicU64) -> Interval {
    let period = period.clamp(MIN_REAP_INTERVAL, MAX_TTL);
    applied.store(period.as_millis() as u64, Ordering::Release);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
