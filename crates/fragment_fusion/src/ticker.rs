//! Periodic elapsed-time publication for a running puzzle clock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use fragment_puzzle::Clock;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument};

/// Publishes `now - started_at` over a watch channel at a fixed period.
///
/// The cancel flag is checked under the same lock that guards each
/// publication, so once [`ElapsedTicker::cancel`] returns no further value
/// is sent. Dropping the ticker cancels it.
#[derive(Debug)]
pub struct ElapsedTicker {
    receiver: watch::Receiver<Duration>,
    cancelled: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl ElapsedTicker {
    /// Spawns a ticker on the current tokio runtime.
    ///
    /// Returns `None` outside a runtime; callers then compute elapsed time
    /// on demand.
    #[instrument(skip(clock))]
    pub fn start<C>(clock: C, started_at: Instant, resolution: Duration) -> Option<Self>
    where
        C: Clock + Clone + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            debug!("No tokio runtime; ticker not started");
            return None;
        };

        let (sender, receiver) = watch::channel(clock.now().saturating_duration_since(started_at));
        let cancelled = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&cancelled);
        let period = resolution.max(Duration::from_millis(1));

        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let elapsed = clock.now().saturating_duration_since(started_at);
                let stop = {
                    let cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
                    *cancelled || sender.send(elapsed).is_err()
                };
                if stop {
                    break;
                }
            }
        });

        debug!(?period, "Ticker started");
        Some(Self {
            receiver,
            cancelled,
            task: Some(task),
        })
    }

    /// Returns a receiver for elapsed-time updates.
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.receiver.clone()
    }

    /// Returns the most recently published elapsed time.
    pub fn latest(&self) -> Duration {
        *self.receiver.borrow()
    }

    /// Whether [`ElapsedTicker::cancel`] has run.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops publication. Idempotent.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Ticker cancelled");
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
