//! Guarded recurring-task scheduler.
//!
//! Runs an async action at a fixed interval, but only while a guard
//! predicate holds. The launcher's poll channel runs on this so the
//! invariant "no polling while idle" is testable on its own.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A start/stop lifecycle around one recurring background task.
///
/// Once stopped, a scheduler stays stopped; construct a new one to poll
/// again.
pub struct PollScheduler {
    token: CancellationToken,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the recurring task. A second call is ignored.
    ///
    /// Every `interval`, `guard` is evaluated and `action` runs only when
    /// it returns true. The first tick fires one `interval` after start.
    pub fn start<G, F, Fut>(&self, interval: Duration, guard: G, action: F)
    where
        G: Fn() -> bool + Send + Sync + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("[PollScheduler] Already running, ignoring start");
            return;
        }

        let token = self.token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval completes immediately;
            // consume it so the cadence matches the configured interval.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if guard() {
                            action().await;
                        }
                    }
                }
            }
            tracing::debug!("[PollScheduler] Stopped");
        });
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Cancels the recurring task.
    pub fn stop(&self) {
        self.token.cancel();
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
