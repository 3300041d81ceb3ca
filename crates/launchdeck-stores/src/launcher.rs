//! Active-instance tracker.
//!
//! Live game processes terminate outside this system's control and are
//! observed through two partially-overlapping channels:
//!
//! - the `instance-closed` push event, which removes the matching pid
//!   immediately (low latency, best-effort delivery);
//! - a periodic poll that replaces local state wholesale with the backend's
//!   authoritative list (the consistency backstop).
//!
//! Replacement, not diffing, is the merge strategy for the poll: whatever
//! the backend reports is truth, and diffing a stale local delta against a
//! newer snapshot invites races. Removing a pid that is already gone is a
//! no-op on both channels, so the two channels converge without duplicate
//! removals. A pid that reappears after removal is a new instance; the OS
//! recycles process ids.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use launchdeck_core::backend::Backend;
use launchdeck_core::error::Result;
use launchdeck_core::instance::ActiveInstance;
use launchdeck_core::store::Store;

use crate::accounts::AccountRegistry;
use crate::scheduler::PollScheduler;

/// Observable tracker state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LauncherState {
    pub instances: Vec<ActiveInstance>,
    /// Account id with a launch in flight; lets the UI disable duplicate
    /// launch actions.
    pub launching: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Poll cadence for the authoritative instance list.
    pub poll_interval: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Tracks live game instances and owns the launch/kill operations.
pub struct LauncherService {
    backend: Arc<dyn Backend>,
    state: Store<LauncherState>,
    config: LauncherConfig,
    poller: PollScheduler,
    event_task: Mutex<Option<JoinHandle<()>>>,
    /// Declared post-launch side effect: reload accounts so the updated
    /// last-played timestamp shows up. Failure is logged and ignored.
    account_reload: RwLock<Option<Arc<AccountRegistry>>>,
}

impl LauncherService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_config(backend, LauncherConfig::default())
    }

    pub fn with_config(backend: Arc<dyn Backend>, config: LauncherConfig) -> Self {
        Self {
            backend,
            state: Store::new(LauncherState::default()),
            config,
            poller: PollScheduler::new(),
            event_task: Mutex::new(None),
            account_reload: RwLock::new(None),
        }
    }

    pub fn state(&self) -> &Store<LauncherState> {
        &self.state
    }

    /// Wires the post-launch account reload.
    pub fn set_account_reload(&self, registry: Arc<AccountRegistry>) {
        *self.account_reload.write().unwrap() = Some(registry);
    }

    /// Subscribes to termination events, starts the poll backstop and
    /// performs one authoritative refresh. Call once at application start.
    pub async fn init(&self) {
        self.spawn_event_listener();
        self.start_polling();
        self.refresh().await;
    }

    /// Replaces local instances with the backend's authoritative list.
    /// Faults are logged, never surfaced: the next poll retries anyway.
    pub async fn refresh(&self) {
        match self.backend.active_instances().await {
            Ok(instances) => {
                self.state.update(|s| s.instances = instances);
            }
            Err(err) => {
                tracing::warn!("[Launcher] Instance refresh failed: {}", err);
            }
        }
    }

    /// Launches a game for an account.
    ///
    /// The `launching` marker is set before the call and cleared
    /// unconditionally on completion. On fault no instance is added.
    pub async fn launch(
        &self,
        account_id: &str,
        game_id: u64,
        job_id: Option<&str>,
    ) -> Result<ActiveInstance> {
        self.state.update(|s| {
            s.launching = Some(account_id.to_string());
            s.error = None;
        });

        match self.backend.launch_game(account_id, game_id, job_id).await {
            Ok(instance) => {
                tracing::info!(
                    "[Launcher] Launched game {} for {} (pid {})",
                    game_id,
                    account_id,
                    instance.pid
                );
                self.state.update(|s| {
                    s.launching = None;
                    // At most one instance per pid.
                    s.instances.retain(|i| i.pid != instance.pid);
                    s.instances.push(instance.clone());
                });
                self.reload_accounts_in_background();
                Ok(instance)
            }
            Err(err) => {
                tracing::warn!("[Launcher] Launch for {} failed: {}", account_id, err);
                self.state.update(|s| {
                    s.launching = None;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Kills a running instance.
    ///
    /// Backend first: on success the instance is removed locally without
    /// waiting for the termination event; on fault local state is left
    /// untouched since the process may still be alive.
    pub async fn kill(&self, pid: u32) -> bool {
        match self.backend.kill_instance(pid).await {
            Ok(()) => {
                tracing::info!("[Launcher] Killed instance {}", pid);
                self.state.update(|s| s.instances.retain(|i| i.pid != pid));
                true
            }
            Err(err) => {
                tracing::warn!("[Launcher] Kill of {} failed: {}", pid, err);
                self.state.update(|s| s.error = Some(err.to_string()));
                false
            }
        }
    }

    /// Asks the backend to relax the single-instance restriction. Purely
    /// delegated; no local state change.
    pub async fn bypass_mutex(&self) -> u32 {
        match self.backend.bypass_mutex().await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!("[Launcher] Mutex bypass failed: {}", err);
                0
            }
        }
    }

    /// Whether any tracked instance references the account. Multi-instance
    /// policy is backend-enforced, so more than one may match.
    pub fn is_running(&self, account_id: &str) -> bool {
        self.state
            .read()
            .instances
            .iter()
            .any(|i| i.account_id == account_id)
    }

    pub fn instance_for(&self, account_id: &str) -> Option<ActiveInstance> {
        self.state
            .read()
            .instances
            .into_iter()
            .find(|i| i.account_id == account_id)
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Stops the poll task and the event listener. Required on application
    /// teardown.
    pub fn shutdown(&self) {
        self.poller.stop();
        if let Some(task) = self.event_task.lock().unwrap().take() {
            task.abort();
        }
    }

    fn spawn_event_listener(&self) {
        let mut guard = self.event_task.lock().unwrap();
        if guard.is_some() {
            return;
        }

        let mut rx = self.backend.subscribe_instance_closed();
        let state = self.state.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        tracing::debug!("[Launcher] Instance {} closed", event.pid);
                        // No-op if the poll already removed this pid.
                        state.update(|s| s.instances.retain(|i| i.pid != event.pid));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // The poll backstop will reconcile whatever we missed.
                        tracing::warn!("[Launcher] Missed {} close events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    fn start_polling(&self) {
        let state = self.state.clone();
        let backend = Arc::clone(&self.backend);
        let poll_state = self.state.clone();
        self.poller.start(
            self.config.poll_interval,
            move || !state.read().instances.is_empty(),
            move || {
                let backend = Arc::clone(&backend);
                let state = poll_state.clone();
                async move {
                    match backend.active_instances().await {
                        Ok(instances) => state.update(|s| s.instances = instances),
                        Err(err) => {
                            tracing::warn!("[Launcher] Poll failed: {}", err);
                        }
                    }
                }
            },
        );
    }

    fn reload_accounts_in_background(&self) {
        let Some(registry) = self.account_reload.read().unwrap().clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = registry.load().await {
                // Non-critical freshness refresh.
                tracing::debug!("[Launcher] Post-launch account reload failed: {}", err);
            }
        });
    }
}

impl Drop for LauncherService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
