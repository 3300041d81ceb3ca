//! Transient notification queue.
//!
//! Toasts are appended in creation order and removed either by their
//! auto-dismiss timer or an explicit dismiss. Removal is keyed by id, so a
//! timer firing after a manual dismiss is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use launchdeck_core::store::Store;

/// Severity of a notification, which also picks its default lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastSeverity {
    /// Errors linger longest, warnings a bit less, the rest briefly.
    pub fn default_ttl(self) -> Duration {
        match self {
            ToastSeverity::Success => Duration::from_millis(3000),
            ToastSeverity::Error => Duration::from_millis(5000),
            ToastSeverity::Info => Duration::from_millis(3000),
            ToastSeverity::Warning => Duration::from_millis(4000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Process-unique id of the form `toast-N`.
    pub id: String,
    pub message: String,
    pub severity: ToastSeverity,
    pub ttl: Duration,
}

/// Owns the toast list and the per-toast dismiss timers.
///
/// Expiry timers capture only a handle to the observable list, so the
/// service itself need not be kept alive for queued toasts to expire.
pub struct ToastService {
    state: Store<Vec<Toast>>,
    counter: AtomicU64,
}

impl ToastService {
    pub fn new() -> Self {
        Self {
            state: Store::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> &Store<Vec<Toast>> {
        &self.state
    }

    /// Shows a toast with the severity's default lifetime. Returns its id.
    pub fn show(&self, message: impl Into<String>, severity: ToastSeverity) -> String {
        self.show_with_ttl(message, severity, severity.default_ttl())
    }

    /// Shows a toast with an explicit lifetime. A zero `ttl` means the
    /// toast never expires and must be dismissed explicitly.
    pub fn show_with_ttl(
        &self,
        message: impl Into<String>,
        severity: ToastSeverity,
        ttl: Duration,
    ) -> String {
        let id = format!("toast-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        let toast = Toast {
            id: id.clone(),
            message: message.into(),
            severity,
            ttl,
        };
        self.state.update(|toasts| toasts.push(toast));

        if !ttl.is_zero() {
            let state = self.state.clone();
            let timer_id = id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                state.update(|toasts| toasts.retain(|t| t.id != timer_id));
            });
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.show(message, ToastSeverity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.show(message, ToastSeverity::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.show(message, ToastSeverity::Info)
    }

    pub fn warning(&self, message: impl Into<String>) -> String {
        self.show(message, ToastSeverity::Warning)
    }

    /// Removes a toast by id. Safe to call for an id that already expired.
    pub fn dismiss(&self, id: &str) {
        self.state.update(|toasts| toasts.retain(|t| t.id != id));
    }

    pub fn dismiss_all(&self) {
        self.state.set(Vec::new());
    }
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new()
    }
}
