//! Stateful stores over the backend RPC boundary.
//!
//! Each store is an explicit service object constructed once at application
//! start and shared as `Arc`; none of them are global singletons, so tests
//! construct a fresh instance per case. Every store holds `Arc<dyn Backend>`
//! and exposes its state through an observable
//! [`Store`](launchdeck_core::store::Store).

pub mod accounts;
pub mod auth;
pub mod favorites;
pub mod launcher;
pub mod scheduler;
pub mod toasts;

#[cfg(test)]
mod test_support;

pub use accounts::{AccountRegistry, AccountsState};
pub use auth::{AuthService, AuthState};
pub use favorites::{FavoritesService, FavoritesState};
pub use launcher::{LauncherConfig, LauncherService, LauncherState};
pub use scheduler::PollScheduler;
pub use toasts::{Toast, ToastService, ToastSeverity};
