//! Session state machine over the vault.
//!
//! The vault gates every other operation: accounts and instances are only
//! reachable while it is unlocked. This service does not re-validate that
//! precondition on behalf of other stores; the backend enforces it
//! authoritatively and returns a fault if violated.

use std::sync::Arc;

use launchdeck_core::backend::Backend;
use launchdeck_core::error::Result;
use launchdeck_core::store::Store;
use launchdeck_core::vault::{VaultState, VaultStatus};

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub status: VaultState,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        // The application boots straight into a status check, so the
        // initial state reads as loading until that first check resolves.
        Self {
            status: VaultState::Unknown,
            loading: true,
            error: None,
        }
    }
}

/// Tracks vault existence and lock state.
///
/// Transitions:
/// - `check_status`: any state, from an authoritative backend read.
///   Idempotent.
/// - `create_vault`: `NoVault` -> `Unlocked` on success.
/// - `unlock`: `Locked` -> `Unlocked` on success; a rejected passphrase
///   leaves the state `Locked` and records [`AuthService::INCORRECT_PASSPHRASE`].
/// - `lock`: `Unlocked` -> `Locked`, only once the backend confirms. Acting
///   on a stale unlocked view after a backend-side lock is a security
///   hazard, so there is no optimism here.
pub struct AuthService {
    backend: Arc<dyn Backend>,
    state: Store<AuthState>,
}

impl AuthService {
    /// Message recorded when the backend rejects a passphrase, distinct
    /// from any transport fault.
    pub const INCORRECT_PASSPHRASE: &'static str = "Incorrect passphrase";

    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Store::new(AuthState::default()),
        }
    }

    pub fn state(&self) -> &Store<AuthState> {
        &self.state
    }

    /// Reads the authoritative vault status and updates the session state.
    pub async fn check_status(&self) -> Result<VaultStatus> {
        self.state.update(|s| s.loading = true);
        match self.backend.vault_status().await {
            Ok(status) => {
                let next = VaultState::from_status(status);
                self.state.update(|s| {
                    s.status = next;
                    s.loading = false;
                });
                Ok(status)
            }
            Err(err) => {
                tracing::warn!("[AuthService] Vault status check failed: {}", err);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Creates a new vault and unlocks it. Pessimistic: local state only
    /// changes after the backend confirms.
    pub async fn create_vault(&self, passphrase: &str) -> Result<()> {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.backend.create_vault(passphrase).await {
            Ok(()) => {
                tracing::info!("[AuthService] Vault created");
                self.state.update(|s| {
                    s.status = VaultState::Unlocked;
                    s.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[AuthService] Vault creation failed: {}", err);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Attempts to unlock the vault.
    ///
    /// `Ok(false)` is the domain rejection (wrong passphrase): the state
    /// stays `Locked` and the distinct message is recorded. A transport
    /// fault is returned as `Err` with a generic message recorded.
    pub async fn unlock(&self, passphrase: &str) -> Result<bool> {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.backend.unlock_vault(passphrase).await {
            Ok(true) => {
                self.state.update(|s| {
                    s.status = VaultState::Unlocked;
                    s.loading = false;
                });
                Ok(true)
            }
            Ok(false) => {
                tracing::debug!("[AuthService] Passphrase rejected");
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(Self::INCORRECT_PASSPHRASE.to_string());
                });
                Ok(false)
            }
            Err(err) => {
                tracing::warn!("[AuthService] Unlock failed: {}", err);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Locks the vault once the backend confirms.
    pub async fn lock(&self) -> Result<()> {
        match self.backend.lock_vault().await {
            Ok(()) => {
                tracing::info!("[AuthService] Vault locked");
                self.state.update(|s| s.status = VaultState::Locked);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[AuthService] Lock failed: {}", err);
                self.state.update(|s| s.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;

    #[tokio::test]
    async fn check_status_is_idempotent() {
        let backend = MockBackend::new();
        backend.set_vault(true, false);
        let auth = AuthService::new(backend.clone());

        auth.check_status().await.unwrap();
        let first = auth.state().read();
        auth.check_status().await.unwrap();
        let second = auth.state().read();

        assert_eq!(first.status, VaultState::Locked);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn create_vault_unlocks_on_success() {
        let backend = MockBackend::new();
        let auth = AuthService::new(backend.clone());

        auth.check_status().await.unwrap();
        assert_eq!(auth.state().read().status, VaultState::NoVault);

        auth.create_vault("hunter2").await.unwrap();
        assert_eq!(auth.state().read().status, VaultState::Unlocked);
    }

    #[tokio::test]
    async fn create_vault_fault_stays_put() {
        let backend = MockBackend::new();
        backend.fail("create_vault");
        let auth = AuthService::new(backend.clone());
        auth.check_status().await.unwrap();

        let result = auth.create_vault("hunter2").await;
        assert!(result.is_err());

        let state = auth.state().read();
        assert_eq!(state.status, VaultState::NoVault);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn wrong_passphrase_is_a_domain_rejection() {
        let backend = MockBackend::new();
        backend.set_vault(true, false);
        backend.set_passphrase("right");
        let auth = AuthService::new(backend.clone());
        auth.check_status().await.unwrap();

        let unlocked = auth.unlock("wrong").await.unwrap();
        assert!(!unlocked);

        let state = auth.state().read();
        assert_eq!(state.status, VaultState::Locked);
        assert_eq!(
            state.error.as_deref(),
            Some(AuthService::INCORRECT_PASSPHRASE)
        );
    }

    #[tokio::test]
    async fn unlock_transport_fault_records_generic_error() {
        let backend = MockBackend::new();
        backend.set_vault(true, false);
        backend.fail("unlock_vault");
        let auth = AuthService::new(backend.clone());
        auth.check_status().await.unwrap();

        let result = auth.unlock("right").await;
        assert!(result.is_err());

        let state = auth.state().read();
        assert_eq!(state.status, VaultState::Locked);
        assert_ne!(
            state.error.as_deref(),
            Some(AuthService::INCORRECT_PASSPHRASE)
        );
    }

    #[tokio::test]
    async fn unlock_success_transitions_to_unlocked() {
        let backend = MockBackend::new();
        backend.set_vault(true, false);
        backend.set_passphrase("right");
        let auth = AuthService::new(backend.clone());
        auth.check_status().await.unwrap();

        assert!(auth.unlock("right").await.unwrap());
        assert_eq!(auth.state().read().status, VaultState::Unlocked);
    }

    #[tokio::test]
    async fn lock_is_pessimistic() {
        let backend = MockBackend::new();
        backend.set_vault(true, true);
        let auth = AuthService::new(backend.clone());
        auth.check_status().await.unwrap();
        assert_eq!(auth.state().read().status, VaultState::Unlocked);

        backend.fail("lock_vault");
        assert!(auth.lock().await.is_err());
        // No local change until the backend confirms.
        assert_eq!(auth.state().read().status, VaultState::Unlocked);

        backend.succeed("lock_vault");
        auth.lock().await.unwrap();
        assert_eq!(auth.state().read().status, VaultState::Locked);
    }
}
