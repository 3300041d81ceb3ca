//! Account registry.
//!
//! The backend vault is the durability authority; this registry is a cache
//! over it. `load` and `import_all` reconcile by authoritative replace.
//! `update`, `delete` and `toggle_favorite` are optimistic: the local change
//! lands before the backend confirms so the UI feels instant, and is
//! reverted to the pre-mutation snapshot if the backend faults.

use std::sync::Arc;

use launchdeck_core::account::Account;
use launchdeck_core::backend::Backend;
use launchdeck_core::error::{LaunchdeckError, Result};
use launchdeck_core::store::{Derived, Store};

/// Observable registry state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountsState {
    pub accounts: Vec<Account>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_id: Option<String>,
}

/// Cache of the vault's credential set, optimistic on writes.
pub struct AccountRegistry {
    backend: Arc<dyn Backend>,
    state: Store<AccountsState>,
}

impl AccountRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Store::new(AccountsState::default()),
        }
    }

    pub fn state(&self) -> &Store<AccountsState> {
        &self.state
    }

    /// Replaces the local set with the backend's authoritative list.
    pub async fn load(&self) -> Result<()> {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.backend.accounts().await {
            Ok(accounts) => {
                tracing::debug!("[AccountRegistry] Loaded {} accounts", accounts.len());
                self.state.update(|s| {
                    s.accounts = accounts;
                    s.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[AccountRegistry] Load failed: {}", err);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Adds an account. Pessimistic: the local set only grows once the
    /// backend returns the canonical account.
    pub async fn add(&self, credential: &str) -> Result<Account> {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.backend.add_account(credential).await {
            Ok(account) => {
                tracing::info!("[AccountRegistry] Added account {}", account.id);
                self.state.update(|s| {
                    // At most one account per id.
                    s.accounts.retain(|a| a.id != account.id);
                    s.accounts.push(account.clone());
                    s.loading = false;
                });
                Ok(account)
            }
            Err(err) => {
                tracing::warn!("[AccountRegistry] Add failed: {}", err);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Updates an account, optimistically.
    pub async fn update(&self, account: Account) -> Result<()> {
        let snapshot = self.apply_optimistic(|accounts| {
            if let Some(existing) = accounts.iter_mut().find(|a| a.id == account.id) {
                *existing = account.clone();
            }
        });

        match self.backend.update_account(&account).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(
                    "[AccountRegistry] Update of {} failed, reverting: {}",
                    account.id,
                    err
                );
                self.revert(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Deletes an account, optimistically.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let snapshot = self.apply_optimistic(|accounts| accounts.retain(|a| a.id != id));

        match self.backend.delete_account(id).await {
            Ok(()) => {
                tracing::info!("[AccountRegistry] Deleted account {}", id);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    "[AccountRegistry] Delete of {} failed, reverting: {}",
                    id,
                    err
                );
                self.revert(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Flips an account's favorite flag, optimistically.
    pub async fn toggle_favorite(&self, id: &str) -> Result<()> {
        let toggled = {
            let state = self.state.read();
            let account = state
                .accounts
                .iter()
                .find(|a| a.id == id)
                .ok_or_else(|| LaunchdeckError::not_found("account", id))?;
            let mut toggled = account.clone();
            toggled.is_favorite = !toggled.is_favorite;
            toggled
        };

        let snapshot = self.apply_optimistic(|accounts| {
            if let Some(existing) = accounts.iter_mut().find(|a| a.id == id) {
                *existing = toggled.clone();
            }
        });

        match self.backend.update_account(&toggled).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(
                    "[AccountRegistry] Favorite toggle for {} failed, reverting: {}",
                    id,
                    err
                );
                self.revert(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Exports all accounts as a backend-defined opaque blob.
    pub async fn export_all(&self) -> Result<String> {
        self.backend.export_accounts().await
    }

    /// Imports accounts from a blob and reloads from backend truth, since
    /// merge semantics are backend-owned.
    pub async fn import_all(&self, blob: &str, merge: bool) -> Result<u32> {
        let count = match self.backend.import_accounts(blob, merge).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!("[AccountRegistry] Import failed: {}", err);
                self.state.update(|s| s.error = Some(err.to_string()));
                return Err(err);
            }
        };
        tracing::info!("[AccountRegistry] Imported {} accounts", count);
        self.load().await?;
        Ok(count)
    }

    /// Deletes every account.
    pub async fn clear_all(&self) -> Result<()> {
        match self.backend.clear_accounts().await {
            Ok(()) => {
                self.state.update(|s| s.accounts.clear());
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[AccountRegistry] Clear failed: {}", err);
                self.state.update(|s| s.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn select(&self, id: Option<String>) {
        self.state.update(|s| s.selected_id = id);
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    pub fn reset(&self) {
        self.state.set(AccountsState::default());
    }

    /// Read-only projection of the favorited accounts.
    pub fn favorites(&self) -> Derived<Vec<Account>> {
        self.state
            .derive(|s| s.accounts.iter().filter(|a| a.is_favorite).cloned().collect())
    }

    /// Read-only projection of the account count.
    pub fn count(&self) -> Derived<usize> {
        self.state.derive(|s| s.accounts.len())
    }

    /// Applies a local mutation and returns the pre-mutation snapshot for
    /// a potential revert.
    fn apply_optimistic(&self, mutate: impl FnOnce(&mut Vec<Account>)) -> Vec<Account> {
        let mut snapshot = Vec::new();
        self.state.update(|s| {
            snapshot = s.accounts.clone();
            s.error = None;
            mutate(&mut s.accounts);
        });
        snapshot
    }

    fn revert(&self, snapshot: Vec<Account>, err: &LaunchdeckError) {
        let message = err.to_string();
        self.state.update(|s| {
            s.accounts = snapshot;
            s.error = Some(message);
        });
    }
}
