//! The RPC boundary to the privileged backend process.
//!
//! The backend owns the real state (vault, live processes, persisted
//! settings) and exposes it through the request/response calls below plus
//! one push event. This trait carries no logic of its own: no retries, no
//! caching. Retry and reload policy belongs to the stores.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::account::Account;
use crate::error::Result;
use crate::instance::{ActiveInstance, InstanceClosed};
use crate::settings::AppSettings;
use crate::vault::VaultStatus;

/// Typed request/response and subscribe primitives against the backend.
///
/// Every call maps 1:1 to a named backend operation. Any backend-reported
/// fault or transport failure surfaces as `LaunchdeckError::Backend`; the
/// one domain rejection (wrong passphrase) is the `Ok(false)` arm of
/// [`Backend::unlock_vault`].
#[async_trait]
pub trait Backend: Send + Sync {
    // --- vault / session ---

    /// `get_vault_status`
    async fn vault_status(&self) -> Result<VaultStatus>;

    /// `create_vault`
    async fn create_vault(&self, passphrase: &str) -> Result<()>;

    /// `unlock_vault`. `Ok(false)` means the passphrase was rejected,
    /// distinct from a transport fault.
    async fn unlock_vault(&self, passphrase: &str) -> Result<bool>;

    /// `lock_vault`
    async fn lock_vault(&self) -> Result<()>;

    // --- accounts ---

    /// `get_accounts`
    async fn accounts(&self) -> Result<Vec<Account>>;

    /// `add_account`; returns the canonical account including
    /// backend-assigned fields.
    async fn add_account(&self, credential: &str) -> Result<Account>;

    /// `update_account`
    async fn update_account(&self, account: &Account) -> Result<()>;

    /// `delete_account`
    async fn delete_account(&self, id: &str) -> Result<()>;

    /// `export_accounts`; the blob format is backend-defined and opaque.
    async fn export_accounts(&self) -> Result<String>;

    /// `import_accounts`; returns the number of accounts imported. Merge
    /// semantics are backend-owned.
    async fn import_accounts(&self, blob: &str, merge: bool) -> Result<u32>;

    /// `clear_accounts`
    async fn clear_accounts(&self) -> Result<()>;

    // --- instances ---

    /// `get_active_instances`; the authoritative list of live processes.
    async fn active_instances(&self) -> Result<Vec<ActiveInstance>>;

    /// `launch_game`
    async fn launch_game(
        &self,
        account_id: &str,
        game_id: u64,
        job_id: Option<&str>,
    ) -> Result<ActiveInstance>;

    /// `kill_instance`
    async fn kill_instance(&self, pid: u32) -> Result<()>;

    /// `bypass_mutex`; asks the backend to relax the single-instance
    /// restriction. Returns an informational count.
    async fn bypass_mutex(&self) -> Result<u32>;

    // --- settings ---

    /// `get_settings`
    async fn settings(&self) -> Result<AppSettings>;

    /// `save_settings`
    async fn save_settings(&self, settings: &AppSettings) -> Result<()>;

    // --- push events ---

    /// Subscribes to the `instance-closed` push event. Delivery is
    /// best-effort; the poll channel is the consistency backstop.
    fn subscribe_instance_closed(&self) -> broadcast::Receiver<InstanceClosed>;
}
