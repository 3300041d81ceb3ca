//! In-memory backend double shared by the store tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use launchdeck_core::LaunchdeckError;
use launchdeck_core::account::Account;
use launchdeck_core::backend::Backend;
use launchdeck_core::error::Result;
use launchdeck_core::instance::{ActiveInstance, InstanceClosed};
use launchdeck_core::settings::AppSettings;
use launchdeck_core::vault::VaultStatus;

/// Scriptable [`Backend`] with per-operation fault injection and a call log.
pub struct MockBackend {
    vault: Mutex<VaultStatus>,
    passphrase: Mutex<String>,
    accounts: Mutex<Vec<Account>>,
    staged_import: Mutex<Vec<Account>>,
    instances: Mutex<Vec<ActiveInstance>>,
    settings: Mutex<AppSettings>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    next_pid: AtomicU32,
    closed_tx: broadcast::Sender<InstanceClosed>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let (closed_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            vault: Mutex::new(VaultStatus {
                exists: false,
                unlocked: false,
            }),
            passphrase: Mutex::new(String::new()),
            accounts: Mutex::new(Vec::new()),
            staged_import: Mutex::new(Vec::new()),
            instances: Mutex::new(Vec::new()),
            settings: Mutex::new(AppSettings::default()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            next_pid: AtomicU32::new(1000),
            closed_tx,
        })
    }

    /// Makes the named operation return a backend fault until [`succeed`]
    /// is called for it.
    ///
    /// [`succeed`]: MockBackend::succeed
    pub fn fail(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    pub fn succeed(&self, op: &str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn set_vault(&self, exists: bool, unlocked: bool) {
        *self.vault.lock().unwrap() = VaultStatus { exists, unlocked };
    }

    pub fn set_passphrase(&self, passphrase: &str) {
        *self.passphrase.lock().unwrap() = passphrase.to_string();
    }

    pub fn put_account(&self, account: Account) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn accounts_snapshot(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }

    /// Queues accounts to be appended by the next `import_accounts` call.
    pub fn stage_import(&self, accounts: Vec<Account>) {
        *self.staged_import.lock().unwrap() = accounts;
    }

    pub fn put_instance(&self, instance: ActiveInstance) {
        self.instances.lock().unwrap().push(instance);
    }

    /// Drops an instance from the backend's list without emitting the close
    /// event, as if the event had been lost.
    pub fn remove_instance(&self, pid: u32) {
        self.instances.lock().unwrap().retain(|i| i.pid != pid);
    }

    pub fn emit_closed(&self, event: InstanceClosed) {
        // No receivers is fine.
        let _ = self.closed_tx.send(event);
    }

    pub fn set_settings_extra(&self, key: &str, value: serde_json::Value) {
        self.settings
            .lock()
            .unwrap()
            .extra
            .insert(key.to_string(), value);
    }

    pub fn settings_snapshot(&self) -> AppSettings {
        self.settings.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn gate(&self, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.failing.lock().unwrap().contains(op) {
            Err(LaunchdeckError::backend(format!("mock failure: {op}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn vault_status(&self) -> Result<VaultStatus> {
        self.gate("get_vault_status")?;
        Ok(*self.vault.lock().unwrap())
    }

    async fn create_vault(&self, passphrase: &str) -> Result<()> {
        self.gate("create_vault")?;
        *self.passphrase.lock().unwrap() = passphrase.to_string();
        *self.vault.lock().unwrap() = VaultStatus {
            exists: true,
            unlocked: true,
        };
        Ok(())
    }

    async fn unlock_vault(&self, passphrase: &str) -> Result<bool> {
        self.gate("unlock_vault")?;
        let accepted = *self.passphrase.lock().unwrap() == passphrase;
        if accepted {
            self.vault.lock().unwrap().unlocked = true;
        }
        Ok(accepted)
    }

    async fn lock_vault(&self) -> Result<()> {
        self.gate("lock_vault")?;
        self.vault.lock().unwrap().unlocked = false;
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        self.gate("get_accounts")?;
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn add_account(&self, credential: &str) -> Result<Account> {
        self.gate("add_account")?;
        let added = account(credential);
        self.accounts.lock().unwrap().push(added.clone());
        Ok(added)
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        self.gate("update_account")?;
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(LaunchdeckError::not_found("account", &account.id)),
        }
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        self.gate("delete_account")?;
        self.accounts.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn export_accounts(&self) -> Result<String> {
        self.gate("export_accounts")?;
        let accounts = self.accounts.lock().unwrap();
        Ok(serde_json::to_string(&*accounts)?)
    }

    async fn import_accounts(&self, _blob: &str, merge: bool) -> Result<u32> {
        self.gate("import_accounts")?;
        let staged = std::mem::take(&mut *self.staged_import.lock().unwrap());
        let count = staged.len() as u32;
        let mut accounts = self.accounts.lock().unwrap();
        if !merge {
            accounts.clear();
        }
        accounts.extend(staged);
        Ok(count)
    }

    async fn clear_accounts(&self) -> Result<()> {
        self.gate("clear_accounts")?;
        self.accounts.lock().unwrap().clear();
        Ok(())
    }

    async fn active_instances(&self) -> Result<Vec<ActiveInstance>> {
        self.gate("get_active_instances")?;
        Ok(self.instances.lock().unwrap().clone())
    }

    async fn launch_game(
        &self,
        account_id: &str,
        game_id: u64,
        _job_id: Option<&str>,
    ) -> Result<ActiveInstance> {
        self.gate("launch_game")?;
        let username = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.username.clone())
            .unwrap_or_else(|| "player".to_string());
        let launched = ActiveInstance {
            pid: self.next_pid.fetch_add(1, Ordering::Relaxed),
            account_id: account_id.to_string(),
            username,
            game_id,
            started_at: chrono::Utc::now().timestamp_millis(),
        };
        self.instances.lock().unwrap().push(launched.clone());
        Ok(launched)
    }

    async fn kill_instance(&self, pid: u32) -> Result<()> {
        self.gate("kill_instance")?;
        self.instances.lock().unwrap().retain(|i| i.pid != pid);
        Ok(())
    }

    async fn bypass_mutex(&self) -> Result<u32> {
        self.gate("bypass_mutex")?;
        Ok(1)
    }

    async fn settings(&self) -> Result<AppSettings> {
        self.gate("get_settings")?;
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        self.gate("save_settings")?;
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }

    fn subscribe_instance_closed(&self) -> broadcast::Receiver<InstanceClosed> {
        self.closed_tx.subscribe()
    }
}

/// Minimal account fixture keyed by id.
pub fn account(id: &str) -> Account {
    Account {
        id: id.to_string(),
        credential: format!("cred-{id}"),
        user_id: 0,
        username: format!("user-{id}"),
        display_name: format!("User {id}"),
        thumbnail: None,
        alias: String::new(),
        description: String::new(),
        is_favorite: false,
        last_played_at: 0,
        created_at: None,
        is_premium: None,
    }
}

/// Minimal instance fixture.
pub fn instance(pid: u32, account_id: &str) -> ActiveInstance {
    ActiveInstance {
        pid,
        account_id: account_id.to_string(),
        username: format!("user-{account_id}"),
        game_id: 920,
        started_at: 0,
    }
}
