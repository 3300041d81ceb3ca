//! Vault status and the derived session state.

use serde::{Deserialize, Serialize};

/// Wire shape of the `get_vault_status` backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStatus {
    pub exists: bool,
    pub unlocked: bool,
}

/// Session state derived from the vault.
///
/// `Unknown` means no authoritative status read has completed yet; it is
/// distinguishable from `NoVault` so the UI never offers vault creation
/// before the first check resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultState {
    Unknown,
    NoVault,
    Locked,
    Unlocked,
}

impl VaultState {
    /// Maps an authoritative status read to a session state.
    pub fn from_status(status: VaultStatus) -> Self {
        match (status.exists, status.unlocked) {
            (false, _) => VaultState::NoVault,
            (true, false) => VaultState::Locked,
            (true, true) => VaultState::Unlocked,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, VaultState::Unlocked)
    }

    pub fn vault_exists(&self) -> bool {
        matches!(self, VaultState::Locked | VaultState::Unlocked)
    }
}
