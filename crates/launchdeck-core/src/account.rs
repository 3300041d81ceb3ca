//! Account domain model.
//!
//! Accounts live in the backend's encrypted vault; the structs here mirror
//! the IPC wire shape (camelCase fields).

use serde::{Deserialize, Serialize};

/// A launcher account stored in the vault.
///
/// The backend is the source of truth; in-memory copies held by the account
/// registry are a cache that may be briefly stale during optimistic writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable identity; at most one account per id exists in the registry.
    pub id: String,
    /// Raw session credential. Opaque here, owned by the vault.
    pub credential: String,
    /// Numeric user id on the game platform.
    pub user_id: u64,
    pub username: String,
    pub display_name: String,
    /// Avatar thumbnail URL, if resolved.
    pub thumbnail: Option<String>,
    /// User-chosen nickname shown in the UI.
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_favorite: bool,
    /// Unix millis of the last launch through this account.
    #[serde(default)]
    pub last_played_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "id": "acc-1",
            "credential": "tok",
            "userId": 42,
            "username": "player",
            "displayName": "Player",
            "thumbnail": null,
            "isFavorite": true,
            "lastPlayedAt": 1000
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.user_id, 42);
        assert!(account.is_favorite);
        assert_eq!(account.alias, "");
        assert!(account.created_at.is_none());
    }
}
