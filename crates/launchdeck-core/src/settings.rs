//! Persisted application settings.
//!
//! The settings blob is owned by the backend; this layer only reads and
//! writes the keys it understands and must round-trip everything else
//! unharmed, hence the flattened `extra` map.

use serde::{Deserialize, Serialize};

/// A game pinned for quick launch, persisted inside the settings blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteGame {
    pub id: String,
    pub game_id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Unix millis when the game was pinned.
    pub added_at: i64,
}

/// Application settings as persisted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_auto_lock_timeout")]
    pub auto_lock_timeout: String,
    #[serde(default)]
    pub launch_on_startup: bool,
    #[serde(default)]
    pub always_on_top: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub compact_mode: bool,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    /// Allows more than one concurrently running instance per account.
    /// Enforced by the backend; the state layer never assumes either way.
    #[serde(default)]
    pub multi_instance: bool,
    #[serde(default = "default_launcher_preference")]
    pub launcher_preference: String,
    #[serde(default)]
    pub quarantine_installers: bool,
    #[serde(default)]
    pub save_logs: bool,
    #[serde(default)]
    pub force_handle_closure: bool,
    #[serde(default)]
    pub low_cpu_mode: bool,
    #[serde(default)]
    pub favorite_games: Vec<FavoriteGame>,
    /// Settings keys this layer does not own.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_auto_lock_timeout() -> String {
    "never".to_string()
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_accent_color() -> String {
    "red".to_string()
}

fn default_launcher_preference() -> String {
    "default".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_lock_timeout: default_auto_lock_timeout(),
            launch_on_startup: false,
            always_on_top: false,
            theme: default_theme(),
            compact_mode: false,
            accent_color: default_accent_color(),
            multi_instance: false,
            launcher_preference: default_launcher_preference(),
            quarantine_installers: false,
            save_logs: false,
            force_handle_closure: false,
            low_cpu_mode: false,
            favorite_games: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}
