//! Active game-instance models.

use serde::{Deserialize, Serialize};

/// A live game-client process launched on behalf of an account.
///
/// At most one instance exists per `pid`. The operating system reuses
/// process ids after exit, so a pid appearing again after removal is a new
/// instance, never evidence that the removal was wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInstance {
    pub pid: u32,
    pub account_id: String,
    pub username: String,
    pub game_id: u64,
    /// Unix millis when the process was spawned.
    pub started_at: i64,
}

/// Push-event payload emitted by the backend when an instance exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceClosed {
    pub pid: u32,
    pub account_id: String,
    pub username: String,
}
