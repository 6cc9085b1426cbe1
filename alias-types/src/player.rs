use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
            is_host,
        }
    }
}

/// What a client announces on the presence channel once subscribed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresenceMeta {
    pub id: PlayerId,
    pub name: String,
    /// The client's own claim; only the room creator announces `true`.
    pub is_host: bool,
    pub online_at: String, // ISO 8601 string
}
