use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameState, PlayerId, PresenceMeta};

/// Game events carried over a room's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum SyncMessage {
    /// Full-state replace; receivers overwrite their mirror.
    SyncState(GameState),
    #[serde(rename_all = "camelCase")]
    StartGame {
        current_turn_player_id: PlayerId,
        first_word: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ai_words: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    GuessWord { player_id: PlayerId, next_word: String },
    #[serde(rename_all = "camelCase")]
    SkipWord { next_word: String },
    /// Seconds remaining in the round.
    Tick(u32),
}

impl SyncMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::SyncState(_) => "SYNC_STATE",
            SyncMessage::StartGame { .. } => "START_GAME",
            SyncMessage::GuessWord { .. } => "GUESS_WORD",
            SyncMessage::SkipWord { .. } => "SKIP_WORD",
            SyncMessage::Tick(_) => "TICK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Envelope {
    pub sender_id: PlayerId,
    pub message: SyncMessage,
}

impl Envelope {
    pub fn new(sender_id: impl Into<PlayerId>, message: SyncMessage) -> Self {
        Self {
            sender_id: sender_id.into(),
            message,
        }
    }
}

/// Frames a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientFrame {
    Subscribe { topic: String },
    Track { meta: PresenceMeta },
    Broadcast { envelope: Envelope },
    Unsubscribe,
    Heartbeat,
}

/// Frames the relay pushes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerFrame {
    Subscribed { topic: String },
    Broadcast { envelope: Envelope },
    /// Full membership snapshot, never a delta.
    PresenceSync { members: Vec<PresenceMeta> },
    Error { message: String },
}

/// Topic name for a room's channel.
pub fn room_topic(room_code: &str) -> String {
    format!("room:{}", room_code)
}
