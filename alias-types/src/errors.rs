use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::{Difficulty, Language};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    #[error("Only the host can do that")]
    NotHost,
    #[error("Not a member of this room")]
    NotInRoom,
    #[error("Action not allowed while game is {current_state}")]
    InvalidState { current_state: String },
    #[error("It is not your turn")]
    NotYourTurn,
    #[error("Room has no players")]
    NoPlayers,
    #[error("No words available for {language}/{difficulty}")]
    NoWordsAvailable {
        language: Language,
        difficulty: Difficulty,
    },
    #[error("Invalid room code: {code}")]
    InvalidRoomCode { code: String },
    #[error("Invalid target score: {score}")]
    InvalidTargetScore { score: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ChannelError {
    #[error("Failed to subscribe: {reason}")]
    SubscribeFailed { reason: String },
    #[error("Failed to track presence: {reason}")]
    TrackFailed { reason: String },
    #[error("Failed to send: {reason}")]
    SendFailed { reason: String },
    #[error("Channel is not subscribed")]
    NotSubscribed,
    #[error("Channel closed")]
    Closed,
}
