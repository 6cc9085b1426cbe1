use crate::{Player, PlayerId, RoomCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Length of one explaining round, in seconds.
pub const ROUND_DURATION: u32 = 60;

pub const DEFAULT_TARGET_SCORE: u32 = 25;

/// Target scores offered when creating a room.
pub const SCORE_OPTIONS: [u32; 4] = [10, 25, 50, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum GameStatus {
    #[default]
    Lobby,
    Playing,
    GameOver,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Lobby => write!(f, "LOBBY"),
            GameStatus::Playing => write!(f, "PLAYING"),
            GameStatus::GameOver => write!(f, "GAME_OVER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Language {
    #[default]
    Ua,
    En,
}

impl Language {
    /// English name of the language, as used when asking for generated words.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Ua => "Ukrainian",
            Language::En => "English",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Ua => "ua",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The single record replicated across every client in a room.
///
/// The host holds the authoritative copy; everyone else mirrors it and
/// replaces their copy wholesale on every `SYNC_STATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameState {
    pub room_id: RoomCode,
    /// Roster order is turn order.
    pub players: Vec<Player>,
    pub status: GameStatus,
    pub current_turn_player_id: Option<PlayerId>,
    pub current_word: Option<String>,
    pub time_left: u32,
    pub round_number: u32,
    pub language: Language,
    pub target_score: u32,
    pub difficulty: Difficulty,
    #[serde(rename = "useAI")]
    pub use_ai: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_words: Option<Vec<String>>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            players: Vec::new(),
            status: GameStatus::Lobby,
            current_turn_player_id: None,
            current_word: None,
            time_left: ROUND_DURATION,
            round_number: 0,
            language: Language::Ua,
            target_score: DEFAULT_TARGET_SCORE,
            difficulty: Difficulty::Medium,
            use_ai: false,
            ai_words: Some(Vec::new()),
        }
    }
}

impl GameState {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The explaining player, or `None` if the id is unset or no longer in the roster.
    pub fn current_turn_player(&self) -> Option<&Player> {
        self.current_turn_player_id
            .as_deref()
            .and_then(|id| self.player(id))
    }

    /// Generated words, if any were fetched for this game.
    pub fn cached_ai_words(&self) -> &[String] {
        self.ai_words.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_lobby() {
        let state = GameState::default();
        assert_eq!(state.status, GameStatus::Lobby);
        assert_eq!(state.time_left, ROUND_DURATION);
        assert!(state.current_turn_player_id.is_none());
        assert!(state.current_word.is_none());
        assert!(state.cached_ai_words().is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let mut state = GameState::default();
        state.room_id = "ABC123".to_string();
        state.players.push(Player::new("p1", "Alice", true));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["roomId"], "ABC123");
        assert_eq!(json["status"], "LOBBY");
        assert_eq!(json["useAI"], false);
        assert_eq!(json["language"], "ua");
        assert_eq!(json["difficulty"], "medium");
        assert_eq!(json["players"][0]["isHost"], true);
    }

    #[test]
    fn test_missing_ai_words_deserializes() {
        let json = r#"{
            "roomId": "ABC123", "players": [], "status": "GAME_OVER",
            "currentTurnPlayerId": null, "currentWord": null, "timeLeft": 0,
            "roundNumber": 3, "language": "en", "targetScore": 10,
            "difficulty": "hard", "useAI": true
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.status, GameStatus::GameOver);
        assert!(state.ai_words.is_none());
        assert!(state.cached_ai_words().is_empty());
    }

    #[test]
    fn test_current_turn_player_missing_is_none() {
        let mut state = GameState::default();
        state.players.push(Player::new("p1", "Alice", true));
        state.current_turn_player_id = Some("gone".to_string());
        assert!(state.current_turn_player().is_none());

        state.current_turn_player_id = Some("p1".to_string());
        assert_eq!(state.current_turn_player().unwrap().name, "Alice");
    }
}
