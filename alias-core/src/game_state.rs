use alias_types::{
    Difficulty, Envelope, GameError, GameState, GameStatus, Language, Player, PlayerId,
    PresenceMeta, ROUND_DURATION, SyncMessage, DEFAULT_TARGET_SCORE,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    RoomEvent, RoomEventBus, RoomEventHandler, ScoringEngine, WordBank, generate_room_code,
    merge_presence, normalize_room_code,
};

/// Which side of the replication a client is on.
///
/// The host holds the authoritative state and owns the countdown. Replicas
/// mirror whatever the host broadcasts and only make optimistic local edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Replica,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    pub language: Language,
    pub target_score: u32,
    pub difficulty: Difficulty,
    pub use_ai: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            language: Language::Ua,
            target_score: DEFAULT_TARGET_SCORE,
            difficulty: Difficulty::Medium,
            use_ai: false,
        }
    }
}

/// One client's view of a room.
///
/// Every mutating call returns the messages the caller must broadcast; the
/// room itself never touches the network.
#[derive(Debug)]
pub struct Room {
    me: PlayerId,
    my_name: String,
    role: Role,
    state: GameState,
    events: RoomEventBus,
}

impl Room {
    pub fn create<R: Rng + ?Sized>(
        me: PlayerId,
        name: &str,
        settings: RoomSettings,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if settings.target_score == 0 {
            return Err(GameError::InvalidTargetScore {
                score: settings.target_score,
            });
        }

        let room_id = generate_room_code(rng);
        let state = GameState {
            room_id: room_id.clone(),
            players: vec![Player::new(me.clone(), name, true)],
            language: settings.language,
            target_score: settings.target_score,
            difficulty: settings.difficulty,
            use_ai: settings.use_ai,
            ..GameState::default()
        };

        info!("Created room {} as host {}", room_id, me);
        let mut room = Self {
            me,
            my_name: name.to_string(),
            role: Role::Host,
            state,
            events: RoomEventBus::new(),
        };
        room.events.publish(RoomEvent::RoomCreated { room_id });
        Ok(room)
    }

    /// Join by code. The roster is unknown until the first presence sync or
    /// full-state replace arrives.
    pub fn join(me: PlayerId, name: &str, code: &str) -> Result<Self, GameError> {
        let room_id = normalize_room_code(code)?;
        let state = GameState {
            room_id: room_id.clone(),
            players: vec![Player::new(me.clone(), name, false)],
            ..GameState::default()
        };

        info!("Joining room {} as {}", room_id, me);
        let mut room = Self {
            me,
            my_name: name.to_string(),
            role: Role::Replica,
            state,
            events: RoomEventBus::new(),
        };
        room.events.publish(RoomEvent::JoinedRoom { room_id });
        Ok(room)
    }

    pub fn add_handler(&mut self, handler: Box<dyn RoomEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn me(&self) -> &str {
        &self.me
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn room_id(&self) -> &str {
        &self.state.room_id
    }

    pub fn is_my_turn(&self) -> bool {
        self.state.current_turn_player_id.as_deref() == Some(self.me.as_str())
    }

    pub fn current_turn_player(&self) -> Option<&Player> {
        self.state.current_turn_player()
    }

    pub fn leaderboard(&self) -> Vec<Player> {
        ScoringEngine::leaderboard(&self.state.players)
    }

    /// Whether this client should be running the countdown right now.
    pub fn owns_timer(&self) -> bool {
        self.is_host() && self.state.status == GameStatus::Playing
    }

    pub fn envelope(&self, message: SyncMessage) -> Envelope {
        Envelope::new(self.me.clone(), message)
    }

    /// What to announce on the presence channel after subscribing.
    pub fn presence_meta(&self, now: DateTime<Utc>) -> PresenceMeta {
        let name = self
            .state
            .player(&self.me)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| self.my_name.clone());

        PresenceMeta {
            id: self.me.clone(),
            name,
            is_host: self.is_host(),
            online_at: now.to_rfc3339(),
        }
    }

    /// Drop back to an uninitialized state after leaving the room.
    pub fn reset(&mut self) {
        info!("Leaving room {}", self.state.room_id);
        self.state = GameState::default();
        self.role = Role::Replica;
        self.events.publish(RoomEvent::RoomReset);
    }

    /// Reconcile the roster with a presence snapshot.
    pub fn apply_presence(&mut self, snapshot: &[PresenceMeta]) -> Vec<SyncMessage> {
        let merged = merge_presence(&self.state.players, snapshot);
        debug!(
            "Presence sync in {}: {} online",
            self.state.room_id,
            merged.len()
        );

        if merged != self.state.players {
            self.state.players = merged;
            self.events.publish(RoomEvent::RosterChanged {
                players: self.state.players.clone(),
            });
        }
        self.refresh_role();

        if self.is_host() {
            vec![SyncMessage::SyncState(self.state.clone())]
        } else {
            Vec::new()
        }
    }

    /// Host starts the game. `ai_words` is the freshly generated batch, if any.
    pub fn start_game<R: Rng + ?Sized>(
        &mut self,
        ai_words: Option<Vec<String>>,
        rng: &mut R,
    ) -> Result<Vec<SyncMessage>, GameError> {
        self.require_host()?;
        self.require_status(GameStatus::Lobby)?;

        let first_player = self
            .state
            .players
            .first()
            .map(|p| p.id.clone())
            .ok_or(GameError::NoPlayers)?;

        let fresh_words = ai_words.filter(|words| !words.is_empty());
        if let Some(words) = &fresh_words {
            self.state.ai_words = Some(words.clone());
        }

        let first_word = WordBank::draw(&self.state, rng)?;

        self.state.status = GameStatus::Playing;
        self.state.current_turn_player_id = Some(first_player.clone());
        self.state.current_word = Some(first_word.clone());
        self.state.time_left = ROUND_DURATION;
        self.state.round_number = 1;

        info!(
            "Game started in {}: {} explains first",
            self.state.room_id, first_player
        );
        self.events.publish(RoomEvent::GameStarted {
            current_turn_player_id: first_player.clone(),
        });
        self.events.publish(RoomEvent::WordChanged {
            word: first_word.clone(),
        });

        Ok(vec![SyncMessage::StartGame {
            current_turn_player_id: first_player,
            first_word,
            ai_words: fresh_words,
        }])
    }

    /// One second of the host's countdown.
    ///
    /// Game over is only ever detected here, on the tick where the round
    /// timer has already run out.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<SyncMessage>, GameError> {
        self.require_host()?;
        self.require_status(GameStatus::Playing)?;

        if self.state.time_left > 0 {
            self.state.time_left -= 1;
            self.events.publish(RoomEvent::Countdown {
                seconds: self.state.time_left,
            });
            return Ok(vec![SyncMessage::Tick(self.state.time_left)]);
        }

        if let Some(winner) = ScoringEngine::find_winner(&self.state.players, self.state.target_score) {
            info!(
                "Game over in {}: {} reached {}",
                self.state.room_id, winner.name, self.state.target_score
            );
            self.state.status = GameStatus::GameOver;
            self.events.publish(RoomEvent::GameOver {
                leaderboard: self.leaderboard(),
            });
            return Ok(vec![SyncMessage::SyncState(self.state.clone())]);
        }

        let next = ScoringEngine::next_turn_player(
            &self.state.players,
            self.state.current_turn_player_id.as_deref(),
        )
        .ok_or(GameError::NoPlayers)?;
        let word = WordBank::draw(&self.state, rng)?;

        self.state.current_turn_player_id = Some(next.clone());
        self.state.current_word = Some(word.clone());
        self.state.time_left = ROUND_DURATION;
        self.state.round_number += 1;

        debug!(
            "Round {} in {}: {} explains",
            self.state.round_number, self.state.room_id, next
        );
        self.events.publish(RoomEvent::TurnChanged {
            player_id: next,
            round_number: self.state.round_number,
        });
        self.events.publish(RoomEvent::WordChanged { word });
        self.events.publish(RoomEvent::Countdown {
            seconds: ROUND_DURATION,
        });

        Ok(vec![SyncMessage::SyncState(self.state.clone())])
    }

    /// Award myself a point and move on to the next word.
    ///
    /// Applied locally straight away; the host's next full-state replace
    /// settles any disagreement. Never ends the game by itself.
    pub fn correct_guess<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Vec<SyncMessage>, GameError> {
        self.require_status(GameStatus::Playing)?;
        let next_word = WordBank::draw(&self.state, rng)?;

        if !ScoringEngine::award_point(&mut self.state.players, &self.me) {
            return Err(GameError::NotInRoom);
        }
        self.set_word(next_word.clone());
        self.publish_score(&self.me.clone());

        Ok(vec![SyncMessage::GuessWord {
            player_id: self.me.clone(),
            next_word,
        }])
    }

    /// Replace the current word without scoring. Only the explainer skips.
    pub fn skip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<SyncMessage>, GameError> {
        self.require_status(GameStatus::Playing)?;
        if !self.is_my_turn() {
            return Err(GameError::NotYourTurn);
        }

        let next_word = WordBank::draw(&self.state, rng)?;
        self.set_word(next_word.clone());
        Ok(vec![SyncMessage::SkipWord { next_word }])
    }

    /// Mirror a message broadcast by another client.
    ///
    /// The host answers peer guesses and skips with a full-state replace so
    /// every mirror converges on the host's view.
    pub fn apply_message(&mut self, envelope: &Envelope) -> Vec<SyncMessage> {
        if envelope.sender_id == self.me {
            return Vec::new();
        }
        debug!(
            "Applying {} from {} in {}",
            envelope.message.kind(),
            envelope.sender_id,
            self.state.room_id
        );

        match &envelope.message {
            SyncMessage::SyncState(state) => {
                self.replace_state(state.clone());
                Vec::new()
            }
            SyncMessage::StartGame {
                current_turn_player_id,
                first_word,
                ai_words,
            } => {
                self.state.status = GameStatus::Playing;
                self.state.current_turn_player_id = Some(current_turn_player_id.clone());
                self.state.current_word = Some(first_word.clone());
                if let Some(words) = ai_words {
                    self.state.ai_words = Some(words.clone());
                }
                self.state.time_left = ROUND_DURATION;
                self.state.round_number = 1;

                self.events.publish(RoomEvent::GameStarted {
                    current_turn_player_id: current_turn_player_id.clone(),
                });
                self.events.publish(RoomEvent::WordChanged {
                    word: first_word.clone(),
                });
                Vec::new()
            }
            SyncMessage::GuessWord {
                player_id,
                next_word,
            } => {
                if ScoringEngine::award_point(&mut self.state.players, player_id) {
                    self.publish_score(player_id);
                } else {
                    debug!("Guess credited to unknown player {}", player_id);
                }
                self.set_word(next_word.clone());
                self.host_resync()
            }
            SyncMessage::SkipWord { next_word } => {
                self.set_word(next_word.clone());
                self.host_resync()
            }
            SyncMessage::Tick(seconds) => {
                self.state.time_left = *seconds;
                self.events.publish(RoomEvent::Countdown { seconds: *seconds });
                Vec::new()
            }
        }
    }

    fn replace_state(&mut self, new_state: GameState) {
        let old = std::mem::replace(&mut self.state, new_state);

        if old.players != self.state.players {
            self.events.publish(RoomEvent::RosterChanged {
                players: self.state.players.clone(),
            });
        }
        if old.status == GameStatus::Lobby && self.state.status == GameStatus::Playing {
            if let Some(id) = &self.state.current_turn_player_id {
                self.events.publish(RoomEvent::GameStarted {
                    current_turn_player_id: id.clone(),
                });
            }
        } else if old.current_turn_player_id != self.state.current_turn_player_id {
            if let Some(id) = &self.state.current_turn_player_id {
                self.events.publish(RoomEvent::TurnChanged {
                    player_id: id.clone(),
                    round_number: self.state.round_number,
                });
            }
        }
        if old.current_word != self.state.current_word {
            if let Some(word) = &self.state.current_word {
                self.events.publish(RoomEvent::WordChanged { word: word.clone() });
            }
        }
        if old.time_left != self.state.time_left {
            self.events.publish(RoomEvent::Countdown {
                seconds: self.state.time_left,
            });
        }
        if old.status != GameStatus::GameOver && self.state.status == GameStatus::GameOver {
            self.events.publish(RoomEvent::GameOver {
                leaderboard: self.leaderboard(),
            });
        }

        self.refresh_role();
    }

    fn host_resync(&self) -> Vec<SyncMessage> {
        if self.is_host() {
            vec![SyncMessage::SyncState(self.state.clone())]
        } else {
            Vec::new()
        }
    }

    fn refresh_role(&mut self) {
        let role = match self.state.player(&self.me) {
            Some(player) if player.is_host => Role::Host,
            _ => Role::Replica,
        };
        if role != self.role {
            info!("Now {:?} in room {}", role, self.state.room_id);
            self.role = role;
            self.events.publish(RoomEvent::RoleChanged { role });
        }
    }

    fn set_word(&mut self, word: String) {
        self.state.current_word = Some(word.clone());
        self.events.publish(RoomEvent::WordChanged { word });
    }

    fn publish_score(&mut self, player_id: &str) {
        if let Some(player) = self.state.player(player_id) {
            let event = RoomEvent::ScoreChanged {
                player_id: player.id.clone(),
                score: player.score,
            };
            self.events.publish(event);
        }
    }

    fn require_host(&self) -> Result<(), GameError> {
        if self.is_host() {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    fn require_status(&self, status: GameStatus) -> Result<(), GameError> {
        if self.state.status == status {
            Ok(())
        } else {
            Err(GameError::InvalidState {
                current_state: self.state.status.to_string(),
            })
        }
    }
}
