use alias_types::{Player, PlayerId, RoomCode};

use crate::Role;

/// Local notifications for whatever presents the room to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    RoomCreated {
        room_id: RoomCode,
    },
    JoinedRoom {
        room_id: RoomCode,
    },
    RosterChanged {
        players: Vec<Player>,
    },
    RoleChanged {
        role: Role,
    },
    GameStarted {
        current_turn_player_id: PlayerId,
    },
    WordChanged {
        word: String,
    },
    TurnChanged {
        player_id: PlayerId,
        round_number: u32,
    },
    ScoreChanged {
        player_id: PlayerId,
        score: u32,
    },
    Countdown {
        seconds: u32,
    },
    GameOver {
        leaderboard: Vec<Player>,
    },
    RoomReset,
}

/// Event handler trait for reacting to room changes
pub trait RoomEventHandler: Send {
    fn handle_event(&mut self, event: &RoomEvent);
}

/// Fans room events out to every registered handler.
pub struct RoomEventBus {
    handlers: Vec<Box<dyn RoomEventHandler>>,
}

impl RoomEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn RoomEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: RoomEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(&event);
        }
    }
}

impl Default for RoomEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomEventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
