pub mod game;
pub mod messages;
pub mod player;
pub mod errors;

// Re-export all types
pub use game::*;
pub use messages::*;
pub use player::*;
pub use errors::*;

/// Opaque per-client session identifier.
pub type PlayerId = String;

/// Six-character uppercase room code, also used to name the broadcast topic.
pub type RoomCode = String;
