pub mod game_state;
pub mod scoring;
pub mod word_bank;
pub mod game_events;
pub mod identity;
pub mod presence;

// Re-export main components
pub use game_state::*;
pub use scoring::*;
pub use word_bank::*;
pub use game_events::*;
pub use identity::*;
pub use presence::*;
