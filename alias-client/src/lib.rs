pub mod channel;
pub mod config;
pub mod session;
pub mod wordgen;

pub use channel::{ChannelEvent, MemoryChannel, MemoryHub, RoomChannel, WsChannel};
pub use config::{ClientConfig, ConfigError};
pub use session::{Command, GameSession, SessionError};
pub use wordgen::{GeminiWordGenerator, WordGenError, WordGenerator};
