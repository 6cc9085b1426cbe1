use alias_types::{ChannelError, Envelope, PresenceMeta};
use async_trait::async_trait;
use tokio::sync::mpsc;

pub mod memory;
pub mod websocket;

pub use memory::{MemoryChannel, MemoryHub};
pub use websocket::WsChannel;

/// What a subscribed client hears from its room's channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A message from another client. Our own sends are never echoed back.
    Broadcast(Envelope),
    /// Everyone currently tracked on the topic.
    PresenceSync(Vec<PresenceMeta>),
    Closed,
}

/// A topic-scoped publish/subscribe channel with presence.
#[async_trait]
pub trait RoomChannel: Send {
    async fn subscribe(
        &mut self,
        topic: &str,
    ) -> Result<mpsc::UnboundedReceiver<ChannelEvent>, ChannelError>;

    /// Announce ourselves on the presence roster of the subscribed topic.
    async fn track(&mut self, meta: PresenceMeta) -> Result<(), ChannelError>;

    async fn send(&mut self, envelope: Envelope) -> Result<(), ChannelError>;

    async fn unsubscribe(&mut self) -> Result<(), ChannelError>;
}
