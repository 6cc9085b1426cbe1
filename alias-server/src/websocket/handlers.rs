use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::channels::{ChannelRegistry, parse_topic};
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use alias_types::{ClientFrame, Envelope, PresenceMeta, ServerFrame};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<ChannelRegistry>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        registry: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            registry,
        }
    }

    pub async fn handle_message(&self, message: ClientFrame) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        match message {
            ClientFrame::Subscribe { topic } => self.handle_subscribe(topic).await,
            ClientFrame::Track { meta } => self.handle_track(meta).await,
            ClientFrame::Broadcast { envelope } => self.handle_broadcast(envelope).await,
            ClientFrame::Unsubscribe => self.handle_unsubscribe().await,
            ClientFrame::Heartbeat => Ok(()),
        }
    }

    /// Tell the client its frame was refused without dropping the connection.
    pub async fn reject(&self, reason: &str) -> Result<(), String> {
        self.send_error(reason).await
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        if let Some(topic) = self
            .connection_manager
            .connection_topic(self.connection_id)
            .await
        {
            self.leave_topic(&topic).await;
        }
    }

    async fn handle_subscribe(&self, topic: String) -> Result<(), String> {
        let topic = match parse_topic(&topic) {
            Ok(topic) => topic,
            Err(e) => return self.send_error(&e.to_string()).await,
        };

        if let Some(previous) = self
            .connection_manager
            .connection_topic(self.connection_id)
            .await
        {
            if previous == topic {
                return self.send_frame(ServerFrame::Subscribed { topic }).await;
            }
            self.leave_topic(&previous).await;
            self.connection_manager
                .set_connection_topic(self.connection_id, None)
                .await;
        }

        if let Err(e) = self.registry.subscribe(&topic, self.connection_id).await {
            warn!("{} could not join {}: {}", self.connection_id, topic, e);
            return self.send_error(&e.to_string()).await;
        }
        self.connection_manager
            .set_connection_topic(self.connection_id, Some(topic.clone()))
            .await;

        self.send_frame(ServerFrame::Subscribed { topic }).await
    }

    async fn handle_track(&self, meta: PresenceMeta) -> Result<(), String> {
        let Some(topic) = self.current_topic().await else {
            return self.send_error("Subscribe before tracking presence").await;
        };

        match self.registry.track(&topic, self.connection_id, meta).await {
            Ok(members) => {
                self.push_presence(&topic, members).await;
                Ok(())
            }
            Err(e) => self.send_error(&e.to_string()).await,
        }
    }

    async fn handle_broadcast(&self, envelope: Envelope) -> Result<(), String> {
        let Some(topic) = self.current_topic().await else {
            return self.send_error("Subscribe before broadcasting").await;
        };

        debug!(
            "{} from {} in {}",
            envelope.message.kind(),
            envelope.sender_id,
            topic
        );
        let recipients: Vec<ConnectionId> = self
            .registry
            .subscribers(&topic)
            .await
            .into_iter()
            .filter(|id| *id != self.connection_id)
            .collect();
        self.connection_manager
            .send_to_many(&recipients, ServerFrame::Broadcast { envelope })
            .await;
        Ok(())
    }

    async fn handle_unsubscribe(&self) -> Result<(), String> {
        if let Some(topic) = self.current_topic().await {
            self.leave_topic(&topic).await;
            self.connection_manager
                .set_connection_topic(self.connection_id, None)
                .await;
        }
        Ok(())
    }

    async fn current_topic(&self) -> Option<String> {
        self.connection_manager
            .connection_topic(self.connection_id)
            .await
    }

    async fn leave_topic(&self, topic: &str) {
        if let Some(members) = self.registry.unsubscribe(topic, self.connection_id).await {
            self.push_presence(topic, members).await;
        }
    }

    async fn push_presence(&self, topic: &str, members: Vec<PresenceMeta>) {
        let subscribers = self.registry.subscribers(topic).await;
        self.connection_manager
            .send_to_many(&subscribers, ServerFrame::PresenceSync { members })
            .await;
    }

    async fn send_frame(&self, frame: ServerFrame) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, frame)
            .await
    }

    async fn send_error(&self, error_message: &str) -> Result<(), String> {
        self.send_frame(ServerFrame::Error {
            message: error_message.to_string(),
        })
        .await
    }
}

/// Untrack connections the idle sweep removed and tell their rooms.
pub async fn release_connections(
    registry: &ChannelRegistry,
    connection_manager: &ConnectionManager,
    removed: Vec<(ConnectionId, Option<String>)>,
) {
    for (connection_id, topic) in removed {
        let Some(topic) = topic else { continue };
        if let Some(members) = registry.unsubscribe(&topic, connection_id).await {
            let subscribers = registry.subscribers(&topic).await;
            connection_manager
                .send_to_many(&subscribers, ServerFrame::PresenceSync { members })
                .await;
        }
    }
}
