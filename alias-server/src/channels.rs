use alias_core::{PresenceRoster, normalize_room_code};
use alias_types::PresenceMeta;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::websocket::connection::ConnectionId;

const TOPIC_PREFIX: &str = "room:";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Invalid topic: {topic}")]
    InvalidTopic { topic: String },
    #[error("Room is full ({max} members)")]
    RoomFull { max: usize },
    #[error("Not subscribed to a topic")]
    NotSubscribed,
}

#[derive(Default)]
struct Topic {
    subscribers: Vec<ConnectionId>,
    presence: PresenceRoster<ConnectionId>,
}

/// Topic membership and presence for every live room.
pub struct ChannelRegistry {
    topics: RwLock<HashMap<String, Topic>>,
    max_members: usize,
}

/// Check a `room:{CODE}` topic and return it in canonical form.
pub fn parse_topic(topic: &str) -> Result<String, RelayError> {
    let code = topic
        .strip_prefix(TOPIC_PREFIX)
        .ok_or_else(|| RelayError::InvalidTopic {
            topic: topic.to_string(),
        })?;
    let code = normalize_room_code(code).map_err(|_| RelayError::InvalidTopic {
        topic: topic.to_string(),
    })?;
    Ok(format!("{}{}", TOPIC_PREFIX, code))
}

impl ChannelRegistry {
    pub fn new(max_members: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            max_members,
        }
    }

    pub async fn subscribe(&self, topic: &str, id: ConnectionId) -> Result<(), RelayError> {
        let mut topics = self.topics.write().await;
        let entry = topics.entry(topic.to_string()).or_default();
        if entry.subscribers.contains(&id) {
            return Ok(());
        }
        if entry.subscribers.len() >= self.max_members {
            if entry.subscribers.is_empty() {
                topics.remove(topic);
            }
            return Err(RelayError::RoomFull {
                max: self.max_members,
            });
        }

        entry.subscribers.push(id);
        info!("{} subscribed to {} ({} members)", id, topic, entry.subscribers.len());
        Ok(())
    }

    /// Remove a subscriber. Returns the new roster when the departure changed
    /// presence, so the caller can push it to whoever is left.
    pub async fn unsubscribe(&self, topic: &str, id: ConnectionId) -> Option<Vec<PresenceMeta>> {
        let mut topics = self.topics.write().await;
        let entry = topics.get_mut(topic)?;
        entry.subscribers.retain(|sub| *sub != id);
        let left = entry.presence.untrack(&id);
        let snapshot = entry.presence.snapshot();

        if entry.subscribers.is_empty() {
            topics.remove(topic);
            info!("Topic {} is empty, dropping it", topic);
        }

        left.map(|meta| {
            debug!("{} ({}) left {}", meta.name, meta.id, topic);
            snapshot
        })
    }

    /// Record or refresh a subscriber's presence and return the full roster.
    pub async fn track(
        &self,
        topic: &str,
        id: ConnectionId,
        meta: PresenceMeta,
    ) -> Result<Vec<PresenceMeta>, RelayError> {
        let mut topics = self.topics.write().await;
        let entry = topics
            .get_mut(topic)
            .filter(|entry| entry.subscribers.contains(&id))
            .ok_or(RelayError::NotSubscribed)?;

        if entry.presence.track(id, meta) {
            debug!("New presence in {}", topic);
        }
        Ok(entry.presence.snapshot())
    }

    pub async fn subscribers(&self, topic: &str) -> Vec<ConnectionId> {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map(|entry| entry.subscribers.clone())
            .unwrap_or_default()
    }

    pub async fn presence(&self, topic: &str) -> Vec<PresenceMeta> {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map(|entry| entry.presence.snapshot())
            .unwrap_or_default()
    }

    pub async fn topic_count(&self) -> usize {
        let topics = self.topics.read().await;
        topics.len()
    }
}
