use alias_core::PresenceRoster;
use alias_types::{ChannelError, Envelope, PresenceMeta};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

use super::{ChannelEvent, RoomChannel};

type ChannelId = u64;

#[derive(Default)]
struct Topic {
    subscribers: Vec<(ChannelId, mpsc::UnboundedSender<ChannelEvent>)>,
    presence: PresenceRoster<ChannelId>,
}

impl Topic {
    fn push_presence(&mut self) {
        let snapshot = self.presence.snapshot();
        self.subscribers
            .retain(|(_, tx)| tx.send(ChannelEvent::PresenceSync(snapshot.clone())).is_ok());
    }
}

#[derive(Default)]
struct HubState {
    next_id: ChannelId,
    topics: HashMap<String, Topic>,
}

/// In-process pub/sub hub. Every channel handed out by the same hub shares
/// its topics, which makes it a stand-in for the relay in tests and
/// single-machine play.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self) -> MemoryChannel {
        let id = match self.lock() {
            Ok(mut state) => {
                state.next_id += 1;
                state.next_id
            }
            Err(_) => 0,
        };
        MemoryChannel {
            hub: self.clone(),
            id,
            topic: None,
        }
    }

    /// Current presence roster of a topic.
    pub fn presence(&self, topic: &str) -> Vec<PresenceMeta> {
        self.lock()
            .ok()
            .and_then(|state| state.topics.get(topic).map(|t| t.presence.snapshot()))
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock()
            .ok()
            .and_then(|state| state.topics.get(topic).map(|t| t.subscribers.len()))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>, ChannelError> {
        self.state.lock().map_err(|_| ChannelError::Closed)
    }

    fn detach(&self, id: ChannelId, topic: &str) {
        let Ok(mut state) = self.lock() else {
            return;
        };
        let Some(entry) = state.topics.get_mut(topic) else {
            return;
        };
        entry.subscribers.retain(|(sub, _)| *sub != id);
        if entry.presence.untrack(&id).is_some() {
            entry.push_presence();
        }
        if entry.subscribers.is_empty() {
            state.topics.remove(topic);
            debug!("Topic {} has no subscribers left", topic);
        }
    }
}

/// One client's handle onto a [`MemoryHub`]. Dropping it behaves like a
/// disconnect: the client leaves the roster and the others are told.
pub struct MemoryChannel {
    hub: MemoryHub,
    id: ChannelId,
    topic: Option<String>,
}

impl MemoryChannel {
    fn topic(&self) -> Result<&str, ChannelError> {
        self.topic.as_deref().ok_or(ChannelError::NotSubscribed)
    }
}

#[async_trait]
impl RoomChannel for MemoryChannel {
    async fn subscribe(
        &mut self,
        topic: &str,
    ) -> Result<mpsc::UnboundedReceiver<ChannelEvent>, ChannelError> {
        if let Some(previous) = self.topic.take() {
            self.hub.detach(self.id, &previous);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.hub.lock()?;
        state
            .topics
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .push((self.id, tx));
        drop(state);

        self.topic = Some(topic.to_string());
        debug!("Channel {} subscribed to {}", self.id, topic);
        Ok(rx)
    }

    async fn track(&mut self, meta: PresenceMeta) -> Result<(), ChannelError> {
        let topic = self.topic()?.to_string();
        let mut state = self.hub.lock()?;
        let entry = state
            .topics
            .get_mut(&topic)
            .ok_or_else(|| ChannelError::TrackFailed {
                reason: format!("topic {} is gone", topic),
            })?;
        entry.presence.track(self.id, meta);
        entry.push_presence();
        Ok(())
    }

    async fn send(&mut self, envelope: Envelope) -> Result<(), ChannelError> {
        let topic = self.topic()?.to_string();
        let mut state = self.hub.lock()?;
        let Some(entry) = state.topics.get_mut(&topic) else {
            return Err(ChannelError::SendFailed {
                reason: format!("topic {} is gone", topic),
            });
        };

        let id = self.id;
        entry.subscribers.retain(|(sub, tx)| {
            *sub == id || tx.send(ChannelEvent::Broadcast(envelope.clone())).is_ok()
        });
        Ok(())
    }

    async fn unsubscribe(&mut self) -> Result<(), ChannelError> {
        if let Some(topic) = self.topic.take() {
            self.hub.detach(self.id, &topic);
        }
        Ok(())
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        if let Some(topic) = self.topic.take() {
            self.hub.detach(self.id, &topic);
        }
    }
}
