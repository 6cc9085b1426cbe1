#![allow(dead_code)]

use alias_core::{Room, RoomEvent, RoomEventHandler, RoomSettings};
use alias_types::{Difficulty, Envelope, Language, PresenceMeta, SyncMessage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

pub fn test_rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

pub fn english_easy(target_score: u32) -> RoomSettings {
    RoomSettings {
        language: Language::En,
        target_score,
        difficulty: Difficulty::Easy,
        use_ai: false,
    }
}

/// Presence entry as a client would announce it
pub fn presence(id: &str, name: &str, is_host: bool) -> PresenceMeta {
    PresenceMeta {
        id: id.to_string(),
        name: name.to_string(),
        is_host,
        online_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// A handful of rooms wired together by hand, standing in for the channel.
///
/// Messages from one room are delivered to every other room in send order,
/// and whatever the receivers answer with is delivered in turn.
pub struct Table {
    pub rooms: Vec<Room>,
}

impl Table {
    /// Host creates a room, guests join it, and everyone receives the same
    /// presence snapshot.
    pub fn seat(host: (&str, &str), guests: &[(&str, &str)], settings: RoomSettings, rng: &mut StdRng) -> Self {
        let host_room = Room::create(host.0.to_string(), host.1, settings, rng).unwrap();
        let code = host_room.room_id().to_string();

        let mut rooms = vec![host_room];
        for (id, name) in guests {
            rooms.push(Room::join(id.to_string(), name, &code).unwrap());
        }

        let mut table = Self { rooms };
        let snapshot: Vec<PresenceMeta> = table
            .rooms
            .iter()
            .map(|room| room.presence_meta(chrono::Utc::now()))
            .collect();
        table.sync_presence(&snapshot);
        table
    }

    pub fn sync_presence(&mut self, snapshot: &[PresenceMeta]) {
        let mut outbound = Vec::new();
        for (index, room) in self.rooms.iter_mut().enumerate() {
            for message in room.apply_presence(snapshot) {
                outbound.push((index, room.envelope(message)));
            }
        }
        self.deliver(outbound);
    }

    pub fn broadcast(&mut self, from: usize, messages: Vec<SyncMessage>) {
        let outbound = messages
            .into_iter()
            .map(|m| (from, self.rooms[from].envelope(m)))
            .collect();
        self.deliver(outbound);
    }

    fn deliver(&mut self, mut queue: Vec<(usize, Envelope)>) {
        while !queue.is_empty() {
            let (from, envelope) = queue.remove(0);
            for (index, room) in self.rooms.iter_mut().enumerate() {
                if index == from {
                    continue;
                }
                for reply in room.apply_message(&envelope) {
                    queue.push((index, room.envelope(reply)));
                }
            }
        }
    }

    pub fn host(&mut self) -> &mut Room {
        &mut self.rooms[0]
    }
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<RoomEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<RoomEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&RoomEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl RoomEventHandler for EventCollector {
    fn handle_event(&mut self, event: &RoomEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
