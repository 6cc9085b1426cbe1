#![allow(dead_code)]

use alias_client::{GameSession, MemoryChannel, MemoryHub, WordGenError, WordGenerator};
use alias_core::{Room, RoomSettings};
use alias_types::{Difficulty, Language};
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub type TestSession = GameSession<MemoryChannel, StubGenerator>;

/// Word generator that never leaves the process.
#[derive(Clone)]
pub enum StubGenerator {
    Words(Vec<String>),
    Failing,
}

#[async_trait]
impl WordGenerator for StubGenerator {
    async fn generate(
        &self,
        _language: Language,
        _difficulty: Difficulty,
    ) -> Result<Vec<String>, WordGenError> {
        match self {
            StubGenerator::Words(words) => Ok(words.clone()),
            StubGenerator::Failing => Err(WordGenError::Status(503)),
        }
    }
}

pub fn settings(use_ai: bool, target_score: u32) -> RoomSettings {
    RoomSettings {
        language: Language::En,
        target_score,
        difficulty: Difficulty::Easy,
        use_ai,
    }
}

pub fn host_session(hub: &MemoryHub, settings: RoomSettings, generator: StubGenerator) -> TestSession {
    let mut rng = StdRng::seed_from_u64(7);
    let room = Room::create("host0".to_string(), "Hana", settings, &mut rng).unwrap();
    GameSession::with_rng(room, hub.channel(), generator, rng)
}

pub fn guest_session(hub: &MemoryHub, id: &str, name: &str, code: &str) -> TestSession {
    let room = Room::join(id.to_string(), name, code).unwrap();
    GameSession::with_rng(
        room,
        hub.channel(),
        StubGenerator::Failing,
        StdRng::seed_from_u64(11),
    )
}

/// Keep delivering until no session has anything left to handle.
pub async fn settle(sessions: &mut [&mut TestSession]) {
    loop {
        let mut handled = 0;
        for session in sessions.iter_mut() {
            handled += session.process_pending().await.unwrap();
        }
        if handled == 0 {
            break;
        }
    }
}

/// Host plus one guest, connected and with rosters in agreement.
pub async fn connected_pair(settings: RoomSettings, generator: StubGenerator) -> (MemoryHub, TestSession, TestSession) {
    let hub = MemoryHub::new();
    let mut host = host_session(&hub, settings, generator);
    host.connect().await.unwrap();

    let code = host.room().room_id().to_string();
    let mut guest = guest_session(&hub, "guest1", "Gus", &code);
    guest.connect().await.unwrap();

    settle(&mut [&mut host, &mut guest]).await;
    (hub, host, guest)
}
