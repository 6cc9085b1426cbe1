use alias_core::{Room, RoomEventHandler};
use alias_types::{ChannelError, Difficulty, GameError, Language, SyncMessage, room_topic};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, RoomChannel};
use crate::wordgen::WordGenerator;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Local player intent fed into a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Correct,
    Skip,
    Leave,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Session is not connected to a room")]
    NotConnected,
}

/// Drives one client's [`Room`] against a broadcast channel.
///
/// Everything runs on a single task: channel events, the host's countdown
/// and local commands are handled one at a time, so the room state never
/// needs a lock.
pub struct GameSession<C, G> {
    room: Room,
    channel: C,
    generator: G,
    rng: StdRng,
    events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
    timer: Option<Interval>,
    /// Host claim carried by our last presence track.
    announced_host: bool,
}

impl<C: RoomChannel, G: WordGenerator> GameSession<C, G> {
    pub fn new(room: Room, channel: C, generator: G) -> Self {
        Self::with_rng(room, channel, generator, StdRng::from_entropy())
    }

    pub fn with_rng(room: Room, channel: C, generator: G, rng: StdRng) -> Self {
        Self {
            room,
            channel,
            generator,
            rng,
            events: None,
            timer: None,
            announced_host: false,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn add_handler(&mut self, handler: Box<dyn RoomEventHandler>) {
        self.room.add_handler(handler);
    }

    pub fn is_connected(&self) -> bool {
        self.events.is_some()
    }

    /// Whether this client is currently running the round timer.
    pub fn timer_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Subscribe to the room's topic and announce ourselves.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let topic = room_topic(self.room.room_id());
        let events = self.channel.subscribe(&topic).await?;
        self.events = Some(events);

        let meta = self.room.presence_meta(Utc::now());
        self.announced_host = meta.is_host;
        self.channel.track(meta).await?;
        info!("Connected to {} as {}", topic, self.room.me());

        self.sync_timer();
        Ok(())
    }

    /// Run until the player leaves or the channel closes.
    pub async fn run(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<(), SessionError> {
        let mut events = self.events.take().ok_or(SessionError::NotConnected)?;

        let result = loop {
            tokio::select! {
                event = events.recv() => {
                    let event = event.unwrap_or(ChannelEvent::Closed);
                    if let Err(e) = self.handle_channel_event(event).await {
                        break Err(e);
                    }
                }
                _ = next_tick(&mut self.timer) => {
                    if let Err(e) = self.handle_tick().await {
                        break Err(e);
                    }
                }
                command = commands.recv() => {
                    let command = command.unwrap_or(Command::Leave);
                    match self.handle_command(command).await {
                        Ok(true) => {}
                        Ok(false) => break Ok(()),
                        Err(SessionError::Game(e)) => warn!("{:?} rejected: {}", command, e),
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        if self.room.state().room_id.is_empty() {
            self.events = None;
        } else {
            self.events = Some(events);
        }
        result
    }

    /// Apply a local command. Returns `false` once the session is over.
    pub async fn handle_command(&mut self, command: Command) -> Result<bool, SessionError> {
        debug!("Command {:?} in {}", command, self.room.room_id());
        let outbound = match command {
            Command::Start => {
                let state = self.room.state();
                let ai_words = if state.use_ai && self.room.is_host() {
                    let (language, difficulty) = (state.language, state.difficulty);
                    generate_words(&self.generator, language, difficulty).await
                } else {
                    None
                };
                self.room.start_game(ai_words, &mut self.rng)?
            }
            Command::Correct => self.room.correct_guess(&mut self.rng)?,
            Command::Skip => self.room.skip(&mut self.rng)?,
            Command::Leave => {
                self.leave().await;
                return Ok(false);
            }
        };
        self.broadcast(outbound).await?;
        self.sync_presence().await?;
        self.sync_timer();
        Ok(true)
    }

    /// Apply everything the channel has delivered without waiting for more.
    pub async fn process_pending(&mut self) -> Result<usize, SessionError> {
        let mut handled = 0;
        loop {
            let event = match self.events.as_mut() {
                Some(events) => match events.try_recv() {
                    Ok(event) => event,
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => ChannelEvent::Closed,
                },
                None => return Err(SessionError::NotConnected),
            };
            self.handle_channel_event(event).await?;
            handled += 1;
        }
        Ok(handled)
    }

    pub async fn handle_channel_event(&mut self, event: ChannelEvent) -> Result<(), SessionError> {
        let outbound = match event {
            ChannelEvent::Broadcast(envelope) => self.room.apply_message(&envelope),
            ChannelEvent::PresenceSync(members) => self.room.apply_presence(&members),
            ChannelEvent::Closed => {
                warn!("Channel for {} closed", self.room.room_id());
                self.timer = None;
                return Err(ChannelError::Closed.into());
            }
        };
        self.broadcast(outbound).await?;
        self.sync_presence().await?;
        self.sync_timer();
        Ok(())
    }

    /// One second of the round, only meaningful while we own the timer.
    pub async fn handle_tick(&mut self) -> Result<(), SessionError> {
        let outbound = match self.room.tick(&mut self.rng) {
            Ok(outbound) => outbound,
            Err(e) => {
                debug!("Tick ignored: {}", e);
                Vec::new()
            }
        };
        self.broadcast(outbound).await?;
        self.sync_presence().await?;
        self.sync_timer();
        Ok(())
    }

    /// Unsubscribe and forget the room.
    pub async fn leave(&mut self) {
        if let Err(e) = self.channel.unsubscribe().await {
            warn!("Failed to unsubscribe cleanly: {}", e);
        }
        self.timer = None;
        self.events = None;
        self.room.reset();
    }

    async fn broadcast(&mut self, messages: Vec<SyncMessage>) -> Result<(), ChannelError> {
        for message in messages {
            debug!("Broadcasting {} in {}", message.kind(), self.room.room_id());
            let envelope = self.room.envelope(message);
            self.channel.send(envelope).await?;
        }
        Ok(())
    }

    /// Re-track when our role no longer matches what presence says about us,
    /// so later joiners see the right host claim.
    async fn sync_presence(&mut self) -> Result<(), ChannelError> {
        if self.room.is_host() == self.announced_host {
            return Ok(());
        }
        let meta = self.room.presence_meta(Utc::now());
        info!(
            "Announcing host={} in {}",
            meta.is_host,
            self.room.room_id()
        );
        self.announced_host = meta.is_host;
        self.channel.track(meta).await
    }

    fn sync_timer(&mut self) {
        match (self.room.owns_timer(), self.timer.is_some()) {
            (true, false) => {
                let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.timer = Some(interval);
                debug!("Round timer started in {}", self.room.room_id());
            }
            (false, true) => {
                self.timer = None;
                debug!("Round timer stopped in {}", self.room.room_id());
            }
            _ => {}
        }
    }
}

async fn generate_words<G: WordGenerator>(
    generator: &G,
    language: Language,
    difficulty: Difficulty,
) -> Option<Vec<String>> {
    match generator.generate(language, difficulty).await {
        Ok(words) => Some(words),
        Err(e) => {
            warn!("Word generation failed, using built-in words: {}", e);
            None
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
