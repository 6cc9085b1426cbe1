use alias_types::{ChannelError, ClientFrame, Envelope, PresenceMeta, ServerFrame};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};

use super::{ChannelEvent, RoomChannel};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Channel backed by the relay server over a websocket.
///
/// One connection is opened per subscription; a writer task drains the
/// outgoing frame queue and a reader task turns relay frames into
/// [`ChannelEvent`]s.
pub struct WsChannel {
    url: String,
    outgoing: Option<mpsc::UnboundedSender<ClientFrame>>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl WsChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outgoing: None,
            writer: None,
            reader: None,
        }
    }

    fn queue(&self, frame: ClientFrame) -> Result<(), ChannelError> {
        let outgoing = self.outgoing.as_ref().ok_or(ChannelError::NotSubscribed)?;
        outgoing.send(frame).map_err(|_| ChannelError::Closed)
    }

    fn shutdown(&mut self) {
        self.outgoing = None;
        for task in [self.writer.take(), self.reader.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

#[async_trait]
impl RoomChannel for WsChannel {
    async fn subscribe(
        &mut self,
        topic: &str,
    ) -> Result<mpsc::UnboundedReceiver<ChannelEvent>, ChannelError> {
        self.shutdown();

        let (ws_stream, _) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| ChannelError::SubscribeFailed {
                    reason: e.to_string(),
                })?;
        info!("Connected to relay at {}", self.url);

        let (mut write, mut read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientFrame>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = oneshot::channel::<Result<(), String>>();

        let writer = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;
            loop {
                let frame = tokio::select! {
                    frame = out_rx.recv() => match frame {
                        Some(frame) => frame,
                        None => break,
                    },
                    _ = heartbeat.tick() => ClientFrame::Heartbeat,
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to serialize frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::text(text)).await {
                    warn!("WebSocket write error: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        let reader = tokio::spawn(async move {
            let mut ack = Some(ack_tx);
            while let Some(message) = read.next().await {
                let text = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the connection");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("WebSocket read error: {}", e);
                        break;
                    }
                };

                let frame = match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Unreadable relay frame: {}", e);
                        continue;
                    }
                };

                let event = match frame {
                    ServerFrame::Subscribed { topic } => {
                        debug!("Subscribed to {}", topic);
                        if let Some(ack) = ack.take() {
                            let _ = ack.send(Ok(()));
                        }
                        continue;
                    }
                    ServerFrame::Error { message } => {
                        match ack.take() {
                            Some(ack) => {
                                let _ = ack.send(Err(message));
                            }
                            None => warn!("Relay error: {}", message),
                        }
                        continue;
                    }
                    ServerFrame::Broadcast { envelope } => ChannelEvent::Broadcast(envelope),
                    ServerFrame::PresenceSync { members } => ChannelEvent::PresenceSync(members),
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            let _ = event_tx.send(ChannelEvent::Closed);
        });

        self.outgoing = Some(out_tx);
        self.writer = Some(writer);
        self.reader = Some(reader);

        self.queue(ClientFrame::Subscribe {
            topic: topic.to_string(),
        })?;

        let acknowledged = tokio::time::timeout(SUBSCRIBE_TIMEOUT, ack_rx).await;
        match acknowledged {
            Ok(Ok(Ok(()))) => Ok(event_rx),
            Ok(Ok(Err(reason))) => {
                self.shutdown();
                Err(ChannelError::SubscribeFailed { reason })
            }
            Ok(Err(_)) => {
                self.shutdown();
                Err(ChannelError::Closed)
            }
            Err(_) => {
                self.shutdown();
                Err(ChannelError::SubscribeFailed {
                    reason: "relay did not acknowledge".to_string(),
                })
            }
        }
    }

    async fn track(&mut self, meta: PresenceMeta) -> Result<(), ChannelError> {
        self.queue(ClientFrame::Track { meta })
            .map_err(|e| ChannelError::TrackFailed {
                reason: e.to_string(),
            })
    }

    async fn send(&mut self, envelope: Envelope) -> Result<(), ChannelError> {
        self.queue(ClientFrame::Broadcast { envelope })
    }

    async fn unsubscribe(&mut self) -> Result<(), ChannelError> {
        if self.outgoing.is_some() {
            let _ = self.queue(ClientFrame::Unsubscribe);
            // Closing the queue lets the writer flush and close the socket.
            self.outgoing = None;
            if let Some(writer) = self.writer.take() {
                let _ = tokio::time::timeout(FLUSH_TIMEOUT, writer).await;
            }
        }
        self.shutdown();
        Ok(())
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
