use alias_types::ServerFrame;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub topic: Option<String>,
    pub sender: mpsc::UnboundedSender<ServerFrame>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            connected_at: now,
            last_activity: now,
            topic: None,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_frame(&self, frame: ServerFrame) -> Result<(), String> {
        self.sender
            .send(frame)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Live websocket connections and their outgoing frame queues.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerFrame> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    /// Returns the topic the connection was subscribed to, if any.
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<String> {
        let mut connections = self.connections.write().await;
        connections.remove(&id).and_then(|conn| conn.topic)
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn set_connection_topic(&self, id: ConnectionId, topic: Option<String>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.topic = topic;
        }
    }

    pub async fn connection_topic(&self, id: ConnectionId) -> Option<String> {
        let connections = self.connections.read().await;
        connections.get(&id).and_then(|conn| conn.topic.clone())
    }

    pub async fn send_to_connection(&self, id: ConnectionId, frame: ServerFrame) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_frame(frame)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_many(&self, ids: &[ConnectionId], frame: ServerFrame) {
        let connections = self.connections.read().await;
        for id in ids {
            if let Some(connection) = connections.get(id) {
                let _ = connection.send_frame(frame.clone());
            }
        }
    }

    /// Drop connections idle for longer than `timeout`, returning what they
    /// were subscribed to so presence can be cleaned up.
    pub async fn cleanup_inactive_connections(
        &self,
        timeout: Duration,
    ) -> Vec<(ConnectionId, Option<String>)> {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        let mut removed = Vec::with_capacity(inactive_connections.len());
        for connection_id in inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            let topic = self.remove_connection(connection_id).await;
            removed.push((connection_id, topic));
        }
        removed
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_frame(message: &str) -> ServerFrame {
        ServerFrame::Error {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_connection_creation_and_removal() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let _receiver = manager.create_connection(conn_id).await;
        assert_eq!(manager.connection_count().await, 1);

        manager
            .set_connection_topic(conn_id, Some("room:ABCDEF".to_string()))
            .await;
        let topic = manager.remove_connection(conn_id).await;
        assert_eq!(topic.as_deref(), Some("room:ABCDEF"));
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_rapid_connect_disconnect_cycles() {
        let manager = ConnectionManager::new();
        let mut connections = Vec::new();

        for _ in 0..100 {
            let conn_id = ConnectionId::new();
            let _receiver = manager.create_connection(conn_id).await;
            connections.push(conn_id);
        }
        assert_eq!(manager.connection_count().await, 100);

        for conn_id in connections {
            manager.remove_connection(conn_id).await;
        }
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_activity_tracking_and_timeout() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();
        let _receiver = manager.create_connection(conn_id).await;
        manager
            .set_connection_topic(conn_id, Some("room:ABCDEF".to_string()))
            .await;

        let short_timeout = Duration::from_millis(10);
        assert!(manager.cleanup_inactive_connections(short_timeout).await.is_empty());
        assert_eq!(manager.connection_count().await, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = manager.cleanup_inactive_connections(short_timeout).await;
        assert_eq!(removed, vec![(conn_id, Some("room:ABCDEF".to_string()))]);
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_message_sending_to_nonexistent_connection() {
        let manager = ConnectionManager::new();
        let result = manager
            .send_to_connection(ConnectionId::new(), error_frame("test"))
            .await;
        assert_eq!(result.unwrap_err(), "Connection not found");
    }

    #[tokio::test]
    async fn test_message_sending_after_connection_close() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let receiver = manager.create_connection(conn_id).await;
        drop(receiver);

        let result = manager.send_to_connection(conn_id, error_frame("test")).await;
        assert_eq!(result.unwrap_err(), "Connection closed");
    }

    #[tokio::test]
    async fn test_send_to_many() {
        let manager = ConnectionManager::new();
        let conn_id1 = ConnectionId::new();
        let conn_id2 = ConnectionId::new();
        let conn_id3 = ConnectionId::new();

        let mut receiver1 = manager.create_connection(conn_id1).await;
        let mut receiver2 = manager.create_connection(conn_id2).await;
        let mut receiver3 = manager.create_connection(conn_id3).await;

        manager
            .send_to_many(&[conn_id1, conn_id3], error_frame("hello"))
            .await;

        assert!(receiver1.try_recv().is_ok());
        assert!(receiver2.try_recv().is_err());
        assert!(receiver3.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_connection_operations() {
        let manager = std::sync::Arc::new(ConnectionManager::new());
        let mut handles = Vec::new();

        for i in 0..50 {
            let manager_clone = manager.clone();
            let handle = tokio::spawn(async move {
                let conn_id = ConnectionId::new();
                let _receiver = manager_clone.create_connection(conn_id).await;

                tokio::time::sleep(Duration::from_millis(1)).await;

                manager_clone
                    .set_connection_topic(conn_id, Some(format!("room:ROOM{:02}", i)))
                    .await;
                manager_clone.remove_connection(conn_id).await;
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(manager.connection_count().await, 0);
    }
}
