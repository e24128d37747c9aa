//! Event fan-out to connected clients. Every connection registers a
//! bounded sender; channels (one per room, plus the lobby) are plain
//! membership sets. Frames are encoded once per broadcast and shared.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use gridtag_core::events::ServerEvent;

/// Channel name for clients browsing the room list.
pub const LOBBY_CHANNEL: &str = "lobby";

#[derive(Default)]
struct Inner {
    senders: HashMap<String, mpsc::Sender<Arc<str>>>,
    channels: HashMap<String, HashSet<String>>,
}

/// Process-wide registry of live connections and their channel membership.
#[derive(Default)]
pub struct Broadcaster {
    inner: Mutex<Inner>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a connection's outbound sender.
    pub fn register(&self, conn_id: &str, tx: mpsc::Sender<Arc<str>>) {
        self.lock().senders.insert(conn_id.to_string(), tx);
    }

    /// Drop a connection and every channel membership it held.
    pub fn unregister(&self, conn_id: &str) {
        let mut inner = self.lock();
        inner.senders.remove(conn_id);
        for members in inner.channels.values_mut() {
            members.remove(conn_id);
        }
        inner.channels.retain(|_, members| !members.is_empty());
    }

    pub fn join(&self, channel: &str, conn_id: &str) {
        self.lock()
            .channels
            .entry(channel.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    pub fn leave(&self, channel: &str, conn_id: &str) {
        let mut inner = self.lock();
        if let Some(members) = inner.channels.get_mut(channel) {
            members.remove(conn_id);
            if members.is_empty() {
                inner.channels.remove(channel);
            }
        }
    }

    /// Send an event to a single connection.
    pub fn send_to(&self, conn_id: &str, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };
        let inner = self.lock();
        if let Some(tx) = inner.senders.get(conn_id)
            && let Err(e) = tx.try_send(frame)
        {
            tracing::debug!(conn_id, error = %e, "Failed to send to connection (slow or disconnected)");
        }
    }

    /// Broadcast an event to every connection in a channel.
    pub fn broadcast(&self, channel: &str, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };
        let inner = self.lock();
        let Some(members) = inner.channels.get(channel) else {
            return;
        };
        for conn_id in members {
            if let Some(tx) = inner.senders.get(conn_id)
                && let Err(e) = tx.try_send(Arc::clone(&frame))
            {
                tracing::debug!(
                    conn_id, channel, error = %e,
                    "Skipping broadcast to slow client"
                );
            }
        }
    }
}

fn encode(event: &ServerEvent) -> Option<Arc<str>> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::from(json.as_str())),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to encode server event");
            None
        }
    }
}
