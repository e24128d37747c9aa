//! Cancellable per-room timer handles. Every timed task (round loop,
//! respawns) selects on the room's token so deleting a room stops its
//! pending timers instead of leaving them to fire against nothing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct RoomTimers {
    tokens: Mutex<HashMap<String, CancellationToken>>,
}

impl RoomTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Token for a room's timed tasks, created on first use.
    pub fn token_for(&self, room_id: &str) -> CancellationToken {
        self.lock()
            .entry(room_id.to_string())
            .or_default()
            .clone()
    }

    /// Cancel every pending timer for a room and drop its handle.
    pub fn cancel_room(&self, room_id: &str) {
        if let Some(token) = self.lock().remove(room_id) {
            token.cancel();
        }
    }
}
