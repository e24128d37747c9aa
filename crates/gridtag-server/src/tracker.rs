//! In-memory per-room caches: player positions and alive/dead status.
//! Each cache sits behind one process-wide lock; handlers hold it only
//! for the brief mutation, never across an await.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use gridtag_core::room::PlayerRecord;

/// Last committed position per player, per room. Ordered by player id so
/// tag scans resolve ties deterministically.
#[derive(Default)]
pub struct PositionCache {
    rooms: Mutex<HashMap<String, BTreeMap<String, (f64, f64)>>>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BTreeMap<String, (f64, f64)>>> {
        self.rooms
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Replace the whole room entry from the authoritative player list.
    /// Full resync tolerates concurrent roster churn between moves.
    pub fn resync(&self, room_id: &str, players: &[PlayerRecord]) {
        let entry = players
            .iter()
            .map(|p| (p.id.clone(), (p.x, p.y)))
            .collect();
        self.lock().insert(room_id.to_string(), entry);
    }

    pub fn snapshot(&self, room_id: &str) -> BTreeMap<String, (f64, f64)> {
        self.lock().get(room_id).cloned().unwrap_or_default()
    }

    pub fn remove_player(&self, room_id: &str, player: &str) {
        if let Some(entry) = self.lock().get_mut(room_id) {
            entry.remove(player);
        }
    }

    pub fn clear_room(&self, room_id: &str) {
        self.lock().remove(room_id);
    }
}

/// Alive/dead state of one in-match player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    Alive,
    Dead { tagger: String },
}

/// Alive/dead status per player, per room. Not persisted; a restart
/// loses mid-round tag state, which is acceptable for an ephemeral match.
#[derive(Default)]
pub struct StatusMap {
    rooms: Mutex<HashMap<String, HashMap<String, PlayerStatus>>>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HashMap<String, PlayerStatus>>> {
        self.rooms
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn is_dead(&self, room_id: &str, player: &str) -> bool {
        matches!(
            self.lock().get(room_id).and_then(|m| m.get(player)),
            Some(PlayerStatus::Dead { .. })
        )
    }

    /// Mark a player dead, recording who tagged them. Returns false if
    /// they were already dead (a concurrent tag won).
    pub fn mark_dead(&self, room_id: &str, player: &str, tagger: &str) -> bool {
        let mut rooms = self.lock();
        let entry = rooms.entry(room_id.to_string()).or_default();
        match entry.get(player) {
            Some(PlayerStatus::Dead { .. }) => false,
            _ => {
                entry.insert(
                    player.to_string(),
                    PlayerStatus::Dead {
                        tagger: tagger.to_string(),
                    },
                );
                true
            }
        }
    }

    pub fn mark_alive(&self, room_id: &str, player: &str) {
        self.lock()
            .entry(room_id.to_string())
            .or_default()
            .insert(player.to_string(), PlayerStatus::Alive);
    }

    /// Who tagged this player, if they are currently dead.
    pub fn tagger_of(&self, room_id: &str, player: &str) -> Option<String> {
        match self.lock().get(room_id).and_then(|m| m.get(player)) {
            Some(PlayerStatus::Dead { tagger }) => Some(tagger.clone()),
            _ => None,
        }
    }

    pub fn remove_player(&self, room_id: &str, player: &str) {
        if let Some(entry) = self.lock().get_mut(room_id) {
            entry.remove(player);
        }
    }

    pub fn clear_room(&self, room_id: &str) {
        self.lock().remove(room_id);
    }
}
