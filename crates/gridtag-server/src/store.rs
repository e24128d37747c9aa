//! Document store boundary. Rooms and users live in single documents;
//! every mutation is an optimistic conditional write that reports whether
//! it matched anything. An unmatched write is expected control flow (the
//! room or player vanished under a concurrent handler), never an error.

use std::collections::HashMap;
use std::sync::RwLock;

use gridtag_core::room::RoomDoc;
use gridtag_core::team::{Team, TeamChoice};

/// Result of a conditional single-document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Matched,
    Unmatched,
}

impl UpdateOutcome {
    pub fn matched(self) -> bool {
        self == UpdateOutcome::Matched
    }
}

/// Persistent user record.
#[derive(Debug, Clone)]
pub struct UserDoc {
    pub username: String,
    pub session_token: String,
    pub avatar: Option<String>,
    pub wins: u64,
}

/// Room and user persistence as seen by the realtime handlers.
pub trait DocumentStore: Send + Sync {
    fn insert_room(&self, room: RoomDoc);
    fn find_room(&self, room_id: &str) -> Option<RoomDoc>;
    /// Rooms still in lobby state, for the room browser.
    fn rooms_in_lobby(&self) -> Vec<RoomDoc>;
    /// Rooms where the user appears in any roster or in-match record.
    fn rooms_with_member(&self, user: &str) -> Vec<RoomDoc>;
    fn delete_room(&self, room_id: &str) -> bool;

    /// Add a user to the unassigned roster of a lobby room.
    fn enroll_no_team(&self, room_id: &str, user: &str) -> UpdateOutcome;
    /// Apply a roster selection, atomically keeping membership exclusive
    /// across all three rosters. An unassigned choice moves the user
    /// back to the no-team roster.
    fn assign_team(&self, room_id: &str, user: &str, choice: TeamChoice) -> UpdateOutcome;
    /// Flip a lobby room into a started match: spawn in-match records,
    /// flag the opening taggers, set the attacking team. Matches only
    /// while the room has not already started.
    fn start_match(&self, room_id: &str, taggers: Team) -> UpdateOutcome;

    fn set_player_position(&self, room_id: &str, player: &str, x: f64, y: f64) -> UpdateOutcome;
    fn set_player_team(&self, room_id: &str, player: &str, team: Team) -> UpdateOutcome;
    fn set_attacking_team(&self, room_id: &str, team: Team) -> UpdateOutcome;
    fn flag_taggers(&self, room_id: &str, team: Team) -> UpdateOutcome;
    fn remove_player(&self, room_id: &str, player: &str) -> UpdateOutcome;
    fn remove_from_rosters(&self, room_id: &str, user: &str) -> UpdateOutcome;

    /// Resolve an opaque session token to a username.
    fn resolve_session(&self, token: &str) -> Option<String>;
    fn avatar(&self, user: &str) -> Option<String>;
    fn increment_wins(&self, user: &str) -> UpdateOutcome;
}

/// In-memory store backing a single server process.
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, RoomDoc>>,
    users: RwLock<HashMap<String, UserDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user account with a live session token.
    pub fn register_user(&self, username: &str, token: &str, avatar: Option<String>) {
        let mut users = write_guard(&self.users);
        users.insert(
            username.to_string(),
            UserDoc {
                username: username.to_string(),
                session_token: token.to_string(),
                avatar,
                wins: 0,
            },
        );
    }

    pub fn wins(&self, user: &str) -> Option<u64> {
        read_guard(&self.users).get(user).map(|u| u.wins)
    }

    fn update_room<F>(&self, room_id: &str, predicate: impl Fn(&RoomDoc) -> bool, f: F) -> UpdateOutcome
    where
        F: FnOnce(&mut RoomDoc),
    {
        let mut rooms = write_guard(&self.rooms);
        match rooms.get_mut(room_id) {
            Some(room) if predicate(room) => {
                f(room);
                UpdateOutcome::Matched
            }
            _ => UpdateOutcome::Unmatched,
        }
    }
}

fn read_guard<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_guard<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl DocumentStore for MemoryStore {
    fn insert_room(&self, room: RoomDoc) {
        write_guard(&self.rooms).insert(room.id.clone(), room);
    }

    fn find_room(&self, room_id: &str) -> Option<RoomDoc> {
        read_guard(&self.rooms).get(room_id).cloned()
    }

    fn rooms_in_lobby(&self) -> Vec<RoomDoc> {
        let mut rooms: Vec<RoomDoc> = read_guard(&self.rooms)
            .values()
            .filter(|r| !r.game_started)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    fn rooms_with_member(&self, user: &str) -> Vec<RoomDoc> {
        let mut rooms: Vec<RoomDoc> = read_guard(&self.rooms)
            .values()
            .filter(|r| r.is_member(user) || r.player(user).is_some())
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    fn delete_room(&self, room_id: &str) -> bool {
        write_guard(&self.rooms).remove(room_id).is_some()
    }

    fn enroll_no_team(&self, room_id: &str, user: &str) -> UpdateOutcome {
        self.update_room(room_id, |r| !r.game_started, |r| r.enroll(user))
    }

    fn assign_team(&self, room_id: &str, user: &str, choice: TeamChoice) -> UpdateOutcome {
        self.update_room(room_id, |r| !r.game_started, |r| r.choose_team(user, choice))
    }

    fn start_match(&self, room_id: &str, taggers: Team) -> UpdateOutcome {
        self.update_room(
            room_id,
            |r| !r.game_started,
            |r| {
                r.game_started = true;
                r.spawn_players();
                r.flag_taggers(taggers);
                r.attacking_team = Some(taggers);
            },
        )
    }

    fn set_player_position(&self, room_id: &str, player: &str, x: f64, y: f64) -> UpdateOutcome {
        self.update_room(
            room_id,
            |r| r.player(player).is_some(),
            |r| {
                if let Some(p) = r.player_mut(player) {
                    p.x = x;
                    p.y = y;
                }
            },
        )
    }

    fn set_player_team(&self, room_id: &str, player: &str, team: Team) -> UpdateOutcome {
        self.update_room(
            room_id,
            |r| r.player(player).is_some(),
            |r| {
                if let Some(p) = r.player_mut(player) {
                    p.team = team;
                }
            },
        )
    }

    fn set_attacking_team(&self, room_id: &str, team: Team) -> UpdateOutcome {
        self.update_room(room_id, |_| true, |r| r.attacking_team = Some(team))
    }

    fn flag_taggers(&self, room_id: &str, team: Team) -> UpdateOutcome {
        self.update_room(room_id, |_| true, |r| r.flag_taggers(team))
    }

    fn remove_player(&self, room_id: &str, player: &str) -> UpdateOutcome {
        self.update_room(
            room_id,
            |r| r.player(player).is_some(),
            |r| r.players.retain(|p| p.id != player),
        )
    }

    fn remove_from_rosters(&self, room_id: &str, user: &str) -> UpdateOutcome {
        let mut rooms = write_guard(&self.rooms);
        match rooms.get_mut(room_id) {
            Some(room) => {
                if room.remove_from_rosters(user) {
                    UpdateOutcome::Matched
                } else {
                    UpdateOutcome::Unmatched
                }
            }
            None => UpdateOutcome::Unmatched,
        }
    }

    fn resolve_session(&self, token: &str) -> Option<String> {
        read_guard(&self.users)
            .values()
            .find(|u| u.session_token == token)
            .map(|u| u.username.clone())
    }

    fn avatar(&self, user: &str) -> Option<String> {
        read_guard(&self.users).get(user).and_then(|u| u.avatar.clone())
    }

    fn increment_wins(&self, user: &str) -> UpdateOutcome {
        let mut users = write_guard(&self.users);
        match users.get_mut(user) {
            Some(doc) => {
                doc.wins += 1;
                UpdateOutcome::Matched
            }
            None => UpdateOutcome::Unmatched,
        }
    }
}
