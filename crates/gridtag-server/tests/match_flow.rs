//! End-to-end match flow driven through the realtime handlers with an
//! in-memory store and captured broadcasts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use gridtag_core::movement::DirectionFlags;
use gridtag_core::team::{Team, TeamChoice};

use gridtag_server::config::ServerConfig;
use gridtag_server::state::AppState;
use gridtag_server::store::{DocumentStore, MemoryStore};
use gridtag_server::{arena, lobby, match_loop};

struct Harness {
    state: AppState,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new(users: &[&str]) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_store(Arc::<MemoryStore>::clone(&store), ServerConfig::default());
        for user in users {
            store.register_user(user, &format!("tok-{user}"), None);
        }
        Harness { state, store }
    }

    fn connect(&self, conn_id: &str) -> mpsc::Receiver<Arc<str>> {
        let (tx, rx) = mpsc::channel(256);
        self.state.broadcaster.register(conn_id, tx);
        rx
    }

    /// Create a room and assign each user to a team through the lobby
    /// handlers, returning the room id.
    fn lobby_flow(&self, teams: &[(&str, Team)]) -> String {
        let owner = teams[0].0;
        lobby::handle_create_room(&self.state, owner, "arena");
        let room_id = self.store.rooms_in_lobby()[0].id.clone();
        for (i, &(user, team)) in teams.iter().enumerate() {
            let conn = format!("conn-{i}");
            assert!(lobby::handle_join_room(&self.state, &conn, user, &room_id).is_some());
            lobby::handle_join_team(&self.state, &conn, user, &room_id, team.into());
        }
        room_id
    }

    fn place(&self, room_id: &str, player: &str, x: f64, y: f64) {
        self.store.set_player_position(room_id, player, x, y);
        let room = self.store.find_room(room_id).unwrap();
        self.state.positions.resync(room_id, &room.players);
    }
}

fn drain(rx: &mut mpsc::Receiver<Arc<str>>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame.to_string());
    }
    frames
}

fn right() -> DirectionFlags {
    DirectionFlags {
        right: true,
        ..DirectionFlags::default()
    }
}

#[tokio::test]
async fn lobby_flow_starts_a_match_with_spawned_players() {
    let h = Harness::new(&["alice", "bob"]);
    let mut rx = h.connect("conn-0");
    let room_id = h.lobby_flow(&[("alice", Team::Red), ("bob", Team::Blue)]);
    h.state.broadcaster.join(&room_id, "conn-0");
    drain(&mut rx);

    match_loop::handle_start_game(&h.state, "alice", &room_id);

    let room = h.store.find_room(&room_id).unwrap();
    assert!(room.game_started);
    assert!(room.attacking_team.is_some());
    let alice = room.player("alice").unwrap();
    assert_eq!((alice.x, alice.y), (1.0, 1.0));
    let bob = room.player("bob").unwrap();
    assert_eq!((bob.x, bob.y), (29.0, 19.0));

    let frames = drain(&mut rx);
    assert!(frames.iter().any(|f| f.contains("game_started")));
    assert!(frames.iter().any(|f| f.contains("load_terrain")));
    assert!(frames.iter().any(|f| f.contains("player_positions")));
}

#[tokio::test(start_paused = true)]
async fn tag_then_respawn_on_the_taggers_team() {
    let h = Harness::new(&["alice", "bob"]);
    let room_id = h.lobby_flow(&[("alice", Team::Red), ("bob", Team::Blue)]);
    match_loop::handle_start_game(&h.state, "alice", &room_id);

    // Whoever opened as attacker does the walking.
    let room = h.store.find_room(&room_id).unwrap();
    let attacking = room.attacking_team.unwrap();
    let (attacker, defender) = if attacking == Team::Red {
        ("alice", "bob")
    } else {
        ("bob", "alice")
    };
    h.place(&room_id, attacker, 5.0, 5.0);
    h.place(&room_id, defender, 6.0, 5.0);
    let mut rx = h.connect("watcher");
    h.state.broadcaster.join(&room_id, "watcher");

    arena::handle_move(&h.state, &room_id, attacker, right());

    assert!(h.state.status.is_dead(&room_id, defender));
    let frames = drain(&mut rx);
    assert!(frames.iter().any(|f| {
        f.contains("player_tagged")
            && f.contains(&format!("\"tagger\":\"{attacker}\""))
            && f.contains(&format!("\"target\":\"{defender}\""))
    }));

    // Dead players are frozen.
    let before = h.store.find_room(&room_id).unwrap().player(defender).unwrap().x;
    arena::handle_move(&h.state, &room_id, defender, right());
    let after = h.store.find_room(&room_id).unwrap().player(defender).unwrap().x;
    assert_eq!(before, after);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!h.state.status.is_dead(&room_id, defender));
    let room = h.store.find_room(&room_id).unwrap();
    assert_eq!(room.player(defender).unwrap().team, attacking);
    assert!(drain(&mut rx).iter().any(|f| f.contains("player_respawned")));
}

#[tokio::test(start_paused = true)]
async fn full_match_concludes_and_persists_wins() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let mut rx = h.connect("conn-0");
    let room_id = h.lobby_flow(&[
        ("alice", Team::Red),
        ("bob", Team::Red),
        ("carol", Team::Blue),
    ]);
    h.state.broadcaster.join(&room_id, "conn-0");
    h.state.broadcaster.join("lobby", "conn-0");
    match_loop::handle_start_game(&h.state, "alice", &room_id);
    drain(&mut rx);

    tokio::time::sleep(Duration::from_secs(140)).await;

    // Red outnumbers blue in both rounds; both red members gain a win.
    assert_eq!(h.store.wins("alice"), Some(1));
    assert_eq!(h.store.wins("bob"), Some(1));
    assert_eq!(h.store.wins("carol"), Some(0));
    assert!(h.store.find_room(&room_id).is_none());

    let frames = drain(&mut rx);
    assert_eq!(frames.iter().filter(|f| f.contains("round_end")).count(), 2);
    assert!(frames.iter().any(|f| f.contains("match_over")));
    assert!(frames.iter().any(|f| f.contains("leaderboard_updated")));
}

#[tokio::test(start_paused = true)]
async fn pending_respawn_is_cancelled_with_the_room() {
    let h = Harness::new(&["alice", "bob"]);
    let room_id = h.lobby_flow(&[("alice", Team::Red), ("bob", Team::Blue)]);
    match_loop::handle_start_game(&h.state, "alice", &room_id);
    let attacking = h.store.find_room(&room_id).unwrap().attacking_team.unwrap();
    let (attacker, defender) = if attacking == Team::Red {
        ("alice", "bob")
    } else {
        ("bob", "alice")
    };
    h.place(&room_id, attacker, 5.0, 5.0);
    h.place(&room_id, defender, 6.0, 5.0);
    arena::handle_move(&h.state, &room_id, attacker, right());
    assert!(h.state.status.is_dead(&room_id, defender));

    // Match ends (or room is abandoned) before the respawn delay elapses.
    h.store.delete_room(&room_id);
    h.state.timers.cancel_room(&room_id);
    h.state.status.clear_room(&room_id);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!h.state.status.is_dead(&room_id, defender));
    assert!(h.store.find_room(&room_id).is_none());
}

#[tokio::test]
async fn roster_moves_are_mutually_exclusive_end_to_end() {
    let h = Harness::new(&["alice", "bob"]);
    let room_id = h.lobby_flow(&[("alice", Team::Red), ("bob", Team::Blue)]);

    lobby::handle_join_team(&h.state, "conn-1", "bob", &room_id, TeamChoice::Red);
    let room = h.store.find_room(&room_id).unwrap();
    assert_eq!(room.red_team, vec!["alice", "bob"]);
    assert!(room.blue_team.is_empty());
    assert!(room.no_team.is_empty());

    lobby::handle_join_team(&h.state, "conn-1", "bob", &room_id, TeamChoice::Unassigned);
    let room = h.store.find_room(&room_id).unwrap();
    assert_eq!(room.red_team, vec!["alice"]);
    assert_eq!(room.no_team, vec!["bob"]);
}
