//! Lobby-side event handlers: room browsing, creation, joining, and team
//! selection. Every failure path is a silent no-op; most causes are
//! benign races with players leaving mid-action.

use gridtag_core::events::{PlayerView, RoomSummary, ServerEvent};
use gridtag_core::room::RoomDoc;
use gridtag_core::team::TeamChoice;

use crate::broadcast::LOBBY_CHANNEL;
use crate::state::AppState;
use crate::store::DocumentStore;

/// Build the enriched position listing for a room: stored avatar if the
/// player uploaded one, else the team default.
pub fn player_views(state: &AppState, room: &RoomDoc) -> Vec<PlayerView> {
    room.players
        .iter()
        .map(|p| PlayerView {
            id: p.id.clone(),
            x: p.x,
            y: p.y,
            team: p.team,
            avatar: p
                .avatar
                .clone()
                .or_else(|| state.store.avatar(&p.id))
                .unwrap_or_else(|| p.team.default_avatar().to_string()),
        })
        .collect()
}

fn room_summaries(state: &AppState) -> Vec<RoomSummary> {
    state
        .store
        .rooms_in_lobby()
        .into_iter()
        .map(|r| RoomSummary {
            id: r.id,
            name: r.room_name,
        })
        .collect()
}

/// Rebroadcast the room browser listing to everyone in the lobby.
pub fn broadcast_room_list(state: &AppState) {
    state
        .broadcaster
        .broadcast(LOBBY_CHANNEL, &ServerEvent::RoomList(room_summaries(state)));
}

fn broadcast_rosters(state: &AppState, room: &RoomDoc) {
    let b = &state.broadcaster;
    b.broadcast(&room.id, &ServerEvent::TeamRedList(room.red_team.clone()));
    b.broadcast(&room.id, &ServerEvent::TeamBlueList(room.blue_team.clone()));
    b.broadcast(&room.id, &ServerEvent::NoTeamList(room.no_team.clone()));
    b.broadcast(
        &room.id,
        &ServerEvent::TeamCounts {
            red: room.red_team.len(),
            blue: room.blue_team.len(),
        },
    );
}

/// A client entered the room browser.
pub fn handle_lobby_ready(state: &AppState, conn_id: &str) {
    state.broadcaster.join(LOBBY_CHANNEL, conn_id);
    state
        .broadcaster
        .send_to(conn_id, &ServerEvent::RoomList(room_summaries(state)));
}

/// Explicit room list refresh.
pub fn handle_get_rooms(state: &AppState, conn_id: &str) {
    state
        .broadcaster
        .send_to(conn_id, &ServerEvent::RoomList(room_summaries(state)));
}

fn acceptable_room_name(name: &str, max_len: usize) -> bool {
    !name.is_empty() && name.len() <= max_len && !name.chars().any(char::is_control)
}

pub fn handle_create_room(state: &AppState, user: &str, room_name: &str) {
    let name = room_name.trim();
    if !acceptable_room_name(name, state.config.limits.max_room_name_len) {
        tracing::debug!(user, "Rejected room name");
        return;
    }
    let room = RoomDoc::create(name, user);
    tracing::info!(user, room_id = %room.id, room_name = name, "Room created");
    state.store.insert_room(room);
    broadcast_room_list(state);
}

/// A client entered a room page. In lobby state this enrolls them on the
/// unassigned roster; in a started match it replays the terrain and
/// current positions to the new socket. Returns the joined room id.
pub fn handle_join_room(
    state: &AppState,
    conn_id: &str,
    user: &str,
    room_id: &str,
) -> Option<String> {
    let room = state.store.find_room(room_id)?;
    state.broadcaster.join(room_id, conn_id);

    if room.game_started {
        // Mid-match rejoin: only existing players get state replayed.
        if room.player(user).is_none() {
            state.broadcaster.leave(room_id, conn_id);
            return None;
        }
        state.broadcaster.send_to(
            conn_id,
            &ServerEvent::LoadTerrain {
                terrain: room.terrain.clone(),
            },
        );
        state
            .broadcaster
            .send_to(conn_id, &ServerEvent::PlayerPositions(player_views(state, &room)));
        return Some(room_id.to_string());
    }

    if !state.store.enroll_no_team(room_id, user).matched() {
        state.broadcaster.leave(room_id, conn_id);
        return None;
    }
    let Some(room) = state.store.find_room(room_id) else {
        return None;
    };
    broadcast_rosters(state, &room);
    state.broadcaster.send_to(
        conn_id,
        &ServerEvent::OwnerStatus {
            is_owner: room.owner == user,
        },
    );
    Some(room_id.to_string())
}

/// Apply a roster selection. A choice that is not a real team returns
/// the user to the unassigned roster.
pub fn handle_join_team(
    state: &AppState,
    conn_id: &str,
    user: &str,
    room_id: &str,
    choice: TeamChoice,
) {
    if !state.store.assign_team(room_id, user, choice).matched() {
        return;
    }
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    broadcast_rosters(state, &room);
    state.broadcaster.send_to(
        conn_id,
        &ServerEvent::JoinedTeam {
            room_id: room_id.to_string(),
            team: choice,
        },
    );
}

/// A vanished room answers false rather than not at all.
pub fn handle_am_i_owner(state: &AppState, conn_id: &str, user: &str, room_id: &str) {
    let is_owner = state
        .store
        .find_room(room_id)
        .is_some_and(|room| room.owner == user);
    state
        .broadcaster
        .send_to(conn_id, &ServerEvent::OwnerStatus { is_owner });
}

/// A client's transport session ended. Pull them out of every room they
/// were in and tear down rooms left empty.
pub fn handle_disconnect(state: &AppState, conn_id: &str, user: &str) {
    let rooms = state.store.rooms_with_member(user);
    for room in rooms {
        state.store.remove_from_rosters(&room.id, user);
        state.store.remove_player(&room.id, user);
        state.positions.remove_player(&room.id, user);
        state.status.remove_player(&room.id, user);

        let Some(room) = state.store.find_room(&room.id) else {
            continue;
        };
        let empty = room.players.is_empty()
            && room.red_team.is_empty()
            && room.blue_team.is_empty()
            && room.no_team.is_empty();
        if empty {
            tracing::info!(room_id = %room.id, "Deleting empty room");
            state.store.delete_room(&room.id);
            state.timers.cancel_room(&room.id);
            state.positions.clear_room(&room.id);
            state.status.clear_room(&room.id);
        } else {
            state
                .broadcaster
                .broadcast(&room.id, &ServerEvent::PlayerLeft { id: user.to_string() });
            broadcast_rosters(state, &room);
        }
    }
    broadcast_room_list(state);
    state.broadcaster.unregister(conn_id);
}
