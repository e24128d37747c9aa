//! In-match event handlers: movement resolution, tag detection, and the
//! timed respawn path.

use std::time::Duration;

use gridtag_core::events::ServerEvent;
use gridtag_core::movement::{DirectionFlags, MoveOutcome, resolve_move};
use gridtag_core::room::RoomDoc;

use crate::lobby::player_views;
use crate::state::AppState;
use crate::store::DocumentStore;

pub fn handle_request_positions(state: &AppState, conn_id: &str, room_id: &str) {
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    state
        .broadcaster
        .send_to(conn_id, &ServerEvent::PlayerPositions(player_views(state, &room)));
}

/// Resolve one movement intent end to end: apply the displacement,
/// persist it, resync the position cache, run tag detection, and
/// broadcast the committed move.
pub fn handle_move(state: &AppState, room_id: &str, player: &str, dir: DirectionFlags) {
    // Dead players are frozen until respawn.
    if state.status.is_dead(room_id, player) {
        return;
    }
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    if !room.game_started {
        return;
    }
    let Some(record) = room.player(player) else {
        return;
    };

    let (x, y) = match resolve_move(&room.terrain, record.team, record.x, record.y, dir) {
        MoveOutcome::Moved { x, y } => (x, y),
        MoveOutcome::Rejected => return,
    };

    // Zero-match write means the room or player vanished concurrently.
    if !state.store.set_player_position(room_id, player, x, y).matched() {
        return;
    }
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    // Full resync rather than a point update, so entries for players that
    // joined or left since the last move are corrected too.
    state.positions.resync(room_id, &room.players);

    resolve_tag(state, &room, player, x, y);

    state
        .broadcaster
        .broadcast(room_id, &ServerEvent::PlayerMoved {
            id: player.to_string(),
            x,
            y,
        });
}

/// Scan for a tag around the mover's committed position. At most one tag
/// per move; candidates are visited in player-id order, so the lowest id
/// wins when several enemies are in range.
fn resolve_tag(state: &AppState, room: &RoomDoc, mover: &str, x: f64, y: f64) {
    let Some(attacking) = room.attacking_team else {
        return;
    };
    let Some(mover_team) = room.player(mover).map(|p| p.team) else {
        return;
    };

    for (other, &(ox, oy)) in &state.positions.snapshot(&room.id) {
        if other == mover || state.status.is_dead(&room.id, other) {
            continue;
        }
        if (x - ox).abs() > 1.0 || (y - oy).abs() > 1.0 {
            continue;
        }
        let Some(other_team) = room.player(other).map(|p| p.team) else {
            continue;
        };
        if other_team == mover_team {
            continue;
        }
        // Opposing teams: exactly one side is attacking. The mover may be
        // the victim when they walk into a tagger.
        let (tagger, target) = if mover_team == attacking {
            (mover.to_string(), other.clone())
        } else {
            (other.clone(), mover.to_string())
        };
        if !state.status.mark_dead(&room.id, &target, &tagger) {
            continue;
        }
        tracing::debug!(room_id = %room.id, %tagger, %target, "Player tagged");
        state
            .broadcaster
            .broadcast(&room.id, &ServerEvent::PlayerTagged {
                tagger,
                target: target.clone(),
            });
        schedule_respawn(state.clone(), room.id.clone(), target);
        break;
    }
}

/// Bring a dead player back after the configured delay. Cancelled
/// outright if the room is torn down first.
pub fn schedule_respawn(state: AppState, room_id: String, victim: String) {
    let token = state.timers.token_for(&room_id);
    let delay = Duration::from_secs(state.config.match_rules.respawn_seconds);
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => respawn_player(&state, &room_id, &victim),
        }
    });
}

/// The victim rejoins on the tagger's *current* team, read fresh from the
/// store. The tagger's team may have flipped since the tag; the victim
/// follows wherever they are now.
fn respawn_player(state: &AppState, room_id: &str, victim: &str) {
    let Some(tagger) = state.status.tagger_of(room_id, victim) else {
        return;
    };
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    let Some(new_team) = room.player(&tagger).map(|p| p.team) else {
        return;
    };
    if !state.store.set_player_team(room_id, victim, new_team).matched() {
        return;
    }
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    state.positions.resync(room_id, &room.players);
    state
        .broadcaster
        .broadcast(room_id, &ServerEvent::PlayerPositions(player_views(state, &room)));
    state.status.mark_alive(room_id, victim);
    state
        .broadcaster
        .broadcast(room_id, &ServerEvent::PlayerRespawned {
            player: victim.to_string(),
        });
}
