//! The round scheduler: one task per started match driving
//! prep countdown, active round, tally, tagger rotation, and teardown.
//! The task never holds a lock while sleeping; each transition re-reads
//! the room and aborts cleanly if it vanished.

use std::time::Duration;

use gridtag_core::events::ServerEvent;
use gridtag_core::team::{RoundWinner, Team};

use crate::broadcast::LOBBY_CHANNEL;
use crate::lobby::{broadcast_room_list, player_views};
use crate::state::AppState;
use crate::store::DocumentStore;

/// Owner-only trigger that flips a lobby room into a running match and
/// spawns its round loop.
pub fn handle_start_game(state: &AppState, user: &str, room_id: &str) {
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    if room.owner != user {
        tracing::debug!(user, room_id, "Non-owner attempted to start the game");
        return;
    }

    let taggers = if rand::random_bool(0.5) {
        Team::Red
    } else {
        Team::Blue
    };
    // Unmatched here means another handler already started this room.
    if !state.store.start_match(room_id, taggers).matched() {
        return;
    }
    let Some(room) = state.store.find_room(room_id) else {
        return;
    };
    tracing::info!(room_id, %taggers, "Match started");
    state.positions.resync(room_id, &room.players);

    let b = &state.broadcaster;
    b.broadcast(room_id, &ServerEvent::GameStarted);
    b.broadcast(room_id, &ServerEvent::LoadTerrain {
        terrain: room.terrain.clone(),
    });
    b.broadcast(room_id, &ServerEvent::PlayerPositions(player_views(state, &room)));
    // The room just left the lobby listing.
    broadcast_room_list(state);

    tokio::spawn(run_round_system(state.clone(), room_id.to_string(), taggers));
}

async fn run_round_system(state: AppState, room_id: String, mut taggers: Team) {
    let token = state.timers.token_for(&room_id);
    let rules = state.config.match_rules;
    let mut round: u32 = 1;

    loop {
        // Prep countdown, one tick per second.
        for seconds in (1..=rules.prep_seconds).rev() {
            if state.store.find_room(&room_id).is_none() {
                return;
            }
            state.broadcaster.broadcast(&room_id, &ServerEvent::RoundPrep {
                seconds,
                next_round: round,
                taggers,
            });
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            }
        }

        if state.store.find_room(&room_id).is_none() {
            return;
        }
        state.broadcaster.broadcast(&room_id, &ServerEvent::RoundStart {
            round,
            taggers,
            duration: rules.round_seconds,
        });
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_secs(rules.round_seconds)) => {}
        }

        let Some(room) = state.store.find_room(&room_id) else {
            return;
        };
        let (red, blue) = room.team_tally();
        let winner = RoundWinner::from_tally(red, blue);
        tracing::info!(room_id, round, red, blue, ?winner, "Round ended");
        state
            .broadcaster
            .broadcast(&room_id, &ServerEvent::RoundEnd { round, winner });

        if round >= rules.max_rounds {
            state
                .broadcaster
                .broadcast(&room_id, &ServerEvent::MatchOver { winner, red, blue });
            if let Some(team) = winner.team() {
                for player in room.players.iter().filter(|p| p.team == team) {
                    if !state.store.increment_wins(&player.id).matched() {
                        tracing::debug!(player = %player.id, "No win record for player");
                    }
                }
                state
                    .broadcaster
                    .broadcast(LOBBY_CHANNEL, &ServerEvent::LeaderboardUpdated);
            }
            teardown(&state, &room_id);
            return;
        }

        taggers = taggers.opponent();
        state.store.flag_taggers(&room_id, taggers);
        state.store.set_attacking_team(&room_id, taggers);
        round += 1;
    }
}

/// Delete a concluded match and everything hanging off it.
fn teardown(state: &AppState, room_id: &str) {
    state.store.delete_room(room_id);
    state.timers.cancel_room(room_id);
    state.positions.clear_room(room_id);
    state.status.clear_room(room_id);
    tracing::info!(room_id, "Match concluded, room deleted");
}
