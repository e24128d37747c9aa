//! Wire-level event types. Every realtime frame is a JSON object with an
//! `event` name and an optional `data` payload.

use serde::{Deserialize, Serialize};

use crate::movement::DirectionFlags;
use crate::team::{RoundWinner, Team, TeamChoice};
use crate::terrain::Terrain;

/// One entry in a `player_positions` broadcast, avatar already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub team: Team,
    pub avatar: String,
}

/// One entry in a `room_list` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
}

/// Events the server emits to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    PlayerPositions(Vec<PlayerView>),
    LoadTerrain { terrain: Terrain },
    PlayerMoved { id: String, x: f64, y: f64 },
    PlayerTagged { tagger: String, target: String },
    PlayerRespawned { player: String },
    PlayerLeft { id: String },
    TeamRedList(Vec<String>),
    TeamBlueList(Vec<String>),
    NoTeamList(Vec<String>),
    TeamCounts { red: usize, blue: usize },
    RoomList(Vec<RoomSummary>),
    OwnerStatus { is_owner: bool },
    JoinedTeam { room_id: String, team: TeamChoice },
    GameStarted,
    RoundPrep { seconds: u64, next_round: u32, taggers: Team },
    RoundStart { round: u32, taggers: Team, duration: u64 },
    RoundEnd { round: u32, winner: RoundWinner },
    MatchOver { winner: RoundWinner, red: usize, blue: usize },
    LeaderboardUpdated,
}

/// Events clients send to the server. Unknown payload fields are ignored
/// so older clients keep working.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
    },
    Move {
        #[serde(rename = "roomId")]
        room_id: String,
        direction: DirectionFlags,
    },
    RequestPositions,
    CreateRoom {
        room_name: String,
    },
    JoinTeam {
        team: TeamChoice,
        room_id: String,
    },
    StartGame {
        room_id: String,
    },
    GetRooms,
    LobbyReady,
    AmIOwner {
        room_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_events_carry_event_and_data() {
        let frame = serde_json::to_value(ServerEvent::PlayerMoved {
            id: "alice".into(),
            x: 5.1,
            y: 3.0,
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({"event": "player_moved", "data": {"id": "alice", "x": 5.1, "y": 3.0}})
        );
    }

    #[test]
    fn unit_events_omit_data() {
        let frame = serde_json::to_value(ServerEvent::GameStarted).unwrap();
        assert_eq!(frame, json!({"event": "game_started"}));
    }

    #[test]
    fn round_events_name_the_attacking_team() {
        let frame = serde_json::to_value(ServerEvent::RoundPrep {
            seconds: 3,
            next_round: 2,
            taggers: Team::Blue,
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({"event": "round_prep", "data": {"seconds": 3, "next_round": 2, "taggers": "blue"}})
        );
    }

    #[test]
    fn client_move_uses_arrow_key_names() {
        let frame = json!({
            "event": "move",
            "data": {
                "roomId": "r1",
                "direction": {"ArrowUp": true, "ArrowRight": true}
            }
        });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        let ClientEvent::Move { room_id, direction } = event else {
            panic!("wrong variant");
        };
        assert_eq!(room_id, "r1");
        assert!(direction.up && direction.right);
        assert!(!direction.down && !direction.left);
    }

    #[test]
    fn join_team_tolerates_unknown_team_names() {
        let frame = json!({
            "event": "join_team",
            "data": {"team": "spectator", "room_id": "r1"}
        });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinTeam {
                team: TeamChoice::Unassigned,
                room_id: "r1".into(),
            }
        );
    }

    #[test]
    fn client_unit_events_parse_without_data() {
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "get_rooms"})).unwrap();
        assert_eq!(event, ClientEvent::GetRooms);
    }

    #[test]
    fn unknown_client_event_is_an_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"event": "teleport", "data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn match_over_includes_final_tally() {
        let frame = serde_json::to_value(ServerEvent::MatchOver {
            winner: RoundWinner::Draw,
            red: 2,
            blue: 2,
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({"event": "match_over", "data": {"winner": "draw", "red": 2, "blue": 2}})
        );
    }
}
