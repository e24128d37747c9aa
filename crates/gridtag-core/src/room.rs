use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::team::{Team, TeamChoice};
use crate::terrain::Terrain;

/// In-match player record, persisted inside the room document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub team: Team,
    pub is_tagger: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Timing knobs for one match. Defaults mirror the live game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Seconds of countdown before each round.
    pub prep_seconds: u64,
    /// Seconds each round runs.
    pub round_seconds: u64,
    /// Rounds played before the match concludes.
    pub max_rounds: u32,
    /// Seconds a tagged player stays dead.
    pub respawn_seconds: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            prep_seconds: 5,
            round_seconds: 60,
            max_rounds: 2,
            respawn_seconds: 5,
        }
    }
}

/// One room document: lobby rosters, the in-match player list, and the
/// terrain snapshot. Matches the persisted store schema field for field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDoc {
    pub id: String,
    pub room_name: String,
    pub owner: String,
    pub red_team: Vec<String>,
    pub blue_team: Vec<String>,
    pub no_team: Vec<String>,
    pub players: Vec<PlayerRecord>,
    pub game_started: bool,
    pub terrain: Terrain,
    pub attacking_team: Option<Team>,
}

impl RoomDoc {
    /// Create a fresh lobby room with generated terrain. The creator is
    /// both owner and first unassigned member.
    pub fn create(room_name: impl Into<String>, owner: impl Into<String>) -> RoomDoc {
        let owner = owner.into();
        RoomDoc {
            id: Uuid::new_v4().to_string(),
            room_name: room_name.into(),
            owner: owner.clone(),
            red_team: Vec::new(),
            blue_team: Vec::new(),
            no_team: vec![owner],
            players: Vec::new(),
            game_started: false,
            terrain: Terrain::generate(),
            attacking_team: None,
        }
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.red_team.iter().any(|u| u == user)
            || self.blue_team.iter().any(|u| u == user)
            || self.no_team.iter().any(|u| u == user)
    }

    /// Add a user to the unassigned roster unless already present somewhere.
    pub fn enroll(&mut self, user: &str) {
        if !self.is_member(user) {
            self.no_team.push(user.to_string());
        }
    }

    /// Move a user onto `team`, removing them from every other roster
    /// first so membership stays mutually exclusive.
    pub fn assign_team(&mut self, user: &str, team: Team) {
        self.red_team.retain(|u| u != user);
        self.blue_team.retain(|u| u != user);
        self.no_team.retain(|u| u != user);
        match team {
            Team::Red => self.red_team.push(user.to_string()),
            Team::Blue => self.blue_team.push(user.to_string()),
        }
    }

    /// Apply a roster selection: a real team goes through `assign_team`,
    /// anything else returns the user to the unassigned roster.
    pub fn choose_team(&mut self, user: &str, choice: TeamChoice) {
        match choice.team() {
            Some(team) => self.assign_team(user, team),
            None => {
                self.remove_from_rosters(user);
                self.no_team.push(user.to_string());
            }
        }
    }

    /// Drop a user from every roster. Returns true if anything changed.
    pub fn remove_from_rosters(&mut self, user: &str) -> bool {
        let before =
            self.red_team.len() + self.blue_team.len() + self.no_team.len();
        self.red_team.retain(|u| u != user);
        self.blue_team.retain(|u| u != user);
        self.no_team.retain(|u| u != user);
        before != self.red_team.len() + self.blue_team.len() + self.no_team.len()
    }

    pub fn player(&self, id: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut PlayerRecord> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Spawn position for a team on this room's terrain: red just inside
    /// the top-left safe zone, blue just inside the bottom-right one.
    pub fn spawn_point(&self, team: Team) -> (f64, f64) {
        match team {
            Team::Red => (1.0, 1.0),
            Team::Blue => (
                (self.terrain.width().saturating_sub(1)) as f64,
                (self.terrain.height().saturating_sub(1)) as f64,
            ),
        }
    }

    /// Create in-match records for every assigned roster member that does
    /// not already have one. Existing records keep their state.
    pub fn spawn_players(&mut self) {
        let assigned: Vec<(String, Team)> = self
            .red_team
            .iter()
            .map(|u| (u.clone(), Team::Red))
            .chain(self.blue_team.iter().map(|u| (u.clone(), Team::Blue)))
            .collect();
        for (id, team) in assigned {
            if self.player(&id).is_none() {
                let (x, y) = self.spawn_point(team);
                self.players.push(PlayerRecord {
                    id,
                    x,
                    y,
                    team,
                    is_tagger: false,
                    avatar: None,
                });
            }
        }
    }

    /// Set `is_tagger` on every in-match record to match `team`.
    pub fn flag_taggers(&mut self, team: Team) {
        for player in &mut self.players {
            player.is_tagger = player.team == team;
        }
    }

    /// Count in-match players per team by their current `team` field.
    pub fn team_tally(&self) -> (usize, usize) {
        let red = self.players.iter().filter(|p| p.team == Team::Red).count();
        (red, self.players.len() - red)
    }
}
