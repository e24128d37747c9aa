use serde::{Deserialize, Serialize};

use crate::terrain::{TILE_BLUE_BASE, TILE_RED_BASE};

/// One of the two match teams. Wire representation is `"red"` / `"blue"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Tile code of this team's own safe-zone walls.
    pub fn base_tile(self) -> u8 {
        match self {
            Team::Red => TILE_RED_BASE,
            Team::Blue => TILE_BLUE_BASE,
        }
    }

    /// Avatar filename used when a player has no uploaded avatar.
    pub fn default_avatar(self) -> &'static str {
        match self {
            Team::Red => "defaultRedTeamPNG.png",
            Team::Blue => "defaultBlueTeamPNG.png",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client's roster selection. Any wire value other than the two real
/// teams sends the player back to the unassigned roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TeamChoice {
    Red,
    Blue,
    Unassigned,
}

impl TeamChoice {
    pub fn team(self) -> Option<Team> {
        match self {
            TeamChoice::Red => Some(Team::Red),
            TeamChoice::Blue => Some(Team::Blue),
            TeamChoice::Unassigned => None,
        }
    }
}

impl From<String> for TeamChoice {
    fn from(value: String) -> TeamChoice {
        match value.as_str() {
            "red" => TeamChoice::Red,
            "blue" => TeamChoice::Blue,
            _ => TeamChoice::Unassigned,
        }
    }
}

impl From<Team> for TeamChoice {
    fn from(team: Team) -> TeamChoice {
        match team {
            Team::Red => TeamChoice::Red,
            Team::Blue => TeamChoice::Blue,
        }
    }
}

/// Outcome of a round tally. Wire representation is `"red"` / `"blue"` / `"draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    Red,
    Blue,
    Draw,
}

impl RoundWinner {
    /// Decide a winner from per-team member counts. Strictly more wins;
    /// equal counts are a draw.
    pub fn from_tally(red: usize, blue: usize) -> RoundWinner {
        match red.cmp(&blue) {
            std::cmp::Ordering::Greater => RoundWinner::Red,
            std::cmp::Ordering::Less => RoundWinner::Blue,
            std::cmp::Ordering::Equal => RoundWinner::Draw,
        }
    }

    pub fn team(self) -> Option<Team> {
        match self {
            RoundWinner::Red => Some(Team::Red),
            RoundWinner::Blue => Some(Team::Blue),
            RoundWinner::Draw => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_symmetric() {
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert_eq!(Team::Blue.opponent(), Team::Red);
        assert_eq!(Team::Red.opponent().opponent(), Team::Red);
    }

    #[test]
    fn base_tiles_are_distinct() {
        assert_ne!(Team::Red.base_tile(), Team::Blue.base_tile());
    }

    #[test]
    fn wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Team::Red).unwrap(), "\"red\"");
        assert_eq!(
            serde_json::to_string(&RoundWinner::Draw).unwrap(),
            "\"draw\""
        );
        let t: Team = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(t, Team::Blue);
    }

    #[test]
    fn any_unrecognized_choice_means_unassigned() {
        let choice: TeamChoice = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(choice, TeamChoice::Red);
        let choice: TeamChoice = serde_json::from_str("\"spectator\"").unwrap();
        assert_eq!(choice, TeamChoice::Unassigned);
        assert_eq!(TeamChoice::Unassigned.team(), None);
        assert_eq!(TeamChoice::from(Team::Blue).team(), Some(Team::Blue));
    }

    #[test]
    fn tally_requires_strict_majority() {
        assert_eq!(RoundWinner::from_tally(3, 1), RoundWinner::Red);
        assert_eq!(RoundWinner::from_tally(1, 3), RoundWinner::Blue);
        assert_eq!(RoundWinner::from_tally(2, 2), RoundWinner::Draw);
        assert_eq!(RoundWinner::from_tally(0, 0), RoundWinner::Draw);
    }
}
