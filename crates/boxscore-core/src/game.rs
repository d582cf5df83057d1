//! Game-sheet input shapes and read-side rows.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Per-game statistic line for one player. All counts are for the
/// single game only; season aggregation happens outside this service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    /// Points scored.
    pub points: u32,
    /// Total rebounds.
    pub rebounds: u32,
    /// Assists.
    pub assists: u32,
    /// Steals.
    pub steals: u32,
    /// Blocks.
    pub blocks: u32,
    /// Personal fouls.
    pub fouls: u32,
    /// Turnovers.
    pub turnovers: u32,
    /// Minutes on court.
    pub minutes_played: f64,
}

/// One player's line in a submitted game sheet. The identifier is
/// empty on input and filled in by the player batch resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLine {
    /// Durable player identifier, resolved during ingestion.
    #[serde(default)]
    pub id: Option<String>,
    /// Player name, the natural key within a team.
    pub name: String,
    /// The player's statistics for this game.
    #[serde(flatten)]
    pub stats: StatLine,
}

/// One team's side of a submitted game sheet. The identifier is empty
/// on input and filled in by the team resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSheet {
    /// Durable team identifier, resolved during ingestion.
    #[serde(default)]
    pub id: Option<String>,
    /// Team name, the natural key across the whole corpus.
    pub name: String,
    /// The team's roster for this game.
    #[serde(default)]
    pub players: Vec<PlayerLine>,
}

/// A submitted game: the aggregate root for one ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSheet {
    /// When the game was played.
    pub date: DateTime<Utc>,
    /// The participating teams, in submission order.
    pub teams: Vec<TeamSheet>,
}

impl GameSheet {
    /// Total number of player lines across all teams.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.teams.iter().map(|t| t.players.len()).sum()
    }

    /// Rejects malformed sheets before any transaction is opened.
    ///
    /// Duplicate team names, duplicate player names within a team, and
    /// duplicate player names across teams are all rejected. The last
    /// rule exists because batch resolution maps ids by player name
    /// alone; two same-named players in one game would silently share
    /// an identifier otherwise.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` describing the first violation.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut team_names = HashSet::new();
        let mut game_player_names = HashSet::new();

        for team in &self.teams {
            if team.name.trim().is_empty() {
                return Err(StoreError::Validation("team name must not be empty".into()));
            }
            if !team_names.insert(team.name.as_str()) {
                return Err(StoreError::Validation(format!(
                    "duplicate team name in game: {}",
                    team.name
                )));
            }

            let mut roster_names = HashSet::new();
            for player in &team.players {
                if player.name.trim().is_empty() {
                    return Err(StoreError::Validation(format!(
                        "empty player name on team {}",
                        team.name
                    )));
                }
                if !roster_names.insert(player.name.as_str()) {
                    return Err(StoreError::Validation(format!(
                        "duplicate player name on team {}: {}",
                        team.name, player.name
                    )));
                }
                if !game_player_names.insert(player.name.as_str()) {
                    return Err(StoreError::Validation(format!(
                        "player name appears on more than one team: {}",
                        player.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Natural key for player resolution: name scoped to a resolved team.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    /// Player name.
    pub name: String,
    /// Resolved durable team identifier.
    pub team_id: String,
}

/// One durable per-player stat row, as read back for a game.
#[derive(Debug, Clone, Serialize)]
pub struct GameStatRow {
    /// Game identifier the row belongs to.
    pub game_id: String,
    /// Resolved player identifier.
    pub player_id: String,
    /// Player name, joined from the player catalog.
    pub name: String,
    /// Event date.
    pub date: DateTime<Utc>,
    /// The statistics recorded for this player in this game.
    #[serde(flatten)]
    pub stats: StatLine,
}

/// Season aggregate for one player, pre-materialized externally.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSeasonStats {
    /// Player identifier.
    pub player_id: String,
    /// Player name.
    pub player_name: String,
    /// Games the player appeared in.
    pub games_played: i64,
    /// Average points per game.
    pub avg_points: f64,
    /// Average rebounds per game.
    pub avg_rebounds: f64,
    /// Average assists per game.
    pub avg_assists: f64,
    /// Average steals per game.
    pub avg_steals: f64,
    /// Average blocks per game.
    pub avg_blocks: f64,
    /// Average fouls per game.
    pub avg_fouls: f64,
    /// Average turnovers per game.
    pub avg_turnovers: f64,
    /// Average minutes per game.
    pub avg_minutes_played: f64,
}

/// Season aggregate for one team, pre-materialized externally.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSeasonStats {
    /// Team identifier.
    pub team_id: String,
    /// Team name.
    pub team_name: String,
    /// Games played.
    pub games_played: i64,
    /// Average points per game across the roster.
    pub avg_points: f64,
    /// Average rebounds per game.
    pub avg_rebounds: f64,
    /// Average assists per game.
    pub avg_assists: f64,
    /// Average steals per game.
    pub avg_steals: f64,
    /// Average blocks per game.
    pub avg_blocks: f64,
    /// Average fouls per game.
    pub avg_fouls: f64,
    /// Average turnovers per game.
    pub avg_turnovers: f64,
    /// Average minutes per game.
    pub avg_minutes_played: f64,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn player(name: &str) -> PlayerLine {
        PlayerLine {
            id: None,
            name: name.to_owned(),
            stats: StatLine::default(),
        }
    }

    fn sheet(teams: Vec<TeamSheet>) -> GameSheet {
        GameSheet {
            date: Utc.with_ymd_and_hms(2026, 3, 1, 19, 30, 0).unwrap(),
            teams,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_sheet() {
        let game = sheet(vec![
            TeamSheet {
                id: None,
                name: "Lakers".into(),
                players: vec![player("LeBron James"), player("Austin Reaves")],
            },
            TeamSheet {
                id: None,
                name: "Celtics".into(),
                players: vec![player("Jayson Tatum")],
            },
        ]);

        assert!(game.validate().is_ok());
        assert_eq!(game.player_count(), 3);
    }

    #[test]
    fn test_validate_rejects_duplicate_team_names() {
        let game = sheet(vec![
            TeamSheet {
                id: None,
                name: "Lakers".into(),
                players: vec![],
            },
            TeamSheet {
                id: None,
                name: "Lakers".into(),
                players: vec![],
            },
        ]);

        match game.validate().unwrap_err() {
            StoreError::Validation(msg) => assert!(msg.contains("duplicate team name")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_player_within_team() {
        let game = sheet(vec![TeamSheet {
            id: None,
            name: "Lakers".into(),
            players: vec![player("LeBron James"), player("LeBron James")],
        }]);

        match game.validate().unwrap_err() {
            StoreError::Validation(msg) => {
                assert!(msg.contains("duplicate player name on team Lakers"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_same_player_name_across_teams() {
        // Batch resolution keys the returned mapping by name alone, so
        // a shared name would make two players collapse onto one id.
        let game = sheet(vec![
            TeamSheet {
                id: None,
                name: "Lakers".into(),
                players: vec![player("Chris Johnson")],
            },
            TeamSheet {
                id: None,
                name: "Celtics".into(),
                players: vec![player("Chris Johnson")],
            },
        ]);

        match game.validate().unwrap_err() {
            StoreError::Validation(msg) => {
                assert!(msg.contains("more than one team"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_blank_names() {
        let game = sheet(vec![TeamSheet {
            id: None,
            name: "  ".into(),
            players: vec![],
        }]);
        assert!(game.validate().is_err());

        let game = sheet(vec![TeamSheet {
            id: None,
            name: "Lakers".into(),
            players: vec![player("")],
        }]);
        assert!(game.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_empty_game() {
        let game = sheet(vec![]);
        assert!(game.validate().is_ok());
        assert_eq!(game.player_count(), 0);
    }
}
