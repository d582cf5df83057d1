//! Durable stat-row persistence and the read-side queries.

use std::sync::Arc;

use async_trait::async_trait;
use boxscore_core::error::StoreError;
use boxscore_core::game::{
    GameSheet, GameStatRow, PlayerSeasonStats, StatLine, TeamSeasonStats,
};
use boxscore_core::ids::IdGenerator;
use boxscore_core::repository::{StatQueries, StatWriter};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use crate::pg::{PgTx, classify};

/// Postgres-backed stat writer and read queries.
pub struct PgGameRepository {
    pool: PgPool,
    ids: Arc<dyn IdGenerator>,
}

impl PgGameRepository {
    /// Creates a new `PgGameRepository`.
    #[must_use]
    pub fn new(pool: PgPool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }
}

#[async_trait]
impl StatWriter<PgTx> for PgGameRepository {
    async fn write(&self, tx: &mut PgTx, game: &GameSheet) -> Result<String, StoreError> {
        let game_id = self.ids.next_id();

        if game.player_count() == 0 {
            return Ok(game_id);
        }

        let mut lines = Vec::with_capacity(game.player_count());
        for team in &game.teams {
            for player in &team.players {
                let player_id = player.id.as_deref().ok_or_else(|| {
                    StoreError::Store(format!("unresolved player: {}", player.name))
                })?;
                lines.push((self.ids.next_id(), player_id, player.stats));
            }
        }

        let mut query = QueryBuilder::new(
            "INSERT INTO game_stats (id, game_id, player_id, date, points, rebounds, \
             assists, steals, blocks, fouls, turnovers, minutes_played) ",
        );
        query.push_values(&lines, |mut row, (row_id, player_id, stats)| {
            row.push_bind(row_id)
                .push_bind(&game_id)
                .push_bind(player_id)
                .push_bind(game.date)
                .push_bind(i64::from(stats.points))
                .push_bind(i64::from(stats.rebounds))
                .push_bind(i64::from(stats.assists))
                .push_bind(i64::from(stats.steals))
                .push_bind(i64::from(stats.blocks))
                .push_bind(i64::from(stats.fouls))
                .push_bind(i64::from(stats.turnovers))
                .push_bind(stats.minutes_played);
        });

        query
            .build()
            .execute(&mut **tx)
            .await
            .map_err(classify)?;

        Ok(game_id)
    }
}

#[derive(sqlx::FromRow)]
struct GameStatRowDb {
    game_id: String,
    player_id: String,
    name: String,
    date: DateTime<Utc>,
    points: i64,
    rebounds: i64,
    assists: i64,
    steals: i64,
    blocks: i64,
    fouls: i64,
    turnovers: i64,
    minutes_played: f64,
}

// Stat columns are written from u32 values, so the conversion back
// cannot lose data on rows this service produced.
fn stat(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl From<GameStatRowDb> for GameStatRow {
    fn from(row: GameStatRowDb) -> Self {
        Self {
            game_id: row.game_id,
            player_id: row.player_id,
            name: row.name,
            date: row.date,
            stats: StatLine {
                points: stat(row.points),
                rebounds: stat(row.rebounds),
                assists: stat(row.assists),
                steals: stat(row.steals),
                blocks: stat(row.blocks),
                fouls: stat(row.fouls),
                turnovers: stat(row.turnovers),
                minutes_played: row.minutes_played,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlayerSeasonStatsDb {
    player_id: String,
    player_name: String,
    games_played: i64,
    avg_points: f64,
    avg_rebounds: f64,
    avg_assists: f64,
    avg_steals: f64,
    avg_blocks: f64,
    avg_fouls: f64,
    avg_turnovers: f64,
    avg_minutes_played: f64,
}

impl From<PlayerSeasonStatsDb> for PlayerSeasonStats {
    fn from(row: PlayerSeasonStatsDb) -> Self {
        Self {
            player_id: row.player_id,
            player_name: row.player_name,
            games_played: row.games_played,
            avg_points: row.avg_points,
            avg_rebounds: row.avg_rebounds,
            avg_assists: row.avg_assists,
            avg_steals: row.avg_steals,
            avg_blocks: row.avg_blocks,
            avg_fouls: row.avg_fouls,
            avg_turnovers: row.avg_turnovers,
            avg_minutes_played: row.avg_minutes_played,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TeamSeasonStatsDb {
    team_id: String,
    team_name: String,
    games_played: i64,
    avg_points: f64,
    avg_rebounds: f64,
    avg_assists: f64,
    avg_steals: f64,
    avg_blocks: f64,
    avg_fouls: f64,
    avg_turnovers: f64,
    avg_minutes_played: f64,
}

impl From<TeamSeasonStatsDb> for TeamSeasonStats {
    fn from(row: TeamSeasonStatsDb) -> Self {
        Self {
            team_id: row.team_id,
            team_name: row.team_name,
            games_played: row.games_played,
            avg_points: row.avg_points,
            avg_rebounds: row.avg_rebounds,
            avg_assists: row.avg_assists,
            avg_steals: row.avg_steals,
            avg_blocks: row.avg_blocks,
            avg_fouls: row.avg_fouls,
            avg_turnovers: row.avg_turnovers,
            avg_minutes_played: row.avg_minutes_played,
        }
    }
}

#[async_trait]
impl StatQueries for PgGameRepository {
    async fn find_game(&self, game_id: &str) -> Result<Vec<GameStatRow>, StoreError> {
        let rows: Vec<GameStatRowDb> = sqlx::query_as(
            "SELECT g.game_id, g.player_id, p.name, g.date, g.points, g.rebounds, \
             g.assists, g.steals, g.blocks, g.fouls, g.turnovers, g.minutes_played \
             FROM game_stats g JOIN players p ON g.player_id = p.id \
             WHERE g.game_id = $1",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }

        Ok(rows.into_iter().map(GameStatRow::from).collect())
    }

    async fn player_season_stats(&self, player_id: &str) -> Result<PlayerSeasonStats, StoreError> {
        let row: Option<PlayerSeasonStatsDb> = sqlx::query_as(
            "SELECT player_id, player_name, games_played, avg_points, avg_rebounds, \
             avg_assists, avg_steals, avg_blocks, avg_fouls, avg_turnovers, \
             avg_minutes_played FROM player_season_stats WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(PlayerSeasonStats::from).ok_or(StoreError::NotFound)
    }

    async fn team_season_stats(&self, team_id: &str) -> Result<TeamSeasonStats, StoreError> {
        let row: Option<TeamSeasonStatsDb> = sqlx::query_as(
            "SELECT team_id, team_name, games_played, avg_points, avg_rebounds, \
             avg_assists, avg_steals, avg_blocks, avg_fouls, avg_turnovers, \
             avg_minutes_played FROM team_season_stats WHERE team_id = $1",
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(TeamSeasonStats::from).ok_or(StoreError::NotFound)
    }
}
