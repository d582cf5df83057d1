//! Application service combining the write and read paths.

use std::sync::Arc;

use boxscore_core::error::StoreError;
use boxscore_core::game::{GameSheet, GameStatRow, PlayerSeasonStats, TeamSeasonStats};
use boxscore_core::repository::{StatQueries, TxProvider};

use crate::ingestor::GameIngestor;

/// The surface the HTTP layer consumes: one write entry point and the
/// three read pass-throughs.
pub struct StatsService<P: TxProvider> {
    ingestor: GameIngestor<P>,
    queries: Arc<dyn StatQueries>,
}

impl<P: TxProvider> StatsService<P> {
    /// Creates a new `StatsService`.
    #[must_use]
    pub fn new(ingestor: GameIngestor<P>, queries: Arc<dyn StatQueries>) -> Self {
        Self { ingestor, queries }
    }

    /// Records a game durably. See [`GameIngestor::log_game`].
    ///
    /// # Errors
    ///
    /// Propagates the ingestor's error unmodified.
    pub async fn log_game(&self, game: &GameSheet) -> Result<String, StoreError> {
        self.ingestor.log_game(game).await
    }

    /// Returns every per-player stat row recorded for a game.
    ///
    /// # Errors
    ///
    /// `NotFound` if the game id is unknown; store errors otherwise.
    pub async fn find_game(&self, game_id: &str) -> Result<Vec<GameStatRow>, StoreError> {
        self.queries.find_game(game_id).await.map_err(|err| {
            tracing::error!(game_id, error = %err, "failed fetching game stats");
            err
        })
    }

    /// Returns the season aggregate for a player.
    ///
    /// # Errors
    ///
    /// `NotFound` if no aggregate row exists; store errors otherwise.
    pub async fn player_season_stats(
        &self,
        player_id: &str,
    ) -> Result<PlayerSeasonStats, StoreError> {
        self.queries.player_season_stats(player_id).await.map_err(|err| {
            tracing::error!(player_id, error = %err, "failed fetching player season stats");
            err
        })
    }

    /// Returns the season aggregate for a team.
    ///
    /// # Errors
    ///
    /// `NotFound` if no aggregate row exists; store errors otherwise.
    pub async fn team_season_stats(&self, team_id: &str) -> Result<TeamSeasonStats, StoreError> {
        self.queries.team_season_stats(team_id).await.map_err(|err| {
            tracing::error!(team_id, error = %err, "failed fetching team season stats");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use boxscore_core::game::{GameSheet, PlayerLine, StatLine, TeamSheet};
    use boxscore_test_support::MemoryStore;
    use chrono::{TimeZone, Utc};

    use crate::ingestor::RetryPolicy;

    use super::*;

    fn service(store: &Arc<MemoryStore>) -> StatsService<MemoryStore> {
        let ingestor = GameIngestor::new(
            Arc::clone(store),
            store.clone(),
            store.clone(),
            store.clone(),
            RetryPolicy::default(),
        );
        StatsService::new(ingestor, store.clone())
    }

    #[tokio::test]
    async fn test_log_then_find_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let game = GameSheet {
            date: Utc.with_ymd_and_hms(2026, 3, 1, 19, 30, 0).unwrap(),
            teams: vec![TeamSheet {
                id: None,
                name: "Lakers".into(),
                players: vec![PlayerLine {
                    id: None,
                    name: "LeBron James".into(),
                    stats: StatLine {
                        points: 24,
                        ..StatLine::default()
                    },
                }],
            }],
        };

        let game_id = service.log_game(&game).await.unwrap();
        let rows = service.find_game(&game_id).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stats.points, 24);
    }

    #[tokio::test]
    async fn test_find_unknown_game_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        assert!(matches!(
            service.find_game("missing").await,
            Err(StoreError::NotFound)
        ));
    }
}
