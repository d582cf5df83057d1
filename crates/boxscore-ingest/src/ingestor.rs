//! The ingestion orchestrator.

use std::sync::Arc;
use std::time::Duration;

use boxscore_core::error::StoreError;
use boxscore_core::game::{GameSheet, PlayerKey};
use boxscore_core::repository::{PlayerResolver, StatWriter, TeamResolver, TxProvider};

/// Retry policy for transient write conflicts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of full Begin→Resolve→Write→Commit attempts.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (zero-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_backoff.saturating_mul(1_u32 << retry.min(16))
    }
}

/// Drives one game sheet through team resolution, batch player
/// resolution, and stat persistence under a single transaction.
///
/// The resolvers are idempotent (store-level uniqueness constraints
/// arbitrate creation races), so a conflicted attempt can safely
/// re-run the entire sequence on a fresh transaction.
pub struct GameIngestor<P: TxProvider> {
    provider: Arc<P>,
    teams: Arc<dyn TeamResolver<P::Tx>>,
    players: Arc<dyn PlayerResolver<P::Tx>>,
    stats: Arc<dyn StatWriter<P::Tx>>,
    retry: RetryPolicy,
}

impl<P: TxProvider> GameIngestor<P> {
    /// Creates a new `GameIngestor`.
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        teams: Arc<dyn TeamResolver<P::Tx>>,
        players: Arc<dyn PlayerResolver<P::Tx>>,
        stats: Arc<dyn StatWriter<P::Tx>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            teams,
            players,
            stats,
            retry,
        }
    }

    /// Records a game durably and returns its id.
    ///
    /// Either every stat row of the game is committed or none is; a
    /// returned error guarantees the attempt left no partial rows.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed sheets (rejected before any
    /// transaction is opened); otherwise the last store error observed.
    /// Only write conflicts are retried, up to the policy's attempt
    /// ceiling, with exponentially increasing backoff.
    pub async fn log_game(&self, game: &GameSheet) -> Result<String, StoreError> {
        game.validate()?;

        let mut game = game.clone();
        let mut attempt = 0;
        loop {
            match self.attempt(&mut game).await {
                Ok(id) => return Ok(id),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(err);
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %err,
                        "write conflict, retrying transaction"
                    );
                    tokio::time::sleep(self.retry.delay(attempt - 1)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One full attempt: begin, run the stages, commit. The open
    /// transaction is rolled back on any stage failure; a failed
    /// commit closes it by itself.
    async fn attempt(&self, game: &mut GameSheet) -> Result<String, StoreError> {
        let mut tx = self.provider.begin().await.map_err(|err| {
            tracing::error!(error = %err, "failed to begin transaction");
            err
        })?;

        match self.run_stages(&mut tx, game).await {
            Ok(id) => {
                self.provider.commit(tx).await.map_err(|err| {
                    tracing::error!(error = %err, "failed to commit game");
                    err
                })?;
                Ok(id)
            }
            Err(err) => {
                self.provider.rollback(tx).await;
                Err(err)
            }
        }
    }

    async fn run_stages(&self, tx: &mut P::Tx, game: &mut GameSheet) -> Result<String, StoreError> {
        // Teams first: player resolution needs their ids.
        for team in &mut game.teams {
            let id = self.teams.resolve(tx, &team.name).await.map_err(|err| {
                tracing::error!(team = %team.name, error = %err, "team resolution failed");
                err
            })?;
            team.id = Some(id);
        }

        let mut pairs = Vec::with_capacity(game.player_count());
        for team in &game.teams {
            let team_id = team
                .id
                .clone()
                .ok_or_else(|| StoreError::Store("team id missing after resolution".into()))?;
            for player in &team.players {
                pairs.push(PlayerKey {
                    name: player.name.clone(),
                    team_id: team_id.clone(),
                });
            }
        }

        let mapping = self.players.resolve_batch(tx, &pairs).await.map_err(|err| {
            tracing::error!(error = %err, "player batch resolution failed");
            err
        })?;

        for team in &mut game.teams {
            for player in &mut team.players {
                if let Some(id) = mapping.get(&player.name) {
                    player.id = Some(id.clone());
                }
            }
        }

        self.stats.write(tx, game).await.map_err(|err| {
            tracing::error!(error = %err, "failed to write stat rows");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use boxscore_core::repository::StatQueries;
    use boxscore_test_support::MemoryStore;
    use chrono::{TimeZone, Utc};

    use boxscore_core::game::{PlayerLine, StatLine, TeamSheet};

    use super::*;

    fn player(name: &str, points: u32, rebounds: u32, assists: u32) -> PlayerLine {
        PlayerLine {
            id: None,
            name: name.to_owned(),
            stats: StatLine {
                points,
                rebounds,
                assists,
                ..StatLine::default()
            },
        }
    }

    fn lakers_game() -> GameSheet {
        GameSheet {
            date: Utc.with_ymd_and_hms(2026, 3, 1, 19, 30, 0).unwrap(),
            teams: vec![TeamSheet {
                id: None,
                name: "Lakers".into(),
                players: vec![player("LeBron James", 24, 10, 8)],
            }],
        }
    }

    fn ingestor(store: &Arc<MemoryStore>, retry: RetryPolicy) -> GameIngestor<MemoryStore> {
        GameIngestor::new(
            Arc::clone(store),
            store.clone(),
            store.clone(),
            store.clone(),
            retry,
        )
    }

    #[tokio::test]
    async fn test_log_game_commits_one_row_with_resolved_ids() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let game_id = ingestor.log_game(&lakers_game()).await.unwrap();

        // Assert
        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.game_id, game_id);
        assert_eq!(row.stats.points, 24);
        assert_eq!(row.stats.rebounds, 10);
        assert_eq!(row.stats.assists, 8);

        let team_id = store.team_id("Lakers").expect("team committed");
        let player_id = store.player_id("LeBron James", &team_id).expect("player committed");
        assert!(!team_id.is_empty());
        assert_eq!(row.player_id, player_id);

        assert_eq!(store.tx_counts(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_second_game_reuses_identities_with_fresh_game_id() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let first = ingestor.log_game(&lakers_game()).await.unwrap();
        let second = ingestor.log_game(&lakers_game()).await.unwrap();

        // Assert
        assert_ne!(first, second);
        let rows = store.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_id, rows[1].player_id);

        let team_id = store.team_id("Lakers").unwrap();
        assert_eq!(
            store.player_id("LeBron James", &team_id).unwrap(),
            rows[0].player_id
        );
    }

    #[tokio::test]
    async fn test_empty_game_returns_id_without_rows() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, RetryPolicy::default());
        let game = GameSheet {
            date: Utc.with_ymd_and_hms(2026, 3, 1, 19, 30, 0).unwrap(),
            teams: vec![],
        };

        // Act
        let game_id = ingestor.log_game(&game).await.unwrap();

        // Assert
        assert!(!game_id.is_empty());
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_failed_stat_write_rolls_back_everything() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        store.fail_stat_writes(true);
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let result = ingestor.log_game(&lakers_game()).await;

        // Assert: no stat rows, and the team/player creates staged in
        // the same transaction are gone too.
        assert!(matches!(result, Err(StoreError::Store(_))));
        assert!(store.rows().is_empty());
        assert!(store.team_id("Lakers").is_none());
        assert_eq!(store.tx_counts(), (1, 0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_conflict_retries_and_succeeds() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        store.conflict_next_commits(1);
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let game_id = ingestor.log_game(&lakers_game()).await.unwrap();

        // Assert: second attempt committed exactly one row.
        assert_eq!(store.rows().len(), 1);
        assert_eq!(store.rows()[0].game_id, game_id);
        let (begins, commits, _) = store.tx_counts();
        assert_eq!(begins, 2);
        assert_eq!(commits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mid_stage_conflict_rolls_back_and_retries() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        store.conflict_next_resolves(1);
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let result = ingestor.log_game(&lakers_game()).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(store.tx_counts(), (2, 1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhaustion_returns_last_conflict() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        store.conflict_next_commits(u32::MAX);
        let ingestor = ingestor(&store, RetryPolicy::default());
        let started = tokio::time::Instant::now();

        // Act
        let result = ingestor.log_game(&lakers_game()).await;

        // Assert: exactly three attempts, backoff 100ms then 200ms.
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        let (begins, commits, _) = store.tx_counts();
        assert_eq!(begins, 3);
        assert_eq!(commits, 0);
        assert!(store.rows().is_empty());
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_begin_failure_is_fatal_without_retry() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        store.fail_next_begins(1);
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let result = ingestor.log_game(&lakers_game()).await;

        // Assert
        assert!(matches!(result, Err(StoreError::Store(_))));
        assert_eq!(store.tx_counts(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        store.fail_stat_writes(true);
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let result = ingestor.log_game(&lakers_game()).await;

        // Assert: one attempt only.
        assert!(result.is_err());
        let (begins, _, rollbacks) = store.tx_counts();
        assert_eq!(begins, 1);
        assert_eq!(rollbacks, 1);
    }

    #[tokio::test]
    async fn test_validation_failure_opens_no_transaction() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, RetryPolicy::default());
        let game = GameSheet {
            date: Utc.with_ymd_and_hms(2026, 3, 1, 19, 30, 0).unwrap(),
            teams: vec![
                TeamSheet {
                    id: None,
                    name: "Lakers".into(),
                    players: vec![player("Chris Johnson", 5, 2, 1)],
                },
                TeamSheet {
                    id: None,
                    name: "Celtics".into(),
                    players: vec![player("Chris Johnson", 7, 3, 0)],
                },
            ],
        };

        // Act
        let result = ingestor.log_game(&game).await;

        // Assert
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.tx_counts(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_committed_game_is_readable() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, RetryPolicy::default());

        // Act
        let game_id = ingestor.log_game(&lakers_game()).await.unwrap();

        // Assert
        let rows = store.find_game(&game_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "LeBron James");
    }

    #[test]
    fn test_backoff_is_strictly_increasing() {
        let policy = RetryPolicy::default();
        assert!(policy.delay(0) < policy.delay(1));
        assert!(policy.delay(1) < policy.delay(2));
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
    }
}
