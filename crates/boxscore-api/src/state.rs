//! Shared application state.

use std::sync::Arc;

use boxscore_core::cache::IdentityCache;
use boxscore_core::ids::{IdGenerator, UuidIds};
use boxscore_ingest::{GameIngestor, RetryPolicy, StatsService};
use boxscore_store::game_repository::PgGameRepository;
use boxscore_store::pg::PgStore;
use boxscore_store::player_repository::PgPlayerRepository;
use boxscore_store::team_repository::PgTeamRepository;
use sqlx::PgPool;

/// The concrete service type behind the HTTP handlers.
pub type PgStatsService = StatsService<PgStore>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The stats service: game-log writes and season reads.
    pub service: Arc<PgStatsService>,
}

impl AppState {
    /// Wires the Postgres repositories and the given identity cache
    /// into a ready-to-serve state.
    #[must_use]
    pub fn new(pool: PgPool, cache: Arc<dyn IdentityCache>) -> Self {
        let ids: Arc<dyn IdGenerator> = Arc::new(UuidIds);
        let provider = Arc::new(PgStore::new(pool.clone()));
        let teams = Arc::new(PgTeamRepository::new(Arc::clone(&cache), Arc::clone(&ids)));
        let players = Arc::new(PgPlayerRepository::new(cache, Arc::clone(&ids)));
        let games = Arc::new(PgGameRepository::new(pool, ids));

        let ingestor = GameIngestor::new(
            provider,
            teams,
            players,
            games.clone(),
            RetryPolicy::default(),
        );

        Self {
            service: Arc::new(StatsService::new(ingestor, games)),
        }
    }
}
