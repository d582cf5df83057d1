//! Store abstractions for the ingestion pipeline.
//!
//! Each stage of the pipeline is a small capability trait so the
//! Postgres implementations can be swapped for in-memory fakes in
//! tests. The transaction is an associated type on [`TxProvider`];
//! the resolver and writer traits are generic over it, and every
//! stage of one ingestion attempt shares the one transaction the
//! orchestrator opened.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::game::{GameSheet, GameStatRow, PlayerKey, PlayerSeasonStats, TeamSeasonStats};

/// Opens, commits, and rolls back store transactions.
#[async_trait]
pub trait TxProvider: Send + Sync {
    /// Transaction handle passed through the pipeline stages.
    type Tx: Send;

    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot begin a transaction;
    /// this is fatal for the attempt and never retried.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Commits the transaction, making all staged writes durable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the commit fails; the transaction is
    /// closed either way.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Rolls the transaction back, discarding all staged writes.
    /// Rollback failures are logged by the implementation, not
    /// surfaced; the attempt's original error is what the caller sees.
    async fn rollback(&self, tx: Self::Tx);
}

/// Resolves a team name to its durable identifier, creating the team
/// if it has never been seen.
#[async_trait]
pub trait TeamResolver<Tx: Send>: Send + Sync {
    /// Returns the durable id for `name`, consulting the cache first,
    /// then the store, then creating a new row under `tx`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on any store failure. Cache failures are
    /// absorbed and treated as misses.
    async fn resolve(&self, tx: &mut Tx, name: &str) -> Result<String, StoreError>;
}

/// Resolves a whole game's roster of (player name, team id) pairs to
/// durable identifiers in a minimal number of round trips.
#[async_trait]
pub trait PlayerResolver<Tx: Send>: Send + Sync {
    /// Returns a name→id mapping covering every pair. New players are
    /// created under `tx`. The mapping is keyed by name alone, so the
    /// caller must not submit the same name under two teams.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on any store failure; no partial mapping
    /// is reported in that case.
    async fn resolve_batch(
        &self,
        tx: &mut Tx,
        pairs: &[PlayerKey],
    ) -> Result<HashMap<String, String>, StoreError>;
}

/// Persists the per-player stat rows of a fully resolved game.
#[async_trait]
pub trait StatWriter<Tx: Send>: Send + Sync {
    /// Writes one stat row per player under `tx` and returns the
    /// freshly generated game id. A game with zero players returns an
    /// id without touching the store.
    ///
    /// # Errors
    ///
    /// Returns the store error unmodified; retry is the caller's
    /// concern at the whole-transaction level.
    async fn write(&self, tx: &mut Tx, game: &GameSheet) -> Result<String, StoreError>;
}

/// Read-side queries. Simple single-shot lookups against the pool,
/// outside any transaction.
#[async_trait]
pub trait StatQueries: Send + Sync {
    /// Returns every per-player stat row recorded for a game.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the game id is unknown.
    async fn find_game(&self, game_id: &str) -> Result<Vec<GameStatRow>, StoreError>;

    /// Returns the pre-materialized season aggregate for a player.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no aggregate row exists.
    async fn player_season_stats(&self, player_id: &str) -> Result<PlayerSeasonStats, StoreError>;

    /// Returns the pre-materialized season aggregate for a team.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no aggregate row exists.
    async fn team_season_stats(&self, team_id: &str) -> Result<TeamSeasonStats, StoreError>;
}
