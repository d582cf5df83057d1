//! In-memory store fake with staged-commit transactions.
//!
//! `MemoryStore` implements the whole pipeline seam — transaction
//! provider, both resolvers, stat writer, and read queries — against
//! a mutex-guarded map. Writes are staged on the transaction handle
//! and only become visible on commit, which lets orchestrator tests
//! assert atomicity and retry behavior without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use boxscore_core::error::StoreError;
use boxscore_core::game::{
    GameSheet, GameStatRow, PlayerKey, PlayerSeasonStats, StatLine, TeamSeasonStats,
};
use boxscore_core::repository::{PlayerResolver, StatQueries, StatWriter, TeamResolver, TxProvider};
use chrono::{DateTime, Utc};

/// One committed stat row.
#[derive(Debug, Clone)]
pub struct StoredRow {
    /// Row identifier.
    pub row_id: String,
    /// Game the row belongs to.
    pub game_id: String,
    /// Resolved player identifier.
    pub player_id: String,
    /// Player name at write time.
    pub player_name: String,
    /// Event date.
    pub date: DateTime<Utc>,
    /// The recorded statistics.
    pub stats: StatLine,
}

#[derive(Debug, Default)]
struct Shared {
    teams: HashMap<String, String>,
    players: HashMap<(String, String), String>,
    rows: Vec<StoredRow>,
    next_id: u64,
    begin_failures: u32,
    resolve_conflicts: u32,
    commit_conflicts: u32,
    fail_stat_writes: bool,
    begins: u32,
    commits: u32,
    rollbacks: u32,
}

impl Shared {
    fn alloc(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }
}

/// Staged writes for one in-memory transaction.
#[derive(Debug, Default)]
pub struct MemTx {
    teams: Vec<(String, String)>,
    players: Vec<((String, String), String)>,
    rows: Vec<StoredRow>,
}

/// In-memory store fake. Share one instance (via `Arc`) as provider,
/// resolvers, and writer so every stage sees the same state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    shared: Mutex<Shared>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` `begin` calls fail with a `Store` error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_begins(&self, n: u32) {
        self.shared.lock().unwrap().begin_failures = n;
    }

    /// Make the next `n` team resolutions fail with a `Conflict`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn conflict_next_resolves(&self, n: u32) {
        self.shared.lock().unwrap().resolve_conflicts = n;
    }

    /// Make the next `n` commits fail with a `Conflict`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn conflict_next_commits(&self, n: u32) {
        self.shared.lock().unwrap().commit_conflicts = n;
    }

    /// Make every stat write fail with a `Store` error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_stat_writes(&self, fail: bool) {
        self.shared.lock().unwrap().fail_stat_writes = fail;
    }

    /// Committed id for a team name, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn team_id(&self, name: &str) -> Option<String> {
        self.shared.lock().unwrap().teams.get(name).cloned()
    }

    /// Committed id for a (player name, team id) pair, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn player_id(&self, name: &str, team_id: &str) -> Option<String> {
        self.shared
            .lock()
            .unwrap()
            .players
            .get(&(name.to_owned(), team_id.to_owned()))
            .cloned()
    }

    /// Snapshot of all committed stat rows.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn rows(&self) -> Vec<StoredRow> {
        self.shared.lock().unwrap().rows.clone()
    }

    /// `(begins, commits, rollbacks)` counters.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn tx_counts(&self) -> (u32, u32, u32) {
        let shared = self.shared.lock().unwrap();
        (shared.begins, shared.commits, shared.rollbacks)
    }
}

#[async_trait]
impl TxProvider for MemoryStore {
    type Tx = MemTx;

    async fn begin(&self) -> Result<MemTx, StoreError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.begin_failures > 0 {
            shared.begin_failures -= 1;
            return Err(StoreError::Store("cannot begin transaction".into()));
        }
        shared.begins += 1;
        Ok(MemTx::default())
    }

    async fn commit(&self, tx: MemTx) -> Result<(), StoreError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.commit_conflicts > 0 {
            shared.commit_conflicts -= 1;
            return Err(StoreError::Conflict("deadlock detected".into()));
        }
        for (name, id) in tx.teams {
            shared.teams.entry(name).or_insert(id);
        }
        for (key, id) in tx.players {
            shared.players.entry(key).or_insert(id);
        }
        shared.rows.extend(tx.rows);
        shared.commits += 1;
        Ok(())
    }

    async fn rollback(&self, tx: MemTx) {
        drop(tx);
        self.shared.lock().unwrap().rollbacks += 1;
    }
}

#[async_trait]
impl TeamResolver<MemTx> for MemoryStore {
    async fn resolve(&self, tx: &mut MemTx, name: &str) -> Result<String, StoreError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.resolve_conflicts > 0 {
            shared.resolve_conflicts -= 1;
            return Err(StoreError::Conflict("deadlock detected".into()));
        }
        if let Some(id) = shared.teams.get(name) {
            return Ok(id.clone());
        }
        if let Some((_, id)) = tx.teams.iter().find(|(n, _)| n.as_str() == name) {
            return Ok(id.clone());
        }
        let id = shared.alloc();
        tx.teams.push((name.to_owned(), id.clone()));
        Ok(id)
    }
}

#[async_trait]
impl PlayerResolver<MemTx> for MemoryStore {
    async fn resolve_batch(
        &self,
        tx: &mut MemTx,
        pairs: &[PlayerKey],
    ) -> Result<HashMap<String, String>, StoreError> {
        let mut shared = self.shared.lock().unwrap();
        let mut mapping = HashMap::with_capacity(pairs.len());
        for pair in pairs {
            let key = (pair.name.clone(), pair.team_id.clone());
            let id = if let Some(id) = shared.players.get(&key) {
                id.clone()
            } else {
                let id = shared.alloc();
                tx.players.push((key, id.clone()));
                id
            };
            mapping.insert(pair.name.clone(), id);
        }
        Ok(mapping)
    }
}

#[async_trait]
impl StatWriter<MemTx> for MemoryStore {
    async fn write(&self, tx: &mut MemTx, game: &GameSheet) -> Result<String, StoreError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.fail_stat_writes {
            return Err(StoreError::Store("insert failed".into()));
        }
        let game_id = shared.alloc();
        if game.player_count() == 0 {
            return Ok(game_id);
        }
        for team in &game.teams {
            for player in &team.players {
                let player_id = player
                    .id
                    .clone()
                    .ok_or_else(|| StoreError::Store(format!("unresolved player {}", player.name)))?;
                let row_id = shared.alloc();
                tx.rows.push(StoredRow {
                    row_id,
                    game_id: game_id.clone(),
                    player_id,
                    player_name: player.name.clone(),
                    date: game.date,
                    stats: player.stats,
                });
            }
        }
        Ok(game_id)
    }
}

#[async_trait]
impl StatQueries for MemoryStore {
    async fn find_game(&self, game_id: &str) -> Result<Vec<GameStatRow>, StoreError> {
        let shared = self.shared.lock().unwrap();
        let rows: Vec<GameStatRow> = shared
            .rows
            .iter()
            .filter(|r| r.game_id == game_id)
            .map(|r| GameStatRow {
                game_id: r.game_id.clone(),
                player_id: r.player_id.clone(),
                name: r.player_name.clone(),
                date: r.date,
                stats: r.stats,
            })
            .collect();
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows)
    }

    async fn player_season_stats(&self, _player_id: &str) -> Result<PlayerSeasonStats, StoreError> {
        Err(StoreError::NotFound)
    }

    async fn team_season_stats(&self, _team_id: &str) -> Result<TeamSeasonStats, StoreError> {
        Err(StoreError::NotFound)
    }
}
