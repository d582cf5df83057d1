//! Player identity resolution in bulk: one batched cache probe, one
//! store probe per cache miss, one multi-row insert for the misses,
//! one batched cache backfill.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boxscore_core::cache::{IdentityCache, player_key};
use boxscore_core::error::StoreError;
use boxscore_core::game::PlayerKey;
use boxscore_core::ids::IdGenerator;
use boxscore_core::repository::PlayerResolver;
use sqlx::QueryBuilder;

use crate::pg::{PgTx, classify};

/// Player rosters churn per event; a day of caching is plenty.
pub const PLAYER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Postgres-backed batch player resolver with a best-effort identity
/// cache.
pub struct PgPlayerRepository {
    cache: Arc<dyn IdentityCache>,
    ids: Arc<dyn IdGenerator>,
}

impl PgPlayerRepository {
    /// Creates a new `PgPlayerRepository`.
    #[must_use]
    pub fn new(cache: Arc<dyn IdentityCache>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { cache, ids }
    }
}

#[async_trait]
impl PlayerResolver<PgTx> for PgPlayerRepository {
    async fn resolve_batch(
        &self,
        tx: &mut PgTx,
        pairs: &[PlayerKey],
    ) -> Result<HashMap<String, String>, StoreError> {
        let keys: Vec<String> = pairs
            .iter()
            .map(|p| player_key(&p.name, &p.team_id))
            .collect();
        let cache_hits = self.cache.get_many(&keys).await;

        let mut mapping = HashMap::with_capacity(pairs.len());
        let mut missing: Vec<&PlayerKey> = Vec::new();

        for (pair, key) in pairs.iter().zip(&keys) {
            if let Some(id) = cache_hits.get(key) {
                mapping.insert(pair.name.clone(), id.clone());
                continue;
            }

            let row: Option<(String,)> =
                sqlx::query_as("SELECT id FROM players WHERE name = $1 AND team_id = $2")
                    .bind(&pair.name)
                    .bind(&pair.team_id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(classify)?;

            match row {
                Some((id,)) => {
                    self.cache.set(key, &id, PLAYER_TTL).await;
                    mapping.insert(pair.name.clone(), id);
                }
                None => missing.push(pair),
            }
        }

        if missing.is_empty() {
            return Ok(mapping);
        }

        let assigned: Vec<(&PlayerKey, String)> = missing
            .into_iter()
            .map(|pair| (pair, self.ids.next_id()))
            .collect();

        let mut query = QueryBuilder::new("INSERT INTO players (id, name, team_id) ");
        query.push_values(&assigned, |mut row, (pair, id)| {
            row.push_bind(id).push_bind(&pair.name).push_bind(&pair.team_id);
        });
        query.push(" ON CONFLICT (name, team_id) DO NOTHING RETURNING id, name, team_id");

        // RETURNING only reports the rows this statement inserted, so
        // a pair missing from it lost a creation race to a concurrent
        // writer and must be re-read for the authoritative id.
        let inserted: Vec<(String, String, String)> = query
            .build_query_as()
            .fetch_all(&mut **tx)
            .await
            .map_err(classify)?;

        let won: HashMap<(String, String), String> = inserted
            .into_iter()
            .map(|(id, name, team_id)| ((name, team_id), id))
            .collect();

        let mut backfill = Vec::with_capacity(assigned.len());
        for (pair, _) in &assigned {
            let id = match won.get(&(pair.name.clone(), pair.team_id.clone())) {
                Some(id) => id.clone(),
                None => {
                    let (winner,): (String,) =
                        sqlx::query_as("SELECT id FROM players WHERE name = $1 AND team_id = $2")
                            .bind(&pair.name)
                            .bind(&pair.team_id)
                            .fetch_one(&mut **tx)
                            .await
                            .map_err(classify)?;
                    winner
                }
            };
            backfill.push((player_key(&pair.name, &pair.team_id), id.clone()));
            mapping.insert(pair.name.clone(), id);
        }

        self.cache.set_many(&backfill, PLAYER_TTL).await;

        Ok(mapping)
    }
}
