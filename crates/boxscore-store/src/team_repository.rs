//! Team identity resolution: cache-aside lookup over the `teams`
//! table, with race-safe creation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boxscore_core::cache::{IdentityCache, team_key};
use boxscore_core::error::StoreError;
use boxscore_core::ids::IdGenerator;
use boxscore_core::repository::TeamResolver;

use crate::pg::{PgTx, classify};

/// The team catalog changes slowly, so entries can live a while.
pub const TEAM_TTL: Duration = Duration::from_secs(5 * 60);

/// Postgres-backed team resolver with a best-effort identity cache.
pub struct PgTeamRepository {
    cache: Arc<dyn IdentityCache>,
    ids: Arc<dyn IdGenerator>,
}

impl PgTeamRepository {
    /// Creates a new `PgTeamRepository`.
    #[must_use]
    pub fn new(cache: Arc<dyn IdentityCache>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { cache, ids }
    }
}

#[async_trait]
impl TeamResolver<PgTx> for PgTeamRepository {
    async fn resolve(&self, tx: &mut PgTx, name: &str) -> Result<String, StoreError> {
        let key = team_key(name);
        if let Some(id) = self.cache.get(&key).await {
            return Ok(id);
        }

        tracing::debug!(team = name, "cache miss, checking store");

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM teams WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await
            .map_err(classify)?;

        if let Some((id,)) = existing {
            self.cache.set(&key, &id, TEAM_TTL).await;
            return Ok(id);
        }

        // Never seen. A concurrent writer may create the same name
        // between the probe above and this insert; the unique index on
        // name arbitrates, and a losing insert affects zero rows.
        let id = self.ids.next_id();
        let inserted =
            sqlx::query("INSERT INTO teams (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
                .bind(&id)
                .bind(name)
                .execute(&mut **tx)
                .await
                .map_err(classify)?;

        let id = if inserted.rows_affected() == 0 {
            // Lost the race; the winner's row is authoritative.
            let (winner,): (String,) = sqlx::query_as("SELECT id FROM teams WHERE name = $1")
                .bind(name)
                .fetch_one(&mut **tx)
                .await
                .map_err(classify)?;
            winner
        } else {
            id
        };

        self.cache.set(&key, &id, TEAM_TTL).await;
        Ok(id)
    }
}
