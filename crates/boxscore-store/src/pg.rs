//! Postgres transaction provider and error classification.

use async_trait::async_trait;
use boxscore_core::error::StoreError;
use boxscore_core::repository::TxProvider;
use sqlx::{PgPool, Postgres, Transaction};

/// Transaction handle shared by all pipeline stages of one attempt.
pub type PgTx = Transaction<'static, Postgres>;

/// SQLSTATE codes Postgres raises for retryable write conflicts:
/// `serialization_failure` and `deadlock_detected`.
fn is_conflict_code(code: &str) -> bool {
    matches!(code, "40001" | "40P01")
}

/// Maps a `sqlx` error onto the domain taxonomy. Serialization
/// failures and deadlocks become [`StoreError::Conflict`] so the
/// orchestrator can retry them; a missing row becomes
/// [`StoreError::NotFound`]; everything else is terminal.
#[must_use]
pub fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) => match db.code() {
            Some(code) if is_conflict_code(&code) => StoreError::Conflict(db.to_string()),
            _ => StoreError::Store(db.to_string()),
        },
        other => StoreError::Store(other.to_string()),
    }
}

/// `PgPool`-backed transaction provider.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TxProvider for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        self.pool.begin().await.map_err(classify)
    }

    async fn commit(&self, tx: PgTx) -> Result<(), StoreError> {
        tx.commit().await.map_err(classify)
    }

    async fn rollback(&self, tx: PgTx) {
        if let Err(err) = tx.rollback().await {
            tracing::warn!(error = %err, "transaction rollback failed");
        }
    }
}
