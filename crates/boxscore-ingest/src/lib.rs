//! Boxscore Ingest — the game-log ingestion pipeline.
//!
//! [`GameIngestor`] drives one submitted game through identity
//! resolution and stat persistence inside a single transaction,
//! retrying the whole unit of work on transient write conflicts.
//! [`StatsService`] adds the read-side pass-throughs the HTTP layer
//! consumes.

mod ingestor;
mod service;

pub use ingestor::{GameIngestor, RetryPolicy};
pub use service::StatsService;
