//! Boxscore API — HTTP surface over the ingestion pipeline.

pub mod error;
pub mod routes;
pub mod state;
