//! Boxscore Store — PostgreSQL and Redis backends.
//!
//! Implements the core capability traits against a `PgPool` (with
//! one shared `sqlx` transaction per ingestion attempt) and the
//! identity cache against a Redis connection manager.

pub mod game_repository;
pub mod pg;
pub mod player_repository;
pub mod redis_cache;
pub mod team_repository;
