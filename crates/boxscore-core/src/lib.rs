//! Boxscore Core — shared domain types and capability traits.
//!
//! This crate defines the game/team/player shapes the ingestion
//! pipeline operates on and the traits its collaborators implement.
//! It contains no infrastructure code.

pub mod cache;
pub mod error;
pub mod game;
pub mod ids;
pub mod repository;
