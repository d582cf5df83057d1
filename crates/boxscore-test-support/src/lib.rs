//! Shared test fakes for the boxscore service.

mod cache;
mod ids;
mod store;

pub use cache::{FailingCache, MemoryCache};
pub use ids::SequenceIds;
pub use store::{MemTx, MemoryStore, StoredRow};
