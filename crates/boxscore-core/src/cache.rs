//! Identity cache abstraction.
//!
//! The cache sits in front of the relational store to accelerate
//! name→id lookups. It is never authoritative: absence never implies
//! non-existence, and implementations absorb their own failures so a
//! broken cache degrades to misses instead of failing ingestion.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

/// Cache key for a team entry. Teams dedup by name alone.
#[must_use]
pub fn team_key(name: &str) -> String {
    format!("team:{name}")
}

/// Cache key for a player entry. The team id is embedded so
/// same-named players on different teams never collide.
#[must_use]
pub fn player_key(name: &str, team_id: &str) -> String {
    format!("player:{name}:{team_id}")
}

/// Best-effort key-value cache with per-entry expiry.
///
/// All operations are infallible from the caller's perspective:
/// implementations log failures and report a miss (or silently drop
/// the write) rather than returning an error.
#[async_trait]
pub trait IdentityCache: Send + Sync {
    /// Looks up a single key. `None` means miss (or cache failure).
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores a single entry with the given time-to-live.
    async fn set(&self, key: &str, id: &str, ttl: Duration);

    /// Looks up many keys in one round trip, returning a mapping for
    /// the keys that hit.
    async fn get_many(&self, keys: &[String]) -> HashMap<String, String>;

    /// Stores many entries in one round trip, all with the same
    /// time-to-live.
    async fn set_many(&self, entries: &[(String, String)], ttl: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespaces_are_disjoint() {
        assert_eq!(team_key("Lakers"), "team:Lakers");
        assert_eq!(player_key("LeBron James", "t-1"), "player:LeBron James:t-1");
        assert_ne!(team_key("x"), player_key("x", ""));
    }

    #[test]
    fn test_player_keys_distinguish_teams() {
        assert_ne!(
            player_key("Chris Johnson", "t-1"),
            player_key("Chris Johnson", "t-2")
        );
    }
}
