//! Identifier generation abstraction.

use uuid::Uuid;

/// Source of globally unique identifiers for new rows.
///
/// Injected so tests can substitute a deterministic sequence.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier, unique with negligible collision
    /// probability.
    fn next_id(&self) -> String;
}

/// Production generator backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_distinct_and_parseable() {
        let ids = UuidIds;
        let a = ids.next_id();
        let b = ids.next_id();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(Uuid::parse_str(&b).is_ok());
    }
}
