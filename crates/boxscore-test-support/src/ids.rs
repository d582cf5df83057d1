//! Deterministic identifier generators for tests.

use std::sync::Mutex;

use boxscore_core::ids::IdGenerator;

/// Generator that returns ids from a predetermined sequence, then
/// falls back to `seq-N` counters once the sequence is exhausted.
/// Used in tests that assert on specific resolved identifiers.
#[derive(Debug)]
pub struct SequenceIds {
    values: Mutex<Vec<String>>,
    counter: Mutex<u64>,
}

impl SequenceIds {
    /// Create a generator yielding `values` in order.
    #[must_use]
    pub fn new(values: Vec<&str>) -> Self {
        let mut values: Vec<String> = values.into_iter().map(str::to_owned).collect();
        values.reverse();
        Self {
            values: Mutex::new(values),
            counter: Mutex::new(0),
        }
    }
}

impl Default for SequenceIds {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl IdGenerator for SequenceIds {
    fn next_id(&self) -> String {
        if let Some(v) = self.values.lock().unwrap().pop() {
            return v;
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        format!("seq-{counter}")
    }
}
