//! In-memory flag store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::repositories::{FlagStore, StoreError};

/// Process-local flag store. State is lost when the process exits.
///
/// Used in tests and by hosts that persist the first-launch flag themselves.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one key already set.
    pub fn with_value(key: impl Into<String>, value: bool) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
        store
    }
}

impl FlagStore for MemoryFlagStore {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).copied().unwrap_or(default))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn take_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = values.insert(key.to_string(), false);
        Ok(previous.unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::FIRST_LAUNCH_KEY;

    #[test]
    fn test_default_when_unset() {
        let store = MemoryFlagStore::new();
        assert!(store.get_bool(FIRST_LAUNCH_KEY, true).unwrap());
        assert!(!store.get_bool(FIRST_LAUNCH_KEY, false).unwrap());
    }

    #[test]
    fn test_set_then_get() {
        let store = MemoryFlagStore::new();
        store.set_bool(FIRST_LAUNCH_KEY, false).unwrap();
        assert!(!store.get_bool(FIRST_LAUNCH_KEY, true).unwrap());
    }

    #[test]
    fn test_take_returns_previous_and_clears() {
        let store = MemoryFlagStore::new();

        assert!(store.take_bool(FIRST_LAUNCH_KEY, true).unwrap());
        assert!(!store.take_bool(FIRST_LAUNCH_KEY, true).unwrap());
        assert!(!store.get_bool(FIRST_LAUNCH_KEY, true).unwrap());
    }

    #[test]
    fn test_concurrent_take_observes_true_once() {
        let store = std::sync::Arc::new(MemoryFlagStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.take_bool(FIRST_LAUNCH_KEY, true).unwrap())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|first| *first)
            .count();

        assert_eq!(winners, 1);
    }

    #[test]
    fn test_with_value() {
        let store = MemoryFlagStore::with_value(FIRST_LAUNCH_KEY, false);
        assert!(!store.get_bool(FIRST_LAUNCH_KEY, true).unwrap());
    }
}
