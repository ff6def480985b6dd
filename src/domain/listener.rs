//! Link listener trait and the shared listener registry.

use crate::domain::entities::ResolutionResult;
use crate::error::LinkError;
use std::sync::{Arc, PoisonError, RwLock};

/// Receives resolved links.
///
/// Calls are made one at a time from a single delivery task, so
/// implementations need no locking to order deliveries among themselves.
pub trait LinkListener: Send + Sync {
    /// Called for every successfully resolved link, direct or deferred.
    fn on_link_received(&self, result: &ResolutionResult);

    /// Called when an interactively opened link failed to resolve.
    fn on_link_error(&self, _error: &LinkError) {}
}

/// Registry of listeners, identified by `Arc` pointer.
///
/// Adding a registered listener and removing an unknown one are no-ops.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn LinkListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Returns false if it was already registered.
    pub fn add(&self, listener: Arc<dyn LinkListener>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove(&self, listener: &Arc<dyn LinkListener>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current registrations, so delivery does not hold the lock
    /// while listener code runs.
    pub fn snapshot(&self) -> Vec<Arc<dyn LinkListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
