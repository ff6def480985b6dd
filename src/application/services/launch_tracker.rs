//! First-launch tracking over a persisted boolean flag.

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::repositories::{FIRST_LAUNCH_KEY, FlagStore};

/// Exactly-once "is this the first launch" check.
///
/// The persisted flag defaults to `true` and is flipped to `false` by the
/// first successful [`Self::check_and_consume`]. The flip goes through
/// [`FlagStore::take_bool`], so trackers in different orchestrators (or
/// processes) over the same store still see `true` at most once between
/// them. A process-local latch then short-circuits every later call without
/// touching the store.
pub struct LaunchTracker<S: FlagStore + ?Sized> {
    store: Arc<S>,
    consumed: Mutex<bool>,
}

impl<S: FlagStore + ?Sized> LaunchTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            consumed: Mutex::new(false),
        }
    }

    /// Returns `true` exactly once per installation, `false` afterwards.
    ///
    /// A store failure returns `false` without latching, so a later call may
    /// still succeed.
    pub fn check_and_consume(&self) -> bool {
        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if *consumed {
            return false;
        }

        let is_first_launch = match self.store.take_bool(FIRST_LAUNCH_KEY, true) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to consume first-launch flag");
                return false;
            }
        };

        *consumed = true;
        if is_first_launch {
            tracing::debug!("First launch consumed");
        }
        is_first_launch
    }
}
