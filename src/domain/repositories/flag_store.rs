//! Single-key boolean store used for the first-launch flag.

/// Namespace the first-launch flag is stored under.
pub const PREFS_NAMESPACE: &str = "link_first_launch_prefs";

/// Key of the first-launch flag.
pub const FIRST_LAUNCH_KEY: &str = "is_first_launch";

/// Errors that can occur while reading or writing persisted flags.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store is corrupt: {0}")]
    Corrupt(String),
}

/// Persisted key → boolean store.
///
/// [`FlagStore::take_bool`] is the only operation the first-launch check
/// relies on for exactly-once semantics, so it must be atomic for every
/// handle that can reach the same underlying storage.
///
/// # Implementations
///
/// - [`crate::infrastructure::storage::MemoryFlagStore`] - process-local map
/// - [`crate::infrastructure::storage::FileFlagStore`] - JSON file per namespace
#[cfg_attr(test, mockall::automock)]
pub trait FlagStore: Send + Sync {
    /// Reads a flag, returning `default` when it was never written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError>;

    /// Persists a flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be written.
    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError>;

    /// Atomically reads a flag and sets it to `false`.
    ///
    /// Returns the previous value, or `default` when it was never written.
    /// Of any number of concurrent callers, at most one observes `true`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the flag cannot be read or the `false` value
    /// cannot be persisted.
    fn take_bool(&self, key: &str, default: bool) -> Result<bool, StoreError>;
}
