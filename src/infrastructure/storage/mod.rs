//! [`crate::domain::repositories::FlagStore`] implementations.

pub mod file_flag_store;
pub mod memory_flag_store;

pub use file_flag_store::FileFlagStore;
pub use memory_flag_store::MemoryFlagStore;
