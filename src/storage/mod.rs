//! Journal storage.
//!
//! This module provides persistent storage for plants and growboxes,
//! supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileJournalStore;
pub use memory::MemoryJournalStore;
pub use traits::{JournalStore, Loaded};
