//! Draft persistence for the onboarding wizard.
//!
//! Drafts are JSON snapshots of a step's form values stored under
//! `draft_<role>_<step>` in a [`KeyValueStore`]. Storage problems never reach
//! the user: they are logged and the operation is dropped.

mod draft;
mod kv;
mod sqlite;

pub use draft::{DraftKey, DraftObserver, DraftStore, DEFAULT_DRAFT_DEBOUNCE, STORAGE_PREFIX};
pub use kv::{KeyValueStore, MemoryStore, StorageError};
pub use sqlite::SqliteStore;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
