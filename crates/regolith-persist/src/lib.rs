//! Versioned save persistence.
//!
//! Saves are JSON envelopes (`{version, createdAt, state}`) written through a
//! pluggable key-value store. Loading migrates any historical version up to
//! the current one; anything unreadable loads as `None` rather than an error,
//! so a corrupt save degrades to a fresh world instead of a crash.

pub mod migrate;
pub mod save;
pub mod store;

pub use migrate::migrate_state;
pub use save::{
    CURRENT_VERSION, PersistError, Snapshot, autosave, export_snapshot, import_snapshot,
    load_sim, rehydrate_state, sanitize_state, save_sim,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
