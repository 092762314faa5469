//! Skiff Storage Layer
//!
//! SQLite-backed persistence for the collaborators the tab manager consumes:
//! a key-value preference store and a thumbnail blob store keyed by opaque
//! identifiers. Browsing history lives here too so private data can be cleared.

mod database;
mod error;
mod migrations;
mod preferences;
mod thumbnail;

pub use database::Database;
pub use error::StorageError;
pub use preferences::{PreferenceStore, PREF_BLOCK_POPUPS, PREF_CLOSE_PRIVATE_TABS};
pub use thumbnail::{BlobStore, Thumbnail, ThumbnailStore};

pub type Result<T> = std::result::Result<T, StorageError>;
