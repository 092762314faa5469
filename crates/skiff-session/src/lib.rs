//! Skiff Session Persistence
//!
//! - A session snapshot is the durable navigation history of one tab
//! - The tab archive is the ordered list of saved tabs, written as one file
//! - Private tabs are dropped when encoding unless explicitly persisted
//! - Decoding degrades instead of failing wherever a record can be salvaged

mod archive;
mod error;
mod snapshot;
mod store;

pub use archive::{PrivateTabPolicy, SavedTab, TabArchive, ARCHIVE_VERSION};
pub use error::ArchiveError;
pub use snapshot::SessionSnapshot;
pub use store::ArchiveStore;

pub type Result<T> = std::result::Result<T, ArchiveError>;
