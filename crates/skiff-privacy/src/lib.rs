//! Skiff Privacy
//!
//! Clearing of private data on request:
//! - Browsing history
//! - Disk and memory caches
//! - Cookies
//! - Site data (local storage, IndexedDB, service workers)
//!
//! Each kind of data is cleared by a `Clearable`. The `PrivateDataClearer`
//! runs the ones the user picked off the calling thread, retrying a failed
//! clear once before reporting it.

mod category;
mod clearable;
mod clearer;
mod error;

pub use category::{DataCategory, WebsiteDataKind};
pub use clearable::{Clearable, HistoryClearable, WebsiteDataClearable, WebsiteDataStore};
pub use clearer::{ClearFailure, ClearReport, PrivateDataClearer};
pub use error::ClearError;

pub type Result<T> = std::result::Result<T, ClearError>;
