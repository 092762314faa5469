//! Skiff Tab Management
//!
//! The tab manager owns the ordered collection of normal and private tabs,
//! the selection, the live web view budget and the saved tab archive.
//! Tabs are referenced only through stable `TabId`s, never by position.

mod delegate;
mod error;
mod manager;
mod persistence;
mod state;
mod tab;

pub use delegate::{ObserverId, TabManagerDelegate};
pub use error::TabError;
pub use manager::{AddTabOptions, TabManager, TabManagerConfig, DEFAULT_MAX_LIVE_WEB_VIEWS};
pub use state::TabState;
pub use tab::{Tab, TabId};

pub type Result<T> = std::result::Result<T, TabError>;

#[cfg(test)]
mod test_support;
