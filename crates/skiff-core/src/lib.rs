//! Skiff Core
//!
//! Central coordination layer for the Skiff browser. `Browser` wires the
//! tab manager to storage, history recording, private data clearing and
//! the event bus the UI listens on.

mod browser;
mod config;
mod error;
mod events;
mod history;

pub use browser::Browser;
pub use config::Config;
pub use error::CoreError;
pub use events::{BrowserEvent, EventBus};
pub use history::HistoryRecorder;

// Re-export core components
pub use skiff_navigation::{
    NavigationDelegate, NavigationDelegateMultiplexer, NavigationError, WebView, WebViewFactory,
};
pub use skiff_privacy::{ClearReport, DataCategory, WebsiteDataKind, WebsiteDataStore};
pub use skiff_session::{ArchiveError, SavedTab, SessionSnapshot, TabArchive};
pub use skiff_storage::{Database, StorageError};
pub use skiff_tabs::{Tab, TabError, TabId, TabManager, TabManagerDelegate, TabState};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
