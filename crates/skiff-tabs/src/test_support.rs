//! Shared fixtures for manager tests

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use skiff_navigation::testing::FakeWebViewFactory;
use skiff_session::ArchiveStore;
use skiff_storage::{Database, ThumbnailStore};
use tempfile::TempDir;
use url::Url;

use crate::delegate::TabManagerDelegate;
use crate::manager::{TabManager, TabManagerConfig};
use crate::tab::Tab;

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub(crate) struct Harness {
    pub manager: TabManager,
    pub engine: FakeWebViewFactory,
    pub db: Database,
    pub blobs: ThumbnailStore,
    pub archive_path: PathBuf,
    config: TabManagerConfig,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    pub fn with_budget(max_live_web_views: usize) -> Self {
        Self::with(|config| config.max_live_web_views = max_live_web_views)
    }

    pub fn with(configure: impl FnOnce(&mut TabManagerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("tabs.json");
        let db = Database::open_in_memory().unwrap();
        let blobs = ThumbnailStore::new(db.clone());
        let mut config = TabManagerConfig::new(url("about:home"));
        configure(&mut config);

        let engine = FakeWebViewFactory::new();
        let manager = Self::build(&config, &engine, &db, &archive_path);

        Self {
            manager,
            engine,
            db,
            blobs,
            archive_path,
            config,
            _dir: dir,
        }
    }

    /// A second manager over the same archive and database, as after a relaunch
    pub fn reopen(&self) -> (TabManager, FakeWebViewFactory) {
        let engine = FakeWebViewFactory::new();
        let manager = Self::build(&self.config, &engine, &self.db, &self.archive_path);
        (manager, engine)
    }

    fn build(
        config: &TabManagerConfig,
        engine: &FakeWebViewFactory,
        db: &Database,
        archive_path: &Path,
    ) -> TabManager {
        TabManager::new(
            config.clone(),
            Box::new(engine.clone()),
            ArchiveStore::new(archive_path),
            Arc::new(ThumbnailStore::new(db.clone())),
            Arc::new(db.clone()),
        )
    }
}

/// Delegate that records every callback as a line of text
#[derive(Default)]
pub(crate) struct Recorder {
    events: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl TabManagerDelegate for Recorder {
    fn did_select_tab(&self, selected: Option<&Tab>, previous: Option<&Tab>) {
        self.push(format!(
            "select {:?} from {:?}",
            selected.map(Tab::id),
            previous.map(Tab::id)
        ));
    }

    fn did_add_tab(&self, tab: &Tab, index: usize, _restoring: bool) {
        self.push(format!("add {} {}", tab.id(), index));
    }

    fn did_create_web_view(&self, tab: &Tab) {
        self.push(format!("create {}", tab.id()));
    }

    fn did_remove_tab(&self, tab: &Tab, index: usize) {
        self.push(format!("remove {} {}", tab.id(), index));
    }

    fn did_restore_tabs(&self, count: usize) {
        self.push(format!("restored {count}"));
    }
}
