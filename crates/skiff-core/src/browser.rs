//! Main browser state container
//!
//! `Browser` owns the tab manager and everything it is wired to. Like the
//! tab manager it lives on the UI thread.

use std::rc::Rc;
use std::sync::Arc;

use skiff_navigation::WebViewFactory;
use skiff_privacy::{
    ClearReport, DataCategory, HistoryClearable, PrivateDataClearer, WebsiteDataClearable,
    WebsiteDataStore,
};
use skiff_session::ArchiveStore;
use skiff_storage::{Database, ThumbnailStore};
use skiff_tabs::{TabId, TabManager};
use url::Url;

use crate::config::Config;
use crate::error::CoreError;
use crate::events::{BrowserEvent, EventBus};
use crate::history::HistoryRecorder;
use crate::Result;

pub struct Browser {
    config: Config,
    db: Database,
    tab_manager: TabManager,
    clearer: PrivateDataClearer,
    events: EventBus,
    /// Held here; the tab manager only keeps weak references
    _history: Rc<HistoryRecorder>,
    edit_mode: bool,
}

impl Browser {
    /// Open storage and wire the tab manager. Tabs are not restored until
    /// `initialize`.
    pub fn new(
        config: Config,
        web_views: Box<dyn WebViewFactory>,
        website_data: Arc<dyn WebsiteDataStore>,
    ) -> Result<Self> {
        let db = Database::open(&config.database_path)?;

        let mut tab_manager = TabManager::new(
            config.tab_manager_config()?,
            web_views,
            ArchiveStore::new(&config.archive_path),
            Arc::new(ThumbnailStore::new(db.clone())),
            Arc::new(db.clone()),
        );
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tab_manager = tab_manager.with_runtime(handle);
        }

        let history = Rc::new(HistoryRecorder::new(db.clone()));
        tab_manager.add_navigation_delegate(&history);
        tab_manager.add_delegate(&history);

        let mut clearer = PrivateDataClearer::new().with(HistoryClearable::new(db.clone()));
        for clearable in WebsiteDataClearable::all(website_data) {
            clearer.register(clearable);
        }

        let events = EventBus::new(config.event_capacity);

        Ok(Self {
            config,
            db,
            tab_manager,
            clearer,
            events,
            _history: history,
            edit_mode: false,
        })
    }

    /// Restore the saved tabs. Returns how many were restored.
    pub fn initialize(&mut self) -> usize {
        let count = self.tab_manager.restore_tabs();
        self.events.publish(BrowserEvent::TabsRestored { count });

        tracing::info!(restored = count, "Browser initialized");
        count
    }

    // === Tab operations ===

    /// Open `input` in a new selected tab
    pub fn open_url(&mut self, input: &str, is_private: bool) -> Result<TabId> {
        let url = Url::parse(input.trim()).map_err(|source| CoreError::InvalidUrl {
            input: input.to_string(),
            source,
        })?;
        Ok(self.tab_manager.add_tab_and_select(Some(url), is_private))
    }

    pub fn open_new_tab(&mut self, is_private: bool) -> TabId {
        self.tab_manager.add_tab_and_select(None, is_private)
    }

    /// Close a tab. Closing the last normal tab opens a fresh one.
    pub fn close_tab(&mut self, id: TabId) -> Result<()> {
        self.tab_manager.remove_tab(id, true)?;
        Ok(())
    }

    pub fn will_switch_tab_mode(&mut self, leaving_private: bool) {
        self.tab_manager.will_switch_tab_mode(leaving_private);
    }

    /// Apply completed background work; call from the UI loop
    pub fn process_pending(&mut self) {
        self.tab_manager.process_pending();
    }

    // === UI state ===

    pub fn is_editing(&self) -> bool {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, editing: bool) {
        if self.edit_mode == editing {
            return;
        }
        self.edit_mode = editing;
        self.events.publish(BrowserEvent::SwitchEditMode(editing));
    }

    // === Privacy ===

    /// Clear the selected categories, then announce which were cleared
    pub async fn clear_private_data(&self, categories: &[DataCategory]) -> ClearReport {
        let report = self.clearer.clear(categories).await;

        let failed: Vec<DataCategory> = report.failures.iter().map(|f| f.category).collect();
        let cleared: Vec<DataCategory> = categories
            .iter()
            .copied()
            .filter(|c| !failed.contains(c))
            .collect();

        tracing::info!(
            cleared = cleared.len(),
            failed = failed.len(),
            "Cleared private data"
        );
        self.events.publish(BrowserEvent::PrivateDataCleared(cleared));
        report
    }

    // === Accessors ===

    pub fn tab_manager(&self) -> &TabManager {
        &self.tab_manager
    }

    pub fn tab_manager_mut(&mut self) -> &mut TabManager {
        &mut self.tab_manager
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_navigation::testing::FakeWebViewFactory;
    use skiff_privacy::WebsiteDataKind;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingDataStore {
        removed: Mutex<Vec<WebsiteDataKind>>,
    }

    impl WebsiteDataStore for RecordingDataStore {
        fn remove(&self, kinds: &[WebsiteDataKind]) -> skiff_privacy::Result<()> {
            self.removed.lock().unwrap().extend_from_slice(kinds);
            Ok(())
        }
    }

    fn test_browser(dir: &TempDir) -> (Browser, Arc<RecordingDataStore>) {
        let config = Config::new(dir.path().to_path_buf());
        let data = Arc::new(RecordingDataStore::default());
        let browser = Browser::new(config, Box::new(FakeWebViewFactory::new()), data.clone()).unwrap();
        (browser, data)
    }

    #[test]
    fn test_first_launch_opens_one_tab() {
        let dir = tempfile::tempdir().unwrap();
        let (mut browser, _) = test_browser(&dir);
        let mut rx = browser.events().subscribe();

        assert_eq!(browser.initialize(), 0);

        assert_eq!(browser.tab_manager().len(), 1);
        assert!(browser.tab_manager().selected_tab().is_some());
        assert_eq!(rx.try_recv().unwrap(), BrowserEvent::TabsRestored { count: 0 });
    }

    #[test]
    fn test_relaunch_restores_tabs() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (mut browser, _) = test_browser(&dir);
            browser.initialize();
            browser.open_url("https://a.test/", false).unwrap();
            browser.open_url("https://secret.test/", true).unwrap();
        }

        let (mut browser, _) = test_browser(&dir);
        assert_eq!(browser.initialize(), 2);
        let urls: Vec<String> = browser
            .tab_manager()
            .tabs()
            .iter()
            .filter_map(|t| t.url().map(|u| u.to_string()))
            .collect();
        assert_eq!(urls, vec!["about:home", "https://a.test/"]);
    }

    #[test]
    fn test_history_records_normal_tabs_only() {
        let dir = tempfile::tempdir().unwrap();
        let (mut browser, _) = test_browser(&dir);
        browser.initialize();

        browser.open_url("https://public.test/", false).unwrap();
        browser.open_url("https://private.test/", true).unwrap();

        let db = browser.database();
        assert_eq!(db.visit_count("https://public.test/").unwrap(), 1);
        assert_eq!(db.visit_count("https://private.test/").unwrap(), 0);
    }

    #[test]
    fn test_open_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let (mut browser, _) = test_browser(&dir);

        let result = browser.open_url("not a url", false);
        assert!(matches!(result, Err(CoreError::InvalidUrl { .. })));
        assert!(browser.tab_manager().is_empty());
    }

    #[test]
    fn test_closing_last_tab_opens_fresh_one() {
        let dir = tempfile::tempdir().unwrap();
        let (mut browser, _) = test_browser(&dir);
        browser.initialize();
        let only = browser.tab_manager().selected_id().unwrap();

        browser.close_tab(only).unwrap();

        let selected = browser.tab_manager().selected_tab().unwrap();
        assert_ne!(selected.id(), only);
        assert!(matches!(browser.close_tab(only), Err(CoreError::Tab(_))));
    }

    #[test]
    fn test_edit_mode_publishes_changes_only() {
        let dir = tempfile::tempdir().unwrap();
        let (mut browser, _) = test_browser(&dir);
        let mut rx = browser.events().subscribe();

        browser.set_edit_mode(true);
        browser.set_edit_mode(true);
        browser.set_edit_mode(false);

        assert_eq!(rx.try_recv().unwrap(), BrowserEvent::SwitchEditMode(true));
        assert_eq!(rx.try_recv().unwrap(), BrowserEvent::SwitchEditMode(false));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clear_private_data() {
        let dir = tempfile::tempdir().unwrap();
        let (mut browser, data) = test_browser(&dir);
        browser.initialize();
        browser.open_url("https://a.test/", false).unwrap();
        let mut rx = browser.events().subscribe();

        let report = browser
            .clear_private_data(&[DataCategory::History, DataCategory::Cookies])
            .await;

        assert!(report.is_success());
        assert_eq!(browser.database().visit_count("https://a.test/").unwrap(), 0);
        assert_eq!(*data.removed.lock().unwrap(), vec![WebsiteDataKind::Cookies]);
        assert_eq!(
            rx.recv().await.unwrap(),
            BrowserEvent::PrivateDataCleared(vec![DataCategory::History, DataCategory::Cookies])
        );
    }
}
