//! Records finished navigations of normal tabs into history

use std::cell::RefCell;
use std::collections::HashMap;

use skiff_navigation::{NavigationCallback, NavigationCallbacks, NavigationDelegate, NavigationEvent, WebViewId};
use skiff_storage::Database;
use skiff_tabs::{Tab, TabId, TabManagerDelegate};

/// Registered both as a navigation delegate and as a tab manager delegate:
/// the latter tells it which web view each normal tab currently has.
/// Navigations of any other web view are never recorded.
pub struct HistoryRecorder {
    db: Database,
    recordable: RefCell<HashMap<TabId, WebViewId>>,
}

impl HistoryRecorder {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            recordable: RefCell::new(HashMap::new()),
        }
    }
}

impl NavigationDelegate for HistoryRecorder {
    fn callbacks(&self) -> NavigationCallbacks {
        NavigationCallbacks::only([NavigationCallback::DidFinish])
    }

    fn did_finish(&self, event: &NavigationEvent) {
        if !self.recordable.borrow().values().any(|w| *w == event.web_view) {
            return;
        }
        let Some(url) = &event.url else {
            return;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return;
        }

        let title = event.title.as_deref().unwrap_or_default();
        if let Err(error) = self.db.record_visit(url.as_str(), title) {
            tracing::warn!(%url, %error, "Failed to record visit");
        }
    }
}

impl TabManagerDelegate for HistoryRecorder {
    fn did_create_web_view(&self, tab: &Tab) {
        if tab.is_private() {
            return;
        }
        // Replaces the web view an evicted tab had before
        if let Some(web_view) = tab.web_view_id() {
            self.recordable.borrow_mut().insert(tab.id(), web_view);
        }
    }

    fn did_remove_tab(&self, tab: &Tab, _index: usize) {
        self.recordable.borrow_mut().remove(&tab.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_navigation::testing::FakeWebViewFactory;
    use skiff_session::ArchiveStore;
    use skiff_storage::ThumbnailStore;
    use skiff_tabs::{TabManager, TabManagerConfig};
    use std::rc::Rc;
    use std::sync::Arc;
    use url::Url;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_unknown_web_views_are_not_recorded() {
        let db = Database::open_in_memory().unwrap();
        let recorder = HistoryRecorder::new(db.clone());
        let url = Url::parse("https://a.test/").unwrap();

        recorder.did_finish(&NavigationEvent::new(WebViewId::next(), Some(url)));
        assert_eq!(db.visit_count("https://a.test/").unwrap(), 0);
    }

    #[test]
    fn test_tracking_follows_tab_lifetimes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let mut config = TabManagerConfig::new(url("about:home"));
        config.max_live_web_views = 2;
        let mut manager = TabManager::new(
            config,
            Box::new(FakeWebViewFactory::new()),
            ArchiveStore::new(dir.path().join("tabs.json")),
            Arc::new(ThumbnailStore::new(db.clone())),
            Arc::new(db.clone()),
        );
        let recorder = Rc::new(HistoryRecorder::new(db.clone()));
        manager.add_navigation_delegate(&recorder);
        manager.add_delegate(&recorder);

        let first = manager.add_tab(Some(url("https://a.test/")), false);
        for _ in 0..9 {
            manager.add_tab(None, false);
        }
        assert!(!manager.get(first).unwrap().is_live());
        assert_eq!(recorder.recordable.borrow().len(), 10);

        manager.select_tab(Some(first));
        let rehydrated = manager.get(first).unwrap().web_view_id().unwrap();
        assert_eq!(recorder.recordable.borrow().get(&first), Some(&rehydrated));
        assert_eq!(recorder.recordable.borrow().len(), 10);

        manager.remove_all();
        assert!(recorder.recordable.borrow().is_empty());
    }
}
