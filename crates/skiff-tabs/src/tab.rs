//! Tab data structure
//!
//! A tab is either live (owns a web view) or dehydrated (owns only the
//! session snapshot needed to bring one back). Display data falls back from
//! the live web view, to the cached title, to the snapshot.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use skiff_navigation::{
    NavigationDelegateMultiplexer, WebView, WebViewConfiguration, WebViewFactory, WebViewId,
};
use skiff_session::{SavedTab, SessionSnapshot};
use skiff_storage::Thumbnail;
use url::Url;
use uuid::Uuid;

use crate::state::TabState;

static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

/// Stable tab identity. Never reused within a process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TabId(u64);

impl TabId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

pub struct Tab {
    id: TabId,
    is_private: bool,
    web_view: Option<Box<dyn WebView>>,
    session_snapshot: Option<SessionSnapshot>,
    screenshot: Option<Thumbnail>,
    screenshot_uuid: Option<Uuid>,
    /// Set once the current screenshot has been written to the blob store
    screenshot_stored: bool,
    last_active: DateTime<Utc>,
    title: Option<String>,
    /// Loaded as soon as a web view exists
    pending_url: Option<Url>,
}

impl Tab {
    pub(crate) fn new(is_private: bool) -> Self {
        Self {
            id: TabId::next(),
            is_private,
            web_view: None,
            session_snapshot: None,
            screenshot: None,
            screenshot_uuid: None,
            screenshot_stored: false,
            last_active: Utc::now(),
            title: None,
            pending_url: None,
        }
    }

    /// Dehydrated tab rebuilt from an archive record
    pub(crate) fn from_saved(record: SavedTab) -> Self {
        let mut tab = Self::new(record.is_private);
        if let Some(snapshot) = &record.session_data {
            tab.last_active = snapshot.last_used_time;
        }
        tab.title = record.title;
        tab.session_snapshot = record.session_data;
        tab.screenshot_uuid = record.screenshot_uuid;
        // Already in the blob store, or gone; either way never re-uploaded
        tab.screenshot_stored = true;
        tab
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn state(&self) -> TabState {
        if self.web_view.is_some() {
            TabState::Live
        } else {
            TabState::Dehydrated
        }
    }

    pub fn is_live(&self) -> bool {
        self.web_view.is_some()
    }

    pub fn web_view(&self) -> Option<&dyn WebView> {
        self.web_view.as_deref()
    }

    pub fn web_view_id(&self) -> Option<WebViewId> {
        self.web_view.as_ref().map(|w| w.id())
    }

    pub fn session_snapshot(&self) -> Option<&SessionSnapshot> {
        self.session_snapshot.as_ref()
    }

    pub fn screenshot(&self) -> Option<&Thumbnail> {
        self.screenshot.as_ref()
    }

    pub fn screenshot_uuid(&self) -> Option<Uuid> {
        self.screenshot_uuid
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn set_last_active(&mut self, at: DateTime<Utc>) {
        self.last_active = at;
    }

    pub(crate) fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Current URL: the web view's, else the snapshot's, else the pending load
    pub fn url(&self) -> Option<Url> {
        if let Some(url) = self.web_view.as_ref().and_then(|w| w.url()) {
            return Some(url);
        }
        self.session_snapshot
            .as_ref()
            .and_then(|s| s.current_url().cloned())
            .or_else(|| self.pending_url.clone())
    }

    pub fn display_title(&self) -> String {
        let live = self
            .web_view
            .as_ref()
            .and_then(|w| w.title())
            .filter(|t| !t.is_empty());
        let cached = self.title.clone().filter(|t| !t.is_empty());
        let saved = self
            .session_snapshot
            .as_ref()
            .and_then(|s| s.current_title.clone())
            .filter(|t| !t.is_empty());

        live.or(cached)
            .or(saved)
            .or_else(|| self.url().map(|u| u.to_string()))
            .unwrap_or_default()
    }

    pub fn load(&mut self, url: &Url) {
        match &mut self.web_view {
            Some(web_view) => web_view.load(url),
            None => self.pending_url = Some(url.clone()),
        }
    }

    pub fn go_back(&mut self) {
        if let Some(web_view) = &mut self.web_view {
            web_view.go_back();
        }
    }

    pub fn go_forward(&mut self) {
        if let Some(web_view) = &mut self.web_view {
            web_view.go_forward();
        }
    }

    pub fn reload(&mut self) {
        if let Some(web_view) = &mut self.web_view {
            web_view.reload();
        }
    }

    pub fn can_go_back(&self) -> bool {
        match &self.web_view {
            Some(web_view) => web_view
                .back_forward_list()
                .is_some_and(|list| list.can_go_back()),
            None => self
                .session_snapshot
                .as_ref()
                .is_some_and(|s| s.back_count() > 0),
        }
    }

    pub fn can_go_forward(&self) -> bool {
        match &self.web_view {
            Some(web_view) => web_view
                .back_forward_list()
                .is_some_and(|list| list.can_go_forward()),
            None => self
                .session_snapshot
                .as_ref()
                .is_some_and(|s| s.forward_count() > 0),
        }
    }

    pub(crate) fn has_content(&self) -> bool {
        self.session_snapshot.is_some() || self.pending_url.is_some()
    }

    /// Create and attach a web view, restoring the snapshot if there is one.
    /// A deferred load waits for `load_pending`. Returns `false` when the tab
    /// was already live.
    pub(crate) fn create_web_view(
        &mut self,
        factory: &dyn WebViewFactory,
        config: WebViewConfiguration,
        navigation: &Rc<NavigationDelegateMultiplexer>,
    ) -> bool {
        if self.web_view.is_some() {
            return false;
        }

        let mut web_view = factory.create(config);
        web_view.set_navigation_delegate(Some(Rc::clone(navigation)));
        if let Some(snapshot) = &self.session_snapshot {
            web_view.restore(snapshot);
        }
        self.web_view = Some(web_view);
        true
    }

    /// Start the load deferred while the tab had no web view
    pub(crate) fn load_pending(&mut self) {
        if let (Some(web_view), Some(url)) = (&mut self.web_view, self.pending_url.take()) {
            web_view.load(&url);
        }
    }

    /// Stop routing navigation callbacks for this tab
    pub(crate) fn detach_navigation(&mut self) {
        if let Some(web_view) = &mut self.web_view {
            web_view.set_navigation_delegate(None);
        }
    }

    /// Capture the session and release the web view
    pub(crate) fn close_web_view(&mut self) -> bool {
        if self.web_view.is_none() {
            return false;
        }
        self.invalidate_session_snapshot();
        self.capture_session_snapshot();
        self.title = Some(self.display_title()).filter(|t| !t.is_empty());
        self.teardown();
        true
    }

    /// Release the web view without saving anything
    pub(crate) fn teardown(&mut self) {
        if let Some(mut web_view) = self.web_view.take() {
            web_view.set_navigation_delegate(None);
            web_view.close();
        }
    }

    /// Capture a snapshot from the live web view unless one is already cached
    pub fn capture_session_snapshot(&mut self) -> Option<&SessionSnapshot> {
        if self.session_snapshot.is_none() {
            let title = Some(self.display_title()).filter(|t| !t.is_empty());
            self.session_snapshot = self
                .web_view
                .as_ref()
                .and_then(|w| w.back_forward_list())
                .map(|list| {
                    let mut snapshot = list.to_snapshot(title);
                    snapshot.last_used_time = self.last_active;
                    snapshot
                });
        }
        self.session_snapshot.as_ref()
    }

    /// Capture a snapshot if none is cached, then bring its title and
    /// last-used time up to date with the tab
    pub(crate) fn refresh_session_snapshot(&mut self) -> Option<&SessionSnapshot> {
        self.capture_session_snapshot();
        let title = self
            .web_view
            .as_ref()
            .and_then(|w| w.title())
            .or_else(|| self.title.clone())
            .filter(|t| !t.is_empty());
        let last_active = self.last_active;

        if let Some(snapshot) = &mut self.session_snapshot {
            snapshot.last_used_time = last_active;
            if title.is_some() {
                snapshot.current_title = title;
            }
        }
        self.session_snapshot.as_ref()
    }

    /// Drop a cached snapshot after the live history changed. A dehydrated
    /// tab keeps its snapshot since it is the only copy of its history.
    pub fn invalidate_session_snapshot(&mut self) {
        if self.web_view.is_some() {
            self.session_snapshot = None;
        }
    }

    /// Replace the screenshot. With `revise_uuid` a fresh blob key is
    /// minted, which also invalidates any in-flight fetch of the old one.
    pub fn set_screenshot(&mut self, screenshot: Option<Thumbnail>, revise_uuid: bool) {
        if revise_uuid {
            self.screenshot_uuid = screenshot.as_ref().map(|_| Uuid::new_v4());
        }
        self.screenshot = screenshot;
        self.screenshot_stored = false;
    }

    /// Apply a thumbnail fetched for `uuid` if it is still this tab's key
    pub(crate) fn apply_loaded_screenshot(&mut self, uuid: Uuid, screenshot: Thumbnail) -> bool {
        if self.screenshot_uuid != Some(uuid) {
            return false;
        }
        self.screenshot = Some(screenshot);
        self.screenshot_stored = true;
        true
    }

    /// Screenshot not yet written to the blob store
    pub(crate) fn unstored_screenshot(&self) -> Option<(Uuid, &Thumbnail)> {
        if self.screenshot_stored {
            return None;
        }
        self.screenshot_uuid.zip(self.screenshot.as_ref())
    }

    pub(crate) fn mark_screenshot_stored(&mut self) {
        self.screenshot_stored = true;
    }

    pub fn to_saved_tab(&self, is_selected: bool) -> SavedTab {
        SavedTab {
            is_selected,
            title: Some(self.display_title()).filter(|t| !t.is_empty()),
            is_private: self.is_private,
            session_data: self.session_snapshot.clone(),
            screenshot_uuid: self.screenshot_uuid,
        }
    }
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("is_private", &self.is_private)
            .field("state", &self.state())
            .field("web_view", &self.web_view_id())
            .field("screenshot_uuid", &self.screenshot_uuid)
            .field("last_active", &self.last_active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_navigation::testing::FakeWebViewFactory;

    fn config(is_private: bool) -> WebViewConfiguration {
        WebViewConfiguration {
            id: WebViewId::next(),
            is_private,
            block_popups: true,
            user_agent: None,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_dehydrate_and_rehydrate_keep_history() {
        let factory = FakeWebViewFactory::new();
        let navigation = Rc::new(NavigationDelegateMultiplexer::new());
        let mut tab = Tab::new(false);

        assert!(tab.create_web_view(&factory, config(false), &navigation));
        tab.load(&url("https://a.test/"));
        tab.load(&url("https://b.test/"));
        tab.go_back();

        assert!(tab.close_web_view());
        assert_eq!(tab.state(), TabState::Dehydrated);
        assert_eq!(factory.live_count(), 0);
        assert_eq!(tab.url(), Some(url("https://a.test/")));
        assert!(tab.can_go_forward());
        assert_eq!(tab.display_title(), "Title of https://a.test/");

        assert!(tab.create_web_view(&factory, config(false), &navigation));
        assert_eq!(factory.log().restores.len(), 1);
        assert_eq!(tab.url(), Some(url("https://a.test/")));
    }

    #[test]
    fn test_load_on_dehydrated_tab_is_deferred() {
        let factory = FakeWebViewFactory::new();
        let navigation = Rc::new(NavigationDelegateMultiplexer::new());
        let mut tab = Tab::new(false);
        let target = url("https://deferred.test/");

        tab.load(&target);
        assert!(factory.log().loads.is_empty());
        assert_eq!(tab.url(), Some(target.clone()));

        tab.create_web_view(&factory, config(false), &navigation);
        assert!(factory.log().loads.is_empty());
        tab.load_pending();
        let web_view = tab.web_view_id().unwrap();
        assert_eq!(factory.loads_for(web_view), vec![target]);
    }

    #[test]
    fn test_dehydrated_snapshot_survives_invalidation() {
        let snapshot = SessionSnapshot::from_history(&[], url("https://a.test/"), &[], None);
        let mut tab = Tab::from_saved(SavedTab {
            is_selected: false,
            title: Some("A".to_string()),
            is_private: false,
            session_data: Some(snapshot),
            screenshot_uuid: None,
        });

        tab.invalidate_session_snapshot();
        assert!(tab.session_snapshot().is_some());
        assert_eq!(tab.display_title(), "A");
    }

    #[test]
    fn test_screenshot_uuid_guards_loaded_thumbnail() {
        let mut tab = Tab::new(false);
        tab.set_screenshot(Some(Thumbnail::from_bytes(b"one".to_vec())), true);
        let stale = tab.screenshot_uuid().unwrap();
        assert!(tab.unstored_screenshot().is_some());

        tab.set_screenshot(Some(Thumbnail::from_bytes(b"two".to_vec())), true);
        assert!(!tab.apply_loaded_screenshot(stale, Thumbnail::from_bytes(b"one".to_vec())));
        assert_eq!(tab.screenshot().unwrap().as_bytes(), b"two");

        tab.set_screenshot(None, true);
        assert!(tab.screenshot_uuid().is_none());
    }

    #[test]
    fn test_saved_tab_carries_display_data() {
        let factory = FakeWebViewFactory::new();
        let navigation = Rc::new(NavigationDelegateMultiplexer::new());
        let mut tab = Tab::new(true);
        tab.create_web_view(&factory, config(true), &navigation);
        tab.load(&url("https://p.test/"));
        tab.capture_session_snapshot();

        let saved = tab.to_saved_tab(true);
        assert!(saved.is_selected);
        assert!(saved.is_private);
        assert_eq!(saved.title.as_deref(), Some("Title of https://p.test/"));
        assert_eq!(saved.session_data.unwrap().urls, vec![url("https://p.test/")]);
    }

    #[test]
    fn test_refresh_updates_cached_snapshot() {
        let snapshot = SessionSnapshot::from_history(&[], url("https://a.test/"), &[], None);
        let mut tab = Tab::from_saved(SavedTab {
            is_selected: false,
            title: Some("A".to_string()),
            is_private: false,
            session_data: Some(snapshot),
            screenshot_uuid: None,
        });
        let later = tab.last_active() + chrono::Duration::hours(1);
        tab.set_last_active(later);

        let refreshed = tab.refresh_session_snapshot().unwrap();
        assert_eq!(refreshed.last_used_time, later);
        assert_eq!(refreshed.current_title.as_deref(), Some("A"));

        let factory = FakeWebViewFactory::new();
        let navigation = Rc::new(NavigationDelegateMultiplexer::new());
        tab.create_web_view(&factory, config(false), &navigation);
        tab.load(&url("https://b.test/"));

        let refreshed = tab.refresh_session_snapshot().unwrap();
        assert_eq!(
            refreshed.current_title.as_deref(),
            Some("Title of https://b.test/")
        );
    }
}
