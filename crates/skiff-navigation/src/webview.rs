//! Web view capability
//!
//! The engine owns rendering and networking. Skiff only ever creates, drives,
//! snapshots and closes web views through these traits.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use skiff_session::SessionSnapshot;
use skiff_storage::Thumbnail;
use url::Url;

use crate::back_forward::BackForwardList;
use crate::multiplexer::NavigationDelegateMultiplexer;

static NEXT_WEB_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique web view identifier
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WebViewId(u64);

impl WebViewId {
    pub fn next() -> Self {
        Self(NEXT_WEB_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WebViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "webview-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebViewConfiguration {
    pub id: WebViewId,
    /// Private web views use a non-persistent data store
    pub is_private: bool,
    pub block_popups: bool,
    pub user_agent: Option<String>,
}

pub trait WebViewFactory {
    fn create(&self, config: WebViewConfiguration) -> Box<dyn WebView>;
}

pub trait WebView {
    fn id(&self) -> WebViewId;

    fn load(&mut self, url: &Url);

    fn go_back(&mut self);

    fn go_forward(&mut self);

    fn reload(&mut self);

    fn url(&self) -> Option<Url>;

    fn title(&self) -> Option<String>;

    /// `None` until the first navigation commits
    fn back_forward_list(&self) -> Option<BackForwardList>;

    fn snapshot_image(&self) -> Option<Thumbnail>;

    /// Replace the history with a snapshot's and load its current entry
    fn restore(&mut self, snapshot: &SessionSnapshot);

    /// Route navigation callbacks to `delegate`, or stop routing them with `None`
    fn set_navigation_delegate(&mut self, delegate: Option<Rc<NavigationDelegateMultiplexer>>);

    /// Tear down the engine-side view. No callbacks arrive afterwards.
    fn close(&mut self);
}
