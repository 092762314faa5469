//! In-memory web view engine for tests
//!
//! `FakeWebViewFactory` hands out `FakeWebView`s that share one `EngineLog`,
//! so a test can keep a clone of the factory and inspect what the code under
//! test created, loaded, restored and closed. Loads complete synchronously
//! and fire provisional-start, commit and finish through the attached
//! navigation delegate.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use skiff_session::SessionSnapshot;
use skiff_storage::Thumbnail;
use url::Url;

use crate::back_forward::BackForwardList;
use crate::delegate::NavigationEvent;
use crate::multiplexer::NavigationDelegateMultiplexer;
use crate::webview::{WebView, WebViewConfiguration, WebViewFactory, WebViewId};

#[derive(Debug, Default)]
pub struct EngineLog {
    pub created: Vec<WebViewConfiguration>,
    pub closed: Vec<WebViewId>,
    pub loads: Vec<(WebViewId, Url)>,
    pub restores: Vec<(WebViewId, SessionSnapshot)>,
}

#[derive(Clone, Default)]
pub struct FakeWebViewFactory {
    log: Rc<RefCell<EngineLog>>,
}

impl FakeWebViewFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Ref<'_, EngineLog> {
        self.log.borrow()
    }

    /// Web views created and not yet closed
    pub fn live_count(&self) -> usize {
        let log = self.log.borrow();
        log.created.len() - log.closed.len()
    }

    pub fn is_live(&self, id: WebViewId) -> bool {
        let log = self.log.borrow();
        log.created.iter().any(|c| c.id == id) && !log.closed.contains(&id)
    }

    pub fn loads_for(&self, id: WebViewId) -> Vec<Url> {
        self.log
            .borrow()
            .loads
            .iter()
            .filter(|(web_view, _)| *web_view == id)
            .map(|(_, url)| url.clone())
            .collect()
    }
}

impl WebViewFactory for FakeWebViewFactory {
    fn create(&self, config: WebViewConfiguration) -> Box<dyn WebView> {
        self.log.borrow_mut().created.push(config.clone());
        Box::new(FakeWebView {
            id: config.id,
            history: None,
            delegate: None,
            closed: false,
            log: Rc::clone(&self.log),
        })
    }
}

pub struct FakeWebView {
    id: WebViewId,
    history: Option<BackForwardList>,
    delegate: Option<Rc<NavigationDelegateMultiplexer>>,
    closed: bool,
    log: Rc<RefCell<EngineLog>>,
}

impl FakeWebView {
    fn title_for(url: &Url) -> String {
        format!("Title of {url}")
    }

    fn event(&self) -> NavigationEvent {
        NavigationEvent::new(self.id, self.url()).with_title(self.title())
    }

    fn complete_navigation(&self) {
        if let Some(delegate) = &self.delegate {
            let event = self.event();
            delegate.did_start_provisional_navigation(&event);
            delegate.did_commit(&event);
            delegate.did_finish(&event);
        }
    }
}

impl WebView for FakeWebView {
    fn id(&self) -> WebViewId {
        self.id
    }

    fn load(&mut self, url: &Url) {
        assert!(!self.closed, "load on closed web view {}", self.id);
        self.log.borrow_mut().loads.push((self.id, url.clone()));
        match &mut self.history {
            Some(history) => history.push(url.clone()),
            None => self.history = Some(BackForwardList::new(url.clone())),
        }
        self.complete_navigation();
    }

    fn go_back(&mut self) {
        if self.history.as_mut().is_some_and(|h| h.go_back()) {
            self.complete_navigation();
        }
    }

    fn go_forward(&mut self) {
        if self.history.as_mut().is_some_and(|h| h.go_forward()) {
            self.complete_navigation();
        }
    }

    fn reload(&mut self) {
        if self.history.is_some() {
            self.complete_navigation();
        }
    }

    fn url(&self) -> Option<Url> {
        self.history.as_ref().map(|h| h.current.clone())
    }

    fn title(&self) -> Option<String> {
        self.history.as_ref().map(|h| Self::title_for(&h.current))
    }

    fn back_forward_list(&self) -> Option<BackForwardList> {
        self.history.clone()
    }

    fn snapshot_image(&self) -> Option<Thumbnail> {
        self.url().map(|url| Thumbnail::from_bytes(url.as_str().as_bytes()))
    }

    fn restore(&mut self, snapshot: &SessionSnapshot) {
        self.log
            .borrow_mut()
            .restores
            .push((self.id, snapshot.clone()));
        self.history = BackForwardList::from_snapshot(snapshot);
    }

    fn set_navigation_delegate(&mut self, delegate: Option<Rc<NavigationDelegateMultiplexer>>) {
        self.delegate = delegate;
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.delegate = None;
            self.log.borrow_mut().closed.push(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_engine_tracks_lifecycle() {
        let factory = FakeWebViewFactory::new();
        let id = WebViewId::next();
        let mut web_view = factory.create(WebViewConfiguration {
            id,
            is_private: false,
            block_popups: true,
            user_agent: None,
        });

        let a = Url::parse("https://a.test/").unwrap();
        let b = Url::parse("https://b.test/").unwrap();
        web_view.load(&a);
        web_view.load(&b);
        web_view.go_back();

        assert_eq!(web_view.url(), Some(a.clone()));
        assert_eq!(factory.loads_for(id), vec![a, b]);
        assert!(factory.is_live(id));

        web_view.close();
        assert_eq!(factory.live_count(), 0);
    }
}
