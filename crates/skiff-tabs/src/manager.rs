//! Tab Manager
//!
//! Owns every tab, the selection and the live web view budget. The manager
//! is confined to the thread that created it: tabs hold `Rc` handles to the
//! navigation multiplexer, so it is neither `Send` nor `Sync`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use skiff_navigation::{
    DelegateId, NavigationCallback, NavigationCallbacks, NavigationDelegate,
    NavigationDelegateMultiplexer, NavigationEvent, WebViewConfiguration, WebViewFactory,
    WebViewId,
};
use skiff_session::{ArchiveStore, PrivateTabPolicy};
use skiff_storage::{BlobStore, PreferenceStore, PREF_BLOCK_POPUPS, PREF_CLOSE_PRIVATE_TABS};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use url::Url;

use crate::delegate::{DelegateRegistry, ObserverId, TabManagerDelegate};
use crate::error::TabError;
use crate::persistence::LoadedThumbnail;
use crate::tab::{Tab, TabId};
use crate::Result;

pub const DEFAULT_MAX_LIVE_WEB_VIEWS: usize = 5;

#[derive(Debug, Clone)]
pub struct TabManagerConfig {
    /// Live web view budget. Values below 1 behave as 1.
    pub max_live_web_views: usize,
    /// Loaded by tabs created without a URL
    pub new_tab_url: Url,
    pub persist_private_tabs: bool,
    pub user_agent: Option<String>,
}

impl TabManagerConfig {
    pub fn new(new_tab_url: Url) -> Self {
        Self {
            max_live_web_views: DEFAULT_MAX_LIVE_WEB_VIEWS,
            new_tab_url,
            persist_private_tabs: false,
            user_agent: None,
        }
    }

    pub(crate) fn private_tab_policy(&self) -> PrivateTabPolicy {
        if self.persist_private_tabs {
            PrivateTabPolicy::Persist
        } else {
            PrivateTabPolicy::Exclude
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddTabOptions {
    /// Write the archive once the tab is added
    pub flush_to_disk: bool,
}

impl Default for AddTabOptions {
    fn default() -> Self {
        Self {
            flush_to_disk: true,
        }
    }
}

/// Records which web views committed or finished a navigation so the
/// manager can refresh snapshots on its next pass.
#[derive(Default)]
pub(crate) struct NavigationBookkeeping {
    committed: RefCell<Vec<WebViewId>>,
    finished: Cell<bool>,
}

impl NavigationBookkeeping {
    pub(crate) fn take_committed(&self) -> Vec<WebViewId> {
        std::mem::take(&mut *self.committed.borrow_mut())
    }

    pub(crate) fn take_finished(&self) -> bool {
        self.finished.replace(false)
    }
}

impl NavigationDelegate for NavigationBookkeeping {
    fn callbacks(&self) -> NavigationCallbacks {
        NavigationCallbacks::only([NavigationCallback::DidCommit, NavigationCallback::DidFinish])
    }

    fn did_commit(&self, event: &NavigationEvent) {
        self.committed.borrow_mut().push(event.web_view);
    }

    fn did_finish(&self, _event: &NavigationEvent) {
        self.finished.set(true);
    }
}

pub struct TabManager {
    pub(crate) config: TabManagerConfig,
    pub(crate) tabs: Vec<Tab>,
    pub(crate) selected: Option<TabId>,
    pub(crate) is_restoring: bool,
    delegates: DelegateRegistry,
    navigation: Rc<NavigationDelegateMultiplexer>,
    pub(crate) bookkeeping: Rc<NavigationBookkeeping>,
    web_views: Box<dyn WebViewFactory>,
    pub(crate) archive: ArchiveStore,
    pub(crate) blob_store: Arc<dyn BlobStore>,
    preferences: Arc<dyn PreferenceStore>,
    pub(crate) runtime: Option<Handle>,
    pub(crate) thumbnails_tx: mpsc::UnboundedSender<LoadedThumbnail>,
    pub(crate) thumbnails_rx: mpsc::UnboundedReceiver<LoadedThumbnail>,
}

impl TabManager {
    pub fn new(
        config: TabManagerConfig,
        web_views: Box<dyn WebViewFactory>,
        archive: ArchiveStore,
        blob_store: Arc<dyn BlobStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let navigation = Rc::new(NavigationDelegateMultiplexer::new());
        let bookkeeping = Rc::new(NavigationBookkeeping::default());
        navigation.add(&bookkeeping);
        let (thumbnails_tx, thumbnails_rx) = mpsc::unbounded_channel();

        Self {
            config,
            tabs: Vec::new(),
            selected: None,
            is_restoring: false,
            delegates: DelegateRegistry::default(),
            navigation,
            bookkeeping,
            web_views,
            archive,
            blob_store,
            preferences,
            runtime: None,
            thumbnails_tx,
            thumbnails_rx,
        }
    }

    /// Run thumbnail fetches on `handle`'s blocking pool instead of inline
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn config(&self) -> &TabManagerConfig {
        &self.config
    }

    // ---- Queries ----

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn normal_tabs(&self) -> impl Iterator<Item = &Tab> + '_ {
        self.tabs.iter().filter(|t| !t.is_private())
    }

    pub fn private_tabs(&self) -> impl Iterator<Item = &Tab> + '_ {
        self.tabs.iter().filter(|t| t.is_private())
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id() == id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id() == id)
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    pub fn selected_id(&self) -> Option<TabId> {
        self.selected
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.index_of(id))
    }

    pub fn tab_for_web_view(&self, web_view: WebViewId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.web_view_id() == Some(web_view))
    }

    pub fn tab_for_url(&self, url: &Url) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.url().as_ref() == Some(url))
    }

    pub fn live_web_view_count(&self) -> usize {
        self.tabs.iter().filter(|t| t.is_live()).count()
    }

    pub fn is_restoring(&self) -> bool {
        self.is_restoring
    }

    // ---- Observers ----

    pub fn add_delegate<D: TabManagerDelegate + 'static>(&mut self, delegate: &Rc<D>) -> ObserverId {
        self.delegates.add(delegate)
    }

    pub fn remove_delegate(&mut self, id: ObserverId) -> bool {
        self.delegates.remove(id)
    }

    /// Register an observer of every tab's navigation
    pub fn add_navigation_delegate<D: NavigationDelegate + 'static>(
        &self,
        delegate: &Rc<D>,
    ) -> DelegateId {
        self.navigation.add(delegate)
    }

    pub fn remove_navigation_delegate(&self, id: DelegateId) -> bool {
        self.navigation.remove(id)
    }

    // ---- Adding ----

    pub fn add_tab(&mut self, url: Option<Url>, is_private: bool) -> TabId {
        self.add_tab_with(url, is_private, AddTabOptions::default())
    }

    /// Append a live tab and start loading `url`, or the new tab page.
    /// The selection is left alone.
    pub fn add_tab_with(&mut self, url: Option<Url>, is_private: bool, options: AddTabOptions) -> TabId {
        self.limit_in_memory_tabs();

        let config = self.web_view_configuration(is_private);
        let mut tab = Tab::new(is_private);
        tab.create_web_view(self.web_views.as_ref(), config, &self.navigation);
        let id = tab.id();
        self.tabs.push(tab);

        tracing::info!(tab_id = %id, is_private, "Added tab");
        self.notify_tab(id, |delegate, tab, index| delegate.did_add_tab(tab, index, false));
        self.notify_tab(id, |delegate, tab, _| delegate.did_create_web_view(tab));

        let url = url.unwrap_or_else(|| self.config.new_tab_url.clone());
        if let Some(tab) = self.get_mut(id) {
            tab.load(&url);
        }

        if options.flush_to_disk {
            self.store_changes();
        }
        id
    }

    pub fn add_tab_and_select(&mut self, url: Option<Url>, is_private: bool) -> TabId {
        let id = self.add_tab_with(url, is_private, AddTabOptions { flush_to_disk: false });
        self.select_tab(Some(id));
        id
    }

    // ---- Selection ----

    /// Select `id`, or nothing. An id that is not in the collection selects
    /// nothing.
    pub fn select_tab(&mut self, id: Option<TabId>) {
        let index = id.and_then(|id| self.index_of(id));
        if let (Some(id), None) = (id, index) {
            tracing::warn!(tab_id = %id, "Selecting unknown tab; clearing selection");
        }

        let target = index.map(|i| self.tabs[i].id());
        if target == self.selected && index.map_or(true, |i| self.tabs[i].is_live()) {
            return;
        }

        let previous = self.selected;
        self.selected = target;
        self.store_changes();

        if let Some(id) = target {
            self.rehydrate(id);
            if let Some(tab) = self.get_mut(id) {
                tab.touch();
            }
        }

        tracing::debug!(
            selected = ?target,
            previous = ?previous,
            "Selected tab"
        );
        self.notify_selection(previous);
        self.limit_in_memory_tabs();
    }

    /// Clear the selection without persisting
    fn clear_selection(&mut self) {
        if let Some(previous) = self.selected.take() {
            self.notify_selection(Some(previous));
        }
    }

    // ---- Removal ----

    pub fn remove_tab(&mut self, id: TabId, create_tab_if_none_left: bool) -> Result<()> {
        self.remove_tab_inner(id, true)?;

        if create_tab_if_none_left && self.normal_tabs().next().is_none() {
            let fresh = self.add_tab_with(None, false, AddTabOptions { flush_to_disk: false });
            self.select_tab(Some(fresh));
        }

        self.store_changes();
        Ok(())
    }

    fn remove_tab_inner(&mut self, id: TabId, notify: bool) -> Result<()> {
        if self.index_of(id).is_none() {
            return Err(TabError::NotFound(id));
        }

        if self.selected == Some(id) {
            let sibling = self.sibling_for_removal(id);
            self.select_tab(sibling);
        }

        let index = self.index_of(id).ok_or(TabError::NotFound(id))?;
        let mut tab = self.tabs.remove(index);
        tab.detach_navigation();
        tracing::info!(tab_id = %id, is_private = tab.is_private(), "Removed tab");

        if notify {
            for delegate in self.delegates.live() {
                delegate.did_remove_tab(&tab, index);
            }
        }
        tab.teardown();
        Ok(())
    }

    /// Nearest tab before `id` in its privacy partition, else the
    /// partition's last tab
    fn sibling_for_removal(&self, id: TabId) -> Option<TabId> {
        let index = self.index_of(id)?;
        let is_private = self.tabs[index].is_private();
        let partition = || {
            self.tabs
                .iter()
                .enumerate()
                .filter(move |(i, t)| *i != index && t.is_private() == is_private)
        };

        partition()
            .filter(|(i, _)| *i < index)
            .last()
            .or_else(|| partition().last())
            .map(|(_, t)| t.id())
    }

    pub fn remove_all(&mut self) {
        for tab in &mut self.tabs {
            tab.teardown();
        }
        self.clear_selection();

        let ids: Vec<TabId> = self.tabs.iter().map(Tab::id).collect();
        for id in ids {
            if let Err(error) = self.remove_tab_inner(id, true) {
                tracing::warn!(%error, "Failed to remove tab");
            }
        }

        tracing::info!("Removed all tabs");
        self.store_changes();
    }

    pub fn remove_all_private_tabs_and_notify(&mut self, notify: bool) {
        if self.selected_tab().is_some_and(Tab::is_private) {
            self.clear_selection();
        }
        for tab in self.tabs.iter_mut().filter(|t| t.is_private()) {
            tab.teardown();
        }

        let ids: Vec<TabId> = self.private_tabs().map(Tab::id).collect();
        for id in &ids {
            if let Err(error) = self.remove_tab_inner(*id, notify) {
                tracing::warn!(%error, "Failed to remove private tab");
            }
        }

        tracing::info!(count = ids.len(), "Removed private tabs");
        self.store_changes();
    }

    /// Called before the UI leaves or enters private browsing
    pub fn will_switch_tab_mode(&mut self, leaving_private: bool) {
        if !leaving_private {
            return;
        }

        let close_private_tabs = match self.preferences.bool_for_key(PREF_CLOSE_PRIVATE_TABS) {
            Ok(value) => value.unwrap_or(false),
            Err(error) => {
                tracing::warn!(%error, "Failed to read private tab preference");
                false
            }
        };
        if close_private_tabs {
            self.remove_all_private_tabs_and_notify(false);
        }
    }

    // ---- Ordering ----

    pub fn move_tab(&mut self, id: TabId, to_index: usize) -> Result<()> {
        let from = self.index_of(id).ok_or(TabError::NotFound(id))?;
        let tab = self.tabs.remove(from);
        let to = to_index.min(self.tabs.len());
        self.tabs.insert(to, tab);

        if from != to {
            self.notify_tab(id, |delegate, tab, _| delegate.did_move_tab(tab, from, to));
            self.store_changes();
        }
        Ok(())
    }

    // ---- Screenshots ----

    /// Record a new screenshot under a fresh blob key
    pub fn set_screenshot(&mut self, id: TabId, screenshot: skiff_storage::Thumbnail) -> Result<()> {
        let tab = self.get_mut(id).ok_or(TabError::NotFound(id))?;
        tab.set_screenshot(Some(screenshot), true);
        Ok(())
    }

    /// Take a screenshot from the tab's live web view. Returns `false` for a
    /// dehydrated tab or an engine that produced no image.
    pub fn capture_screenshot(&mut self, id: TabId) -> Result<bool> {
        let tab = self.get_mut(id).ok_or(TabError::NotFound(id))?;
        match tab.web_view().and_then(|w| w.snapshot_image()) {
            Some(image) => {
                tab.set_screenshot(Some(image), true);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ---- Memory ----

    /// Dehydrate the least recently active live tab once the budget is
    /// reached. The selected tab is never evicted.
    pub fn limit_in_memory_tabs(&mut self) {
        let budget = self.config.max_live_web_views.max(1);
        let live = self.live_web_view_count();
        if live < budget {
            return;
        }

        let selected = self.selected;
        let victim = self
            .tabs
            .iter_mut()
            .filter(|t| t.is_live() && Some(t.id()) != selected)
            .min_by_key(|t| t.last_active());

        match victim {
            Some(tab) => {
                let id = tab.id();
                tab.close_web_view();
                tracing::info!(tab_id = %id, live, budget, "Evicted web view");
            }
            None => tracing::debug!(live, budget, "No web view eligible for eviction"),
        }
    }

    // ---- Internals ----

    /// Give the tab a web view if it has none
    pub(crate) fn rehydrate(&mut self, id: TabId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        if self.tabs[index].is_live() {
            return;
        }

        let config = self.web_view_configuration(self.tabs[index].is_private());
        let tab = &mut self.tabs[index];
        if !tab.has_content() {
            tab.load(&self.config.new_tab_url);
        }
        if !tab.create_web_view(self.web_views.as_ref(), config, &self.navigation) {
            return;
        }

        tracing::debug!(tab_id = %id, "Rehydrated tab");
        self.notify_tab(id, |delegate, tab, _| delegate.did_create_web_view(tab));
        if let Some(tab) = self.get_mut(id) {
            tab.load_pending();
        }
    }

    fn web_view_configuration(&self, is_private: bool) -> WebViewConfiguration {
        let block_popups = match self.preferences.bool_for_key(PREF_BLOCK_POPUPS) {
            Ok(value) => value.unwrap_or(true),
            Err(error) => {
                tracing::warn!(%error, "Failed to read popup preference");
                true
            }
        };

        WebViewConfiguration {
            id: WebViewId::next(),
            is_private,
            block_popups,
            user_agent: self.config.user_agent.clone(),
        }
    }

    /// Drop cached snapshots of tabs whose web view committed a navigation
    pub(crate) fn sync_navigation_state(&mut self) {
        for web_view in self.bookkeeping.take_committed() {
            if let Some(tab) = self
                .tabs
                .iter_mut()
                .find(|t| t.web_view_id() == Some(web_view))
            {
                tab.invalidate_session_snapshot();
            }
        }
    }

    pub(crate) fn notify_tab(&mut self, id: TabId, f: impl Fn(&dyn TabManagerDelegate, &Tab, usize)) {
        let delegates = self.delegates.live();
        if let Some(index) = self.index_of(id) {
            let tab = &self.tabs[index];
            for delegate in &delegates {
                f(delegate.as_ref(), tab, index);
            }
        }
    }

    fn notify_selection(&mut self, previous: Option<TabId>) {
        let delegates = self.delegates.live();
        let selected = self.selected_tab();
        let previous = previous.and_then(|id| self.get(id));
        for delegate in &delegates {
            delegate.did_select_tab(selected, previous);
        }
    }

    pub(crate) fn notify_restored(&mut self, count: usize) {
        for delegate in self.delegates.live() {
            delegate.did_restore_tabs(count);
        }
    }
}
