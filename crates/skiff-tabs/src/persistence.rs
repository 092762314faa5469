//! Saving and restoring the tab collection
//!
//! `store_changes` writes screenshots to the blob store, prunes blobs no
//! tab references, then writes the archive. `restore_tabs` rebuilds
//! dehydrated tabs from the archive and fetches their screenshots off the
//! calling thread; `process_pending` applies whatever has arrived.

use std::collections::HashSet;
use std::sync::Arc;

use skiff_session::PrivateTabPolicy;
use skiff_storage::Thumbnail;
use uuid::Uuid;

use crate::manager::{AddTabOptions, TabManager};
use crate::tab::{Tab, TabId};

/// A screenshot fetched from the blob store for a restored tab
#[derive(Debug)]
pub(crate) struct LoadedThumbnail {
    pub(crate) tab: TabId,
    pub(crate) uuid: Uuid,
    pub(crate) thumbnail: Thumbnail,
}

impl TabManager {
    /// Persist the collection. Errors are logged, never returned.
    pub fn store_changes(&mut self) {
        if self.is_restoring {
            tracing::trace!("Skipping tab write during restore");
            return;
        }
        self.sync_navigation_state();

        let policy = self.config.private_tab_policy();
        let selected = self.selected;
        let mut saved = Vec::with_capacity(self.tabs.len());
        let mut referenced = HashSet::new();

        for tab in &mut self.tabs {
            if tab.is_private() && policy == PrivateTabPolicy::Exclude {
                continue;
            }
            tab.refresh_session_snapshot();

            if let Some((uuid, screenshot)) = tab.unstored_screenshot() {
                match self.blob_store.put(&uuid.to_string(), screenshot) {
                    Ok(()) => tab.mark_screenshot_stored(),
                    Err(error) => {
                        tracing::warn!(tab_id = %tab.id(), %error, "Failed to store screenshot")
                    }
                }
            }
            if let Some(uuid) = tab.screenshot_uuid() {
                referenced.insert(uuid.to_string());
            }

            saved.push(tab.to_saved_tab(Some(tab.id()) == selected));
        }

        match self.blob_store.clear_excluding(&referenced) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Pruned unreferenced screenshots"),
            Err(error) => tracing::warn!(%error, "Failed to prune screenshots"),
        }

        match self.archive.write(&saved, policy) {
            Ok(()) => tracing::debug!(count = saved.len(), "Stored tabs"),
            Err(error) => tracing::error!(
                path = %self.archive.path().display(),
                %error,
                "Failed to write tab archive"
            ),
        }
    }

    /// Rebuild tabs from the archive and select one. With nothing to
    /// restore and no tabs open, a fresh tab is created and selected.
    /// Returns the number of restored tabs.
    pub fn restore_tabs(&mut self) -> usize {
        self.is_restoring = true;

        let records = match self.archive.read() {
            Ok(Some(archive)) => archive.tabs,
            Ok(None) => {
                tracing::debug!("No tab archive to restore");
                Vec::new()
            }
            Err(error) => {
                tracing::warn!(%error, "Discarding unreadable tab archive");
                Vec::new()
            }
        };

        let keep_private = self.config.persist_private_tabs;
        let mut restored = Vec::new();
        let mut to_select = None;

        for record in records {
            if record.is_private && !keep_private {
                continue;
            }
            let is_selected = record.is_selected;
            let tab = Tab::from_saved(record);
            let id = tab.id();
            if let Some(uuid) = tab.screenshot_uuid() {
                self.fetch_thumbnail(id, uuid);
            }

            self.tabs.push(tab);
            self.notify_tab(id, |delegate, tab, index| delegate.did_add_tab(tab, index, true));
            restored.push(id);
            if is_selected && to_select.is_none() {
                to_select = Some(id);
            }
        }

        if !restored.is_empty() {
            tracing::info!(count = restored.len(), "Restored tabs");
            self.notify_restored(restored.len());
        }

        if let Some(id) = to_select.or_else(|| restored.first().copied()) {
            self.select_tab(Some(id));
        }
        self.is_restoring = false;

        if self.tabs.is_empty() {
            let fresh = self.add_tab_with(None, false, AddTabOptions { flush_to_disk: false });
            self.select_tab(Some(fresh));
        }

        restored.len()
    }

    /// Apply work that completed since the last call: snapshot invalidation
    /// from committed navigations, fetched screenshots, and a write after
    /// any finished navigation.
    pub fn process_pending(&mut self) {
        self.sync_navigation_state();

        while let Ok(loaded) = self.thumbnails_rx.try_recv() {
            let applied = self
                .get_mut(loaded.tab)
                .is_some_and(|tab| tab.apply_loaded_screenshot(loaded.uuid, loaded.thumbnail));
            if applied {
                tracing::trace!(tab_id = %loaded.tab, "Applied restored screenshot");
            } else {
                tracing::debug!(tab_id = %loaded.tab, uuid = %loaded.uuid, "Discarding stale screenshot");
            }
        }

        if self.bookkeeping.take_finished() {
            self.store_changes();
        }
    }

    fn fetch_thumbnail(&self, tab: TabId, uuid: Uuid) {
        let store = Arc::clone(&self.blob_store);
        let tx = self.thumbnails_tx.clone();

        let job = move || match store.get(&uuid.to_string()) {
            Ok(Some(thumbnail)) => {
                let _ = tx.send(LoadedThumbnail {
                    tab,
                    uuid,
                    thumbnail,
                });
            }
            Ok(None) => tracing::debug!(tab_id = %tab, %uuid, "Screenshot missing from store"),
            Err(error) => tracing::warn!(tab_id = %tab, %error, "Failed to load screenshot"),
        };

        match &self.runtime {
            Some(handle) => {
                handle.spawn_blocking(job);
            }
            None => job(),
        }
    }
}
