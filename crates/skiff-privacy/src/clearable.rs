//! Clearables: one per kind of data the user can wipe

use std::sync::Arc;

use skiff_storage::Database;

use crate::category::{DataCategory, WebsiteDataKind};
use crate::Result;

/// Something that can wipe one category of private data. `clear` blocks and
/// is always run off the UI thread.
pub trait Clearable: Send + Sync {
    fn category(&self) -> DataCategory;

    /// Short name used in logs and reports
    fn label(&self) -> &str;

    fn clear(&self) -> Result<()>;
}

/// Engine data store holding caches, cookies and site data
pub trait WebsiteDataStore: Send + Sync {
    fn remove(&self, kinds: &[WebsiteDataKind]) -> Result<()>;
}

pub struct HistoryClearable {
    db: Database,
}

impl HistoryClearable {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Clearable for HistoryClearable {
    fn category(&self) -> DataCategory {
        DataCategory::History
    }

    fn label(&self) -> &str {
        "history"
    }

    fn clear(&self) -> Result<()> {
        let removed = self.db.clear_history()?;
        tracing::debug!(removed, "Cleared history");
        Ok(())
    }
}

pub struct WebsiteDataClearable {
    store: Arc<dyn WebsiteDataStore>,
    category: DataCategory,
}

impl WebsiteDataClearable {
    pub fn new(store: Arc<dyn WebsiteDataStore>, category: DataCategory) -> Self {
        Self { store, category }
    }

    /// One clearable per engine-backed category
    pub fn all(store: Arc<dyn WebsiteDataStore>) -> Vec<Self> {
        [DataCategory::Cache, DataCategory::Cookies, DataCategory::SiteData]
            .into_iter()
            .map(|category| Self::new(Arc::clone(&store), category))
            .collect()
    }
}

impl Clearable for WebsiteDataClearable {
    fn category(&self) -> DataCategory {
        self.category
    }

    fn label(&self) -> &str {
        self.category.as_str()
    }

    fn clear(&self) -> Result<()> {
        let kinds = WebsiteDataKind::for_category(self.category);
        if kinds.is_empty() {
            return Ok(());
        }
        self.store.remove(kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        removed: Mutex<Vec<WebsiteDataKind>>,
    }

    impl WebsiteDataStore for RecordingStore {
        fn remove(&self, kinds: &[WebsiteDataKind]) -> Result<()> {
            self.removed.lock().unwrap().extend_from_slice(kinds);
            Ok(())
        }
    }

    #[test]
    fn test_history_clearable() {
        let db = Database::open_in_memory().unwrap();
        db.record_visit("https://a.test/", "A").unwrap();

        let clearable = HistoryClearable::new(db.clone());
        clearable.clear().unwrap();

        assert_eq!(db.visit_count("https://a.test/").unwrap(), 0);
        assert_eq!(clearable.category(), DataCategory::History);
    }

    #[test]
    fn test_website_data_clearable_removes_category_kinds() {
        let store = Arc::new(RecordingStore::default());
        let clearables = WebsiteDataClearable::all(store.clone());
        assert_eq!(clearables.len(), 3);

        let cookies = clearables
            .iter()
            .find(|c| c.category() == DataCategory::Cookies)
            .unwrap();
        cookies.clear().unwrap();

        assert_eq!(*store.removed.lock().unwrap(), vec![WebsiteDataKind::Cookies]);
    }
}
