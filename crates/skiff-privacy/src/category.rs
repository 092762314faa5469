//! What can be cleared
//!
//! | Category  | Cleared from                                   |
//! | History   | `history` table                                |
//! | Cache     | Engine disk + memory cache                     |
//! | Cookies   | Engine cookie jar                              |
//! | SiteData  | Local storage, IndexedDB, service workers      |

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataCategory {
    History,
    Cache,
    Cookies,
    SiteData,
}

impl DataCategory {
    pub const ALL: [DataCategory; 4] = [
        DataCategory::History,
        DataCategory::Cache,
        DataCategory::Cookies,
        DataCategory::SiteData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::History => "history",
            DataCategory::Cache => "cache",
            DataCategory::Cookies => "cookies",
            DataCategory::SiteData => "siteData",
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engine-side record types removed through a `WebsiteDataStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebsiteDataKind {
    DiskCache,
    MemoryCache,
    Cookies,
    LocalStorage,
    IndexedDb,
    ServiceWorkers,
}

impl WebsiteDataKind {
    /// Kinds covered by a category. History lives outside the engine.
    pub fn for_category(category: DataCategory) -> &'static [WebsiteDataKind] {
        match category {
            DataCategory::History => &[],
            DataCategory::Cache => &[WebsiteDataKind::DiskCache, WebsiteDataKind::MemoryCache],
            DataCategory::Cookies => &[WebsiteDataKind::Cookies],
            DataCategory::SiteData => &[
                WebsiteDataKind::LocalStorage,
                WebsiteDataKind::IndexedDb,
                WebsiteDataKind::ServiceWorkers,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_cover_disjoint_kinds() {
        let mut seen = std::collections::HashSet::new();
        for category in DataCategory::ALL {
            for kind in WebsiteDataKind::for_category(category) {
                assert!(seen.insert(*kind), "{kind:?} listed twice");
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&DataCategory::SiteData).unwrap();
        assert_eq!(json, "\"siteData\"");
    }
}
