//! Session snapshot: the durable navigation history of one tab

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ArchiveError;
use crate::Result;

/// Navigation history sufficient to rehydrate a tab.
///
/// `urls` holds the back list, the current entry and the forward list in
/// navigation order. `current_page` is the offset of the current entry from
/// the newest one, so it always lies in `[-(urls.len() - 1), 0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_page: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_title: Option<String>,
    #[serde(rename = "history")]
    pub urls: Vec<Url>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_used_time: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(
        urls: Vec<Url>,
        current_page: i32,
        current_title: Option<String>,
        last_used_time: DateTime<Utc>,
    ) -> Result<Self> {
        let snapshot = Self {
            current_page,
            current_title,
            urls,
            last_used_time,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Assemble a snapshot from a back-forward list. Always valid.
    pub fn from_history(
        back: &[Url],
        current: Url,
        forward: &[Url],
        current_title: Option<String>,
    ) -> Self {
        let mut urls = Vec::with_capacity(back.len() + 1 + forward.len());
        urls.extend_from_slice(back);
        urls.push(current);
        urls.extend_from_slice(forward);

        Self {
            current_page: -(forward.len() as i32),
            current_title,
            urls,
            last_used_time: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(ArchiveError::InvalidSnapshot(
                "history cannot be empty".to_string(),
            ));
        }

        let oldest = -(self.urls.len() as i64 - 1);
        let page = i64::from(self.current_page);
        if page > 0 || page < oldest {
            return Err(ArchiveError::InvalidSnapshot(format!(
                "current page {} outside [{}, 0]",
                self.current_page, oldest
            )));
        }

        Ok(())
    }

    /// Index of the current entry in `urls`
    pub fn current_index(&self) -> usize {
        let newest = self.urls.len().saturating_sub(1);
        newest.saturating_sub(self.current_page.unsigned_abs() as usize)
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.urls.get(self.current_index())
    }

    pub fn back_count(&self) -> usize {
        self.current_index()
    }

    pub fn forward_count(&self) -> usize {
        self.current_page.unsigned_abs() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_from_history_offsets() {
        let snapshot = SessionSnapshot::from_history(
            &[url("https://a.test/"), url("https://b.test/")],
            url("https://c.test/"),
            &[url("https://d.test/")],
            Some("C".to_string()),
        );

        assert_eq!(snapshot.current_page, -1);
        assert_eq!(snapshot.current_index(), 2);
        assert_eq!(snapshot.current_url(), Some(&url("https://c.test/")));
        assert_eq!(snapshot.back_count(), 2);
        assert_eq!(snapshot.forward_count(), 1);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_invalid_snapshots_rejected() {
        let now = Utc::now();
        assert!(SessionSnapshot::new(Vec::new(), 0, None, now).is_err());
        assert!(SessionSnapshot::new(vec![url("https://a.test/")], 1, None, now).is_err());
        assert!(SessionSnapshot::new(vec![url("https://a.test/")], -1, None, now).is_err());
        assert!(
            SessionSnapshot::new(vec![url("https://a.test/"), url("https://b.test/")], -1, None, now)
                .is_ok()
        );
    }

    #[test]
    fn test_wire_keys_are_stable() {
        let snapshot = SessionSnapshot::from_history(&[], url("https://a.test/"), &[], None);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert!(value.get("currentPage").is_some());
        assert!(value.get("history").is_some());
        assert!(value.get("lastUsedTime").unwrap().is_i64());
        assert!(value.get("currentTitle").is_none());
    }
}
