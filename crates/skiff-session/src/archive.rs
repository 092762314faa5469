//! Saved tab archive codec
//!
//! Wire format (JSON, camelCase keys):
//! ```text
//! { "version": 1,
//!   "tabs": [ { "isSelected", "title", "isPrivate", "sessionData", "screenshotUUID" } ] }
//! ```
//! Keys are stable so older archives stay readable as fields are added.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ArchiveError;
use crate::snapshot::SessionSnapshot;
use crate::Result;

pub const ARCHIVE_VERSION: u32 = 1;

/// Whether private tabs may reach durable storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrivateTabPolicy {
    /// Private records are dropped at encode time
    #[default]
    Exclude,
    Persist,
}

/// Durable record of one tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTab {
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(
        default,
        deserialize_with = "lenient_snapshot",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_data: Option<SessionSnapshot>,
    #[serde(
        default,
        rename = "screenshotUUID",
        skip_serializing_if = "Option::is_none"
    )]
    pub screenshot_uuid: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabArchive {
    pub version: u32,
    pub tabs: Vec<SavedTab>,
}

#[derive(Serialize)]
struct ArchiveRef<'a> {
    version: u32,
    tabs: Vec<&'a SavedTab>,
}

#[derive(Deserialize)]
struct RawArchive {
    #[serde(default = "default_version")]
    version: u32,
    tabs: Vec<serde_json::Value>,
}

fn default_version() -> u32 {
    ARCHIVE_VERSION
}

/// A snapshot that fails to decode or validate is dropped rather than
/// taking the whole record down with it.
fn lenient_snapshot<'de, D>(deserializer: D) -> std::result::Result<Option<SessionSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(value) = value else {
        return Ok(None);
    };

    let snapshot = serde_json::from_value::<SessionSnapshot>(value)
        .map_err(ArchiveError::from)
        .and_then(|snapshot| snapshot.validate().map(|_| snapshot));

    match snapshot {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping unreadable session snapshot");
            Ok(None)
        }
    }
}

impl TabArchive {
    pub fn new(tabs: Vec<SavedTab>) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            tabs,
        }
    }

    /// Encode the given records. Under `PrivateTabPolicy::Exclude` no private
    /// record is ever written.
    pub fn encode(tabs: &[SavedTab], policy: PrivateTabPolicy) -> Result<Vec<u8>> {
        let archive = ArchiveRef {
            version: ARCHIVE_VERSION,
            tabs: tabs
                .iter()
                .filter(|tab| policy == PrivateTabPolicy::Persist || !tab.is_private)
                .collect(),
        };

        Ok(serde_json::to_vec(&archive)?)
    }

    /// Decode an archive, skipping records that cannot be read. At most one
    /// record comes back selected; later duplicates are cleared.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let raw: RawArchive = serde_json::from_slice(bytes)?;
        if raw.version > ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion(raw.version));
        }

        let mut tabs = Vec::with_capacity(raw.tabs.len());
        for (index, value) in raw.tabs.into_iter().enumerate() {
            match serde_json::from_value::<SavedTab>(value) {
                Ok(tab) => tabs.push(tab),
                Err(e) => tracing::warn!(index, error = %e, "Skipping unreadable saved tab"),
            }
        }

        let mut seen_selected = false;
        for tab in &mut tabs {
            if tab.is_selected {
                if seen_selected {
                    tab.is_selected = false;
                }
                seen_selected = true;
            }
        }

        Ok(Self {
            version: raw.version,
            tabs,
        })
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.is_selected)
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
