//! Preference store
//!
//! A plain get/set key-value surface over the `settings` table. The tab
//! manager reads it, the settings UI writes it.

use crate::database::Database;
use crate::Result;

/// Whether new web views block script-opened windows. Defaults to true.
pub const PREF_BLOCK_POPUPS: &str = "blockPopups";

/// Whether private tabs are closed when leaving private mode. Defaults to false.
pub const PREF_CLOSE_PRIVATE_TABS: &str = "settings.closePrivateTabs";

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Reads a boolean preference. Unparseable values read as unset.
    fn bool_for_key(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get(key)?.and_then(|value| value.parse().ok()))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, if value { "true" } else { "false" })
    }
}

impl PreferenceStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_setting(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_setting(key, value)
    }
}
