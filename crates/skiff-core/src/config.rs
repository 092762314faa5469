//! Browser configuration

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

use skiff_tabs::{TabManagerConfig, DEFAULT_MAX_LIVE_WEB_VIEWS};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Path to the saved tab archive
    pub archive_path: PathBuf,
    /// Page opened by new tabs
    pub new_tab_url: String,
    /// Live web view budget
    pub max_live_web_views: usize,
    /// Keep private tabs in the archive across launches
    pub persist_private_tabs: bool,
    pub user_agent: Option<String>,
    /// Buffered events per `EventBus` subscriber
    pub event_capacity: usize,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("skiff.db"),
            archive_path: data_dir.join("tabs.archive"),
            new_tab_url: "about:home".to_string(),
            max_live_web_views: DEFAULT_MAX_LIVE_WEB_VIEWS,
            persist_private_tabs: false,
            user_agent: None,
            event_capacity: 64,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Skiff"))
            .unwrap_or_else(|| PathBuf::from(".skiff"))
    }

    /// Read a JSON config file. Missing keys take their defaults and a
    /// missing file yields `Config::default()`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = serde_json::from_str(&text)?;
                tracing::debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn tab_manager_config(&self) -> Result<TabManagerConfig> {
        let new_tab_url = Url::parse(&self.new_tab_url).map_err(|source| CoreError::InvalidUrl {
            input: self.new_tab_url.clone(),
            source,
        })?;
        if self.max_live_web_views == 0 {
            return Err(CoreError::Config(
                "maxLiveWebViews must be at least 1".to_string(),
            ));
        }

        let mut config = TabManagerConfig::new(new_tab_url);
        config.max_live_web_views = self.max_live_web_views;
        config.persist_private_tabs = self.persist_private_tabs;
        config.user_agent = self.user_agent.clone();
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_share_data_dir() {
        let data_dir = Config::data_dir();
        assert!(data_dir.ends_with("Skiff") || data_dir == Path::new(".skiff"));

        let config = Config::default();
        assert_eq!(config.database_path, data_dir.join("skiff.db"));
        assert_eq!(config.archive_path, data_dir.join("tabs.archive"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("missing.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "maxLiveWebViews": 2, "persistPrivateTabs": true }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_live_web_views, 2);
        assert!(config.persist_private_tabs);
        assert_eq!(config.new_tab_url, "about:home");

        let tabs = config.tab_manager_config().unwrap();
        assert_eq!(tabs.max_live_web_views, 2);
        assert!(tabs.persist_private_tabs);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(Config::load(&path), Err(CoreError::Serialization(_))));
    }

    #[test]
    fn test_invalid_tab_settings() {
        let mut config = Config::new(PathBuf::from("/tmp/skiff"));
        config.new_tab_url = "not a url".to_string();
        assert!(matches!(
            config.tab_manager_config(),
            Err(CoreError::InvalidUrl { .. })
        ));

        config.new_tab_url = "about:blank".to_string();
        config.max_live_web_views = 0;
        assert!(matches!(config.tab_manager_config(), Err(CoreError::Config(_))));
    }
}
