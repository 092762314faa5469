//! Archive file at a fixed path
//!
//! The file is exclusive to the tab manager. Writes overwrite the whole
//! archive through a temporary file and rename, so a crash mid-write leaves
//! the previous archive intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::archive::{PrivateTabPolicy, SavedTab, TabArchive};
use crate::Result;

#[derive(Debug, Clone)]
pub struct ArchiveStore {
    path: PathBuf,
}

impl ArchiveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the archive. A missing file is `Ok(None)`, not an error.
    pub fn read(&self) -> Result<Option<TabArchive>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        TabArchive::decode(&bytes).map(Some)
    }

    pub fn write(&self, tabs: &[SavedTab], policy: PrivateTabPolicy) -> Result<()> {
        let bytes = TabArchive::encode(tabs, policy)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Wrote tab archive");

        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;

    fn record(title: &str, is_selected: bool) -> SavedTab {
        SavedTab {
            is_selected,
            title: Some(title.to_string()),
            is_private: false,
            session_data: None,
            screenshot_uuid: None,
        }
    }

    #[test]
    fn test_absent_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("tabs.archive"));

        assert!(store.read().unwrap().is_none());
        store.remove().unwrap();
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("state").join("tabs.archive"));

        store
            .write(&[record("one", true), record("two", false)], PrivateTabPolicy::Exclude)
            .unwrap();
        store
            .write(&[record("three", false)], PrivateTabPolicy::Exclude)
            .unwrap();

        let archive = store.read().unwrap().unwrap();
        assert_eq!(archive.tabs, vec![record("three", false)]);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_corrupt_file_surfaces_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabs.archive");
        fs::write(&path, b"{ truncated").unwrap();

        let err = ArchiveStore::new(&path).read().unwrap_err();
        assert!(matches!(err, ArchiveError::Json(_)));
    }
}
