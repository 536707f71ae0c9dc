use super::snapshot::Snapshot;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub const STORE_FILE: &str = "main_store.json";

/// Where the saved snapshot lives between sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStorage {
    /// Kept for the lifetime of the process only.
    Memory,
    /// JSON file on the local disk.
    File(PathBuf),
}

impl Default for SnapshotStorage {
    fn default() -> Self {
        Self::Memory
    }
}

impl SnapshotStorage {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// `<local data dir>/card_canvas/main_store.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::data_local_dir().map(|dir| dir.join("card_canvas").join(STORE_FILE))
    }

    /// Read the stored snapshot. A missing or empty file means nothing was
    /// saved yet; any other read failure is an error.
    pub fn load(&self) -> anyhow::Result<Option<Snapshot>> {
        let Self::File(path) = self else {
            return Ok(None);
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        snapshot
            .card_layouts
            .check_bounds()
            .with_context(|| format!("{} has out-of-range placements", path.display()))?;
        Ok(Some(snapshot))
    }

    /// Persist `snapshot`. The file is written next to its destination and
    /// renamed into place so a failed write never truncates the old snapshot.
    pub fn store(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let Self::File(path) = self else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = snapshot.to_json_pretty()?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to finalize {}", path.display()))?;
        tracing::debug!(path = %path.display(), "snapshot stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::config::{CardConfig, CardEntry};
    use crate::canvas::layout::{CardLayouts, LayoutItem};

    fn sample() -> Snapshot {
        let mut cfg = CardConfig::new();
        cfg.insert("a", CardEntry::new("Clock"));
        let mut layouts = CardLayouts::new();
        layouts.insert("lg", vec![LayoutItem::new("a", 0, 0, 4, 2)]);
        Snapshot::new(cfg, layouts)
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SnapshotStorage::file(dir.path().join("nested").join(STORE_FILE));
        assert_eq!(storage.load().unwrap(), None);
        storage.store(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample()));
    }

    #[test]
    fn empty_file_means_nothing_saved() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let storage = SnapshotStorage::file(tmp.path());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "{not json").unwrap();
        assert!(SnapshotStorage::file(tmp.path()).load().is_err());
    }

    #[test]
    fn unreadable_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file cannot be read as text.
        assert!(SnapshotStorage::file(dir.path()).load().is_err());
    }

    #[test]
    fn memory_storage_is_inert() {
        let storage = SnapshotStorage::Memory;
        storage.store(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }
}
