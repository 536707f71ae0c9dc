use crate::canvas::{Breakpoints, Snapshot, SnapshotStorage};
use crate::cards::CardContext;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Path of an image shown next to the title.
    #[serde(default)]
    pub logo: Option<String>,
    /// Layout used on first start and by "Reset".
    #[serde(default)]
    pub start_config: Snapshot,
    /// Height of one grid row in points.
    #[serde(default = "default_row_height")]
    pub grid_row_height: f32,
    #[serde(default)]
    pub breakpoints: Breakpoints,
    /// File holding the saved layout. If `None`, a platform default is used.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// Directory exports are written to. Defaults to the working directory.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Enable toast notifications in the UI.
    #[serde(default = "default_toasts")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
    /// Handed to every card through its context.
    #[serde(default)]
    pub username: Option<String>,
}

fn default_title() -> String {
    "Card Canvas".into()
}

fn default_row_height() -> f32 {
    50.0
}

fn default_toasts() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: None,
            logo: None,
            start_config: Snapshot::default(),
            grid_row_height: default_row_height(),
            breakpoints: Breakpoints::default(),
            storage_path: None,
            export_dir: None,
            debug_logging: false,
            log_file: None,
            enable_toasts: true,
            toast_duration: default_toast_duration(),
            username: None,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Where the saved layout lives. Falls back to memory when the platform
    /// has no local data directory.
    pub fn storage(&self) -> SnapshotStorage {
        match self.storage_path.clone().or_else(SnapshotStorage::default_path) {
            Some(path) => SnapshotStorage::File(path),
            None => {
                tracing::warn!("no local data directory; layouts will not survive a restart");
                SnapshotStorage::Memory
            }
        }
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn context(&self) -> CardContext {
        match &self.username {
            Some(name) => CardContext::for_user(name.clone()),
            None => CardContext::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CardEntry, LayoutItem};

    #[test]
    fn missing_or_empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Settings::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(missing, Settings::default());

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "").unwrap();
        assert_eq!(Settings::load(&empty).unwrap(), Settings::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"title": "Ops", "username": "sam"}"#).unwrap();
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.title, "Ops");
        assert_eq!(s.grid_row_height, 50.0);
        assert_eq!(s.breakpoints.cols("lg"), 18);
        assert_eq!(s.context().username.as_deref(), Some("sam"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.start_config.card_config.insert("a", CardEntry::new("Clock"));
        s.start_config
            .card_layouts
            .insert("lg", vec![LayoutItem::new("a", 0, 0, 6, 2)]);
        s.storage_path = Some(dir.path().join("store.json"));
        s.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, s);
        assert_eq!(loaded.storage(), SnapshotStorage::file(dir.path().join("store.json")));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
