use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// UI color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

/// Grid layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Grid,
    Masonry,
}

/// Persisted user configuration.
///
/// Stored as a single JSON blob in the platform config directory. Every field
/// has a default so a stored blob from an older version merges shallowly over
/// the defaults; unknown or unreadable blobs fall back to defaults silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub layout_mode: LayoutMode,
    /// Grid zoom level, 1 (smallest thumbnails) to 5 (largest)
    pub grid_zoom: u8,
    pub sidebar_visible: bool,
    pub accent_color: String,
    pub palette: String,
    /// Folders never shown in the sidebar
    pub hidden_folders: Vec<String>,
    /// Folders listed before all others
    pub pinned_folders: Vec<String>,
    /// Sidebar folder list length cap
    pub max_visible_folders: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            layout_mode: LayoutMode::Grid,
            grid_zoom: 3,
            sidebar_visible: true,
            accent_color: "#0071e3".to_string(),
            palette: "default".to_string(),
            hidden_folders: Vec::new(),
            pinned_folders: Vec::new(),
            max_visible_folders: 10,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults on
    /// any read or parse failure.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path. Missing file, unreadable file, and invalid
    /// JSON all yield defaults; there is no partial failure.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        let mut settings: Settings = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("ignoring unreadable settings file: {}", e);
                return Self::default();
            }
        };
        settings.clamp();
        settings
    }

    /// Persist to the default location. Called on every settings change.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().ok_or_else(|| {
            crate::error::Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where the settings blob lives:
    /// - Linux: ~/.config/photo-library/settings.json
    /// - macOS: ~/Library/Application Support/photo-library/settings.json
    /// - Windows: %APPDATA%\photo-library\settings.json
    pub fn settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("photo-library");
        path.push("settings.json");
        Some(path)
    }

    /// Pull stored values back into range. Old or hand-edited blobs may carry
    /// anything.
    fn clamp(&mut self) {
        self.grid_zoom = self.grid_zoom.clamp(1, 5);
    }
}
