// Application settings
// Loaded from ~/.config/labgrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid editing
    #[serde(rename = "grid.commitDebounceMs")]
    pub commit_debounce_ms: u64,

    // Barcode / rapid input
    #[serde(rename = "keys.recordingWindowMs")]
    pub key_recording_window_ms: u64,

    // Lookups
    #[serde(rename = "lookup.searchDebounceMs")]
    pub lookup_search_debounce_ms: u64,

    #[serde(rename = "lookup.pageSize")]
    pub lookup_page_size: usize,

    // Remote query API
    #[serde(rename = "server.baseUrl")]
    pub server_base_url: Option<String>,

    #[serde(rename = "server.containerPath")]
    pub server_container_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commit_debounce_ms: 250,
            key_recording_window_ms: 25,
            lookup_search_debounce_ms: 350,
            lookup_page_size: 100,
            server_base_url: None,
            server_container_path: "/".to_string(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("labgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default path, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines starting with `//`
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Save current settings to the default path
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    pub fn commit_debounce(&self) -> Duration {
        Duration::from_millis(self.commit_debounce_ms)
    }

    pub fn key_recording_window(&self) -> Duration {
        Duration::from_millis(self.key_recording_window_ms)
    }

    pub fn lookup_search_debounce(&self) -> Duration {
        Duration::from_millis(self.lookup_search_debounce_ms)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Delay before typed text is committed to the cell
    "grid.commitDebounceMs": 250,

    // Keystrokes closer together than this are treated as scanner input
    "keys.recordingWindowMs": 25,

    // Lookup search
    "lookup.searchDebounceMs": 350,
    "lookup.pageSize": 100,

    // Remote query API (API key is stored in credentials.json, not here)
    "server.baseUrl": null,
    "server.containerPath": "/"
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }
}
