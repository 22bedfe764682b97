use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::sdk::SdkLogLevel;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default)]
    pub sdk_log_level: SdkLogLevel,
    #[serde(default)]
    pub last_room_name: Option<String>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            sdk_log_level: SdkLogLevel::default(),
            last_room_name: None,
        }
    }
}

pub struct SettingsStore {
    settings: Mutex<Settings>,
    file_path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join("settings.json");
        let settings = Self::load(&file_path);
        Self {
            settings: Mutex::new(settings),
            file_path: Some(file_path),
        }
    }

    /// Settings that live only in memory.
    pub fn ephemeral(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            file_path: None,
        }
    }

    pub fn get(&self) -> Settings {
        self.settings.lock().expect("settings lock poisoned").clone()
    }

    pub fn set_backend_url(&self, url: String) {
        self.settings.lock().expect("settings lock poisoned").backend_url = url;
        self.save();
    }

    pub fn set_sdk_log_level(&self, level: SdkLogLevel) {
        self.settings.lock().expect("settings lock poisoned").sdk_log_level = level;
        self.save();
    }

    pub fn set_last_room_name(&self, name: Option<String>) {
        self.settings.lock().expect("settings lock poisoned").last_room_name = name;
        self.save();
    }

    fn save(&self) {
        let Some(path) = &self.file_path else { return };
        let settings = self.get();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&settings) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("failed to write settings: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to serialize settings: {e}"),
        }
    }

    fn load(path: &PathBuf) -> Settings {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring unreadable settings file: {e}");
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }
}
