use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::Toolchain;
use crate::document::write_atomic;
use crate::error::{IdeError, Result};

mod store;

pub use store::{FileBackend, MemoryBackend, StateBackend, StateStore};

pub const DEFAULT_THEME: &str = "Light";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub session: PersistedState,
    #[serde(default)]
    pub terminal: TerminalSettings,
    #[serde(default)]
    pub toolchain: Toolchain,
    #[serde(default)]
    pub theme: ThemeSettings,
}

/// What the last run left open, restored on the next launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_dir: Option<PathBuf>,
    pub last_theme: String,
    pub last_files: Vec<PathBuf>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            last_file: None,
            last_dir: None,
            last_theme: DEFAULT_THEME.to_string(),
            last_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Program started for the terminal pane.
    pub shell: String,
    /// Kill the shell after this many seconds. Unset means no limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl TerminalSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            shell: default_shell().to_string(),
            timeout_secs: None,
        }
    }
}

pub fn default_shell() -> &'static str {
    if cfg!(windows) {
        "cmd.exe"
    } else {
        "/bin/sh"
    }
}

/// Optional stylesheet files for the two built-in themes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_stylesheet: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_stylesheet: Option<PathBuf>,
}

impl Settings {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ideo")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`. A missing file yields defaults; an
    /// unreadable or malformed one is logged and also yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring settings: {}", e);
                Self::default()
            }
        }
    }

    /// Like [`Settings::load_from`], but reports unreadable or malformed
    /// files instead of substituting defaults. `Ok(None)` means no file.
    pub fn try_load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| IdeError::io(path, e))?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| IdeError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IdeError::io(parent, e))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| IdeError::Config(e.to_string()))?;
        write_atomic(path, &content)
    }
}
