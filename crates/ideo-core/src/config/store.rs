use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{PersistedState, Settings};
use crate::error::{IdeError, Result};

/// Where settings are read from and written to.
pub trait StateBackend: Send {
    fn load(&self) -> Settings;
    fn store(&self, settings: &Settings) -> Result<()>;
}

/// TOML file on disk, normally `<config_dir>/ideo/settings.toml`.
///
/// A file that exists but cannot be parsed is never overwritten: the first
/// write after such a load moves it to `settings.toml.bak` so the user can
/// recover their edits.
pub struct FileBackend {
    path: PathBuf,
    keep_existing: AtomicBool,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep_existing: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a malformed settings file is moved before it is replaced.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }
}

impl Default for FileBackend {
    fn default() -> Self {
        Self::new(Settings::config_path())
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Settings {
        match Settings::try_load_from(&self.path) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring settings: {}", e);
                self.keep_existing.store(true, Ordering::SeqCst);
                Settings::default()
            }
        }
    }

    fn store(&self, settings: &Settings) -> Result<()> {
        if self.keep_existing.load(Ordering::SeqCst) && self.path.exists() {
            let backup = self.backup_path();
            std::fs::rename(&self.path, &backup).map_err(|e| IdeError::io(&self.path, e))?;
            tracing::warn!(
                "Moved unreadable settings {} to {}",
                self.path.display(),
                backup.display()
            );
        }
        self.keep_existing.store(false, Ordering::SeqCst);
        settings.save_to(&self.path)
    }
}

/// In-memory backend. Clones share the same slot, so a test can keep one
/// handle and inspect what the store wrote through another.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Default)]
struct MemorySlot {
    settings: Settings,
    writes: usize,
}

impl MemoryBackend {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemorySlot {
                settings,
                writes: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.slot().settings.clone()
    }

    pub fn write_count(&self) -> usize {
        self.slot().writes
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Settings {
        self.snapshot()
    }

    fn store(&self, settings: &Settings) -> Result<()> {
        let mut slot = self.slot();
        slot.settings = settings.clone();
        slot.writes += 1;
        Ok(())
    }
}

/// Process-wide settings service: loaded once, written through after every
/// mutation, flushed explicitly at shutdown.
pub struct StateStore {
    settings: Settings,
    backend: Box<dyn StateBackend>,
}

impl StateStore {
    pub fn open(backend: impl StateBackend + 'static) -> Self {
        let settings = backend.load();
        Self {
            settings,
            backend: Box::new(backend),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &PersistedState {
        &self.settings.session
    }

    pub fn set_last_file(&mut self, path: &Path) {
        self.settings.session.last_file = Some(path.to_path_buf());
        self.write_through();
    }

    pub fn set_last_dir(&mut self, path: &Path) {
        self.settings.session.last_dir = Some(path.to_path_buf());
        self.write_through();
    }

    pub fn set_last_theme(&mut self, theme: &str) {
        self.settings.session.last_theme = theme.to_string();
        self.write_through();
    }

    pub fn set_last_files(&mut self, files: Vec<PathBuf>) {
        self.settings.session.last_files = files;
        self.write_through();
    }

    /// Write the current settings and report failure to the caller.
    pub fn flush(&self) -> Result<()> {
        self.backend.store(&self.settings)
    }

    // A failed settings write must not fail the user action that caused it.
    fn write_through(&self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to write settings: {}", e);
        }
    }
}
