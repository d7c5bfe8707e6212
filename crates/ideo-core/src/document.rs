use std::fs;
use std::path::{Path, PathBuf};

use crate::command::Language;
use crate::error::{IdeError, Result};

const UNTITLED: &str = "Untitled";

/// Lifecycle of a single tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    UnsavedEmpty,
    UnsavedDirty,
    SavedClean,
    SavedDirty,
}

/// One open file, or a new buffer that has never been written.
#[derive(Debug, Clone, Default)]
pub struct Document {
    path: Option<PathBuf>,
    buffer: String,
    on_disk_snapshot: Option<String>,
}

impl Document {
    pub fn new_untitled() -> Self {
        Self::default()
    }

    /// Read `path` into a new document. Invalid UTF-8 is replaced rather than rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| IdeError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        tracing::info!("Opened {}", path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            on_disk_snapshot: Some(text.clone()),
            buffer: text,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replace the buffer contents, as typing in the editor widget does.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        match self.path {
            None => !self.buffer.is_empty(),
            Some(_) => self.on_disk_snapshot.as_deref() != Some(self.buffer.as_str()),
        }
    }

    pub fn state(&self) -> DocumentState {
        match (self.path.is_some(), self.is_dirty()) {
            (false, false) => DocumentState::UnsavedEmpty,
            (false, true) => DocumentState::UnsavedDirty,
            (true, false) => DocumentState::SavedClean,
            (true, true) => DocumentState::SavedDirty,
        }
    }

    /// Tab label: the file name, or `Untitled` for new buffers.
    pub fn title(&self) -> String {
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    pub fn language(&self) -> Option<Language> {
        self.path.as_deref().and_then(Language::from_path)
    }

    /// Write the whole buffer to disk.
    ///
    /// `target` overrides the document's own path; an untitled document
    /// without a target fails with [`IdeError::MissingPath`]. The write goes
    /// through a temporary file in the same directory followed by a rename,
    /// so a failed save never leaves a truncated file behind. On success the
    /// path is recorded and the snapshot refreshed.
    pub fn save(&mut self, target: Option<&Path>) -> Result<PathBuf> {
        let path = match target.or(self.path.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => return Err(IdeError::MissingPath),
        };

        write_atomic(&path, &self.buffer)?;

        tracing::info!("Saved {}", path.display());
        self.path = Some(path.clone());
        self.on_disk_snapshot = Some(self.buffer.clone());
        Ok(path)
    }
}

/// Replace `path` with `contents` via a temporary file and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| IdeError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    let tmp_path = path.with_file_name(format!(".{}.ideo-tmp", file_name.to_string_lossy()));

    fs::write(&tmp_path, contents).map_err(|e| IdeError::io(&tmp_path, e))?;

    if let Ok(meta) = fs::metadata(path) {
        // Keep the mode of the file being replaced (e.g. executable scripts).
        let _ = fs::set_permissions(&tmp_path, meta.permissions());
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        IdeError::io(path, e)
    })
}
