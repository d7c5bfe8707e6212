use std::path::{Path, PathBuf};

use super::prompt::{Prompt, PromptReason, PromptResponse};
use crate::command::{BuildAction, CommandBuilder};
use crate::config::StateStore;
use crate::document::Document;
use crate::error::{IdeError, Result};
use crate::theme::{self, Theme};

const APP_TITLE: &str = "IDEO";

/// The ordered set of open tabs, which one is active, and the last-session
/// bookkeeping that goes with them.
///
/// `active` is `None` exactly when `documents` is empty.
pub struct Session {
    documents: Vec<Document>,
    active: Option<usize>,
    folder: Option<PathBuf>,
    theme: Theme,
    store: StateStore,
    builder: CommandBuilder,
}

impl Session {
    pub fn new(store: StateStore) -> Self {
        let settings = store.settings();
        let theme = settings
            .session
            .last_theme
            .parse()
            .unwrap_or_else(|e| {
                tracing::warn!("{}; falling back to {}", e, Theme::default());
                Theme::default()
            });
        let builder = CommandBuilder::new(settings.toolchain.clone());

        Self {
            documents: Vec::new(),
            active: None,
            folder: None,
            theme,
            store,
            builder,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.and_then(|i| self.documents.get(i))
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    /// Active file's path, or the application name.
    pub fn window_title(&self) -> String {
        self.active()
            .and_then(|doc| doc.path())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| APP_TITLE.to_string())
    }

    /// Paths of every open document that has one, in tab order.
    pub fn open_files(&self) -> Vec<PathBuf> {
        self.documents
            .iter()
            .filter_map(|doc| doc.path().map(Path::to_path_buf))
            .collect()
    }

    pub fn open_new(&mut self) -> usize {
        self.push(Document::new_untitled())
    }

    /// Open `path` in a new tab and make it active. A path that is already
    /// open is focused instead of opened twice.
    pub fn open_path(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let index = self.open_without_recording(path)?;
        self.store.set_last_file(path);
        Ok(index)
    }

    fn open_without_recording(&mut self, path: &Path) -> Result<usize> {
        if let Some(index) = self.position_of(path) {
            self.active = Some(index);
            return Ok(index);
        }
        let doc = Document::load(path)?;
        Ok(self.push(doc))
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        self.documents.iter().position(|doc| doc.path() == Some(path))
    }

    fn check_not_open_elsewhere(&self, index: usize, path: &Path) -> Result<()> {
        match self.position_of(path) {
            Some(other) if other != index => Err(IdeError::AlreadyOpen(path.to_path_buf())),
            _ => Ok(()),
        }
    }

    fn push(&mut self, doc: Document) -> usize {
        self.documents.push(doc);
        let index = self.documents.len() - 1;
        self.active = Some(index);
        index
    }

    /// Pure selection change; never prompts.
    pub fn set_active(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.active = Some(index);
        Ok(())
    }

    pub fn next_tab(&mut self) {
        if let Some(active) = self.active {
            self.active = Some((active + 1) % self.documents.len());
        }
    }

    pub fn previous_tab(&mut self) {
        if let Some(active) = self.active {
            let len = self.documents.len();
            self.active = Some((active + len - 1) % len);
        }
    }

    /// Replace the active buffer's contents.
    pub fn edit_active(&mut self, text: impl Into<String>) -> Result<()> {
        let index = self.active.ok_or(IdeError::NoActiveDocument)?;
        self.documents[index].set_text(text);
        Ok(())
    }

    /// Close the tab at `index`, asking first if it has unsaved changes.
    ///
    /// On `Cancel` (or a failed save) nothing changes and the error is
    /// returned. When the active tab is closed its predecessor becomes
    /// active.
    pub fn close(&mut self, index: usize, prompt: &mut dyn Prompt) -> Result<()> {
        self.check_index(index)?;
        self.resolve_unsaved(index, PromptReason::CloseTab, prompt)?;

        let doc = self.documents.remove(index);
        tracing::info!("Closed {}", doc.title());

        self.active = match self.active {
            _ if self.documents.is_empty() => None,
            Some(a) if a == index => Some(index.saturating_sub(1)),
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        Ok(())
    }

    pub fn close_active(&mut self, prompt: &mut dyn Prompt) -> Result<()> {
        let index = self.active.ok_or(IdeError::NoActiveDocument)?;
        self.close(index, prompt)
    }

    /// Save the active document. Untitled documents ask the prompt for a
    /// path; declining cancels the save.
    pub fn save_active(&mut self, prompt: &mut dyn Prompt) -> Result<PathBuf> {
        let index = self.active.ok_or(IdeError::NoActiveDocument)?;
        self.save_at(index, prompt)
    }

    /// Save the active document under `path`. Fails with `AlreadyOpen` when
    /// another tab already holds that file.
    pub fn save_active_as(&mut self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let index = self.active.ok_or(IdeError::NoActiveDocument)?;
        let path = path.as_ref();
        self.check_not_open_elsewhere(index, path)?;
        let saved = self.documents[index].save(Some(path))?;
        self.store.set_last_file(&saved);
        Ok(saved)
    }

    fn save_at(&mut self, index: usize, prompt: &mut dyn Prompt) -> Result<PathBuf> {
        let target = if self.documents[index].is_untitled() {
            let path = prompt
                .choose_save_path(&self.documents[index])
                .ok_or(IdeError::Cancelled)?;
            self.check_not_open_elsewhere(index, &path)?;
            Some(path)
        } else {
            None
        };
        let saved = self.documents[index].save(target.as_deref())?;
        self.store.set_last_file(&saved);
        Ok(saved)
    }

    /// Ask about unsaved changes in the document at `index`. `Ok` means the
    /// caller may proceed.
    fn resolve_unsaved(
        &mut self,
        index: usize,
        reason: PromptReason,
        prompt: &mut dyn Prompt,
    ) -> Result<()> {
        if !self.documents[index].is_dirty() {
            return Ok(());
        }
        match prompt.confirm_unsaved(&self.documents[index], reason) {
            PromptResponse::Save => self.save_at(index, prompt).map(|_| ()),
            PromptResponse::Discard => Ok(()),
            PromptResponse::Cancel => Err(IdeError::Cancelled),
        }
    }

    /// Point the file tree at `path`. Only the active document is checked for
    /// unsaved changes, since switching folders closes no tabs.
    pub fn open_folder(&mut self, path: impl AsRef<Path>, prompt: &mut dyn Prompt) -> Result<()> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(IdeError::NotADirectory(path.to_path_buf()));
        }
        if let Some(index) = self.active {
            self.resolve_unsaved(index, PromptReason::OpenFolder, prompt)?;
        }
        tracing::info!("Opened folder {}", path.display());
        self.folder = Some(path.to_path_buf());
        self.store.set_last_dir(path);
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.store.set_last_theme(theme.name());
    }

    /// Text of the configured stylesheet for the current theme, if one is set.
    pub fn stylesheet(&self) -> Result<Option<String>> {
        match self.theme.stylesheet(&self.store.settings().theme) {
            Some(path) => theme::load_theme(path).map(Some),
            None => Ok(None),
        }
    }

    /// Reopen what the previous run left open. Files that can no longer be
    /// read are skipped. Returns how many tabs were reopened.
    pub fn restore(&mut self) -> usize {
        let state = self.store.state().clone();

        if let Some(dir) = state.last_dir.filter(|d| d.is_dir()) {
            self.folder = Some(dir);
        }

        let mut reopened = 0;
        for path in &state.last_files {
            match self.open_without_recording(path) {
                Ok(_) => reopened += 1,
                Err(e) => tracing::warn!("Not restoring {}: {}", path.display(), e),
            }
        }
        reopened
    }

    /// Prepare to exit: ask about every dirty document, then record the open
    /// files and flush settings. `Cancel` on any prompt aborts the exit.
    pub fn shutdown(&mut self, prompt: &mut dyn Prompt) -> Result<()> {
        for index in 0..self.documents.len() {
            self.resolve_unsaved(index, PromptReason::Quit, prompt)?;
        }

        self.store.set_last_files(self.open_files());
        if let Err(e) = self.store.flush() {
            tracing::warn!("Failed to flush settings on exit: {}", e);
        }
        Ok(())
    }

    /// Compile or run command for the active document. The document must be
    /// saved and clean; otherwise nothing is built.
    pub fn command_for_active(&self, action: BuildAction) -> Result<String> {
        let doc = self.active().ok_or(IdeError::NoActiveDocument)?;
        let path = match doc.path() {
            Some(path) if !doc.is_dirty() => path,
            _ => return Err(IdeError::NotSaved),
        };
        self.builder.build(action, path)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.documents.len() {
            Ok(())
        } else {
            Err(IdeError::InvalidIndex(index))
        }
    }
}
