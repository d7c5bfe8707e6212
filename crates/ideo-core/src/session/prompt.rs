use std::collections::VecDeque;
use std::path::PathBuf;

use crate::document::Document;

/// Answer to "save changes before continuing?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Save,
    Discard,
    Cancel,
}

/// What the user was doing when the unsaved-changes question came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReason {
    CloseTab,
    OpenFolder,
    Quit,
}

impl PromptReason {
    pub fn question(&self) -> &'static str {
        match self {
            PromptReason::CloseTab => "Do you want to save changes to this file before closing?",
            PromptReason::OpenFolder => {
                "Do you want to save changes to the current file before opening a new folder?"
            }
            PromptReason::Quit => {
                "Do you want to save changes to this file before closing the application?"
            }
        }
    }
}

/// The modal questions the session asks the front end.
pub trait Prompt {
    fn confirm_unsaved(&mut self, document: &Document, reason: PromptReason) -> PromptResponse;

    /// Ask where to save an untitled document. `None` aborts the save.
    fn choose_save_path(&mut self, document: &Document) -> Option<PathBuf>;
}

/// Prompt that replays canned answers. Used by tests and by non-interactive
/// callers; once the script runs out it answers `Cancel` and no path.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    responses: VecDeque<PromptResponse>,
    save_paths: VecDeque<PathBuf>,
    asked: Vec<(String, PromptReason)>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, response: PromptResponse) -> Self {
        self.responses.push_back(response);
        self
    }

    pub fn save_as(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_paths.push_back(path.into());
        self
    }

    /// Titles of the documents that were asked about, in order.
    pub fn asked(&self) -> &[(String, PromptReason)] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm_unsaved(&mut self, document: &Document, reason: PromptReason) -> PromptResponse {
        self.asked.push((document.title(), reason));
        self.responses.pop_front().unwrap_or(PromptResponse::Cancel)
    }

    fn choose_save_path(&mut self, _document: &Document) -> Option<PathBuf> {
        self.save_paths.pop_front()
    }
}
