use std::path::PathBuf;

use super::manager::Session;
use super::prompt::Prompt;
use crate::command::BuildAction;
use crate::error::Result;
use crate::theme::Theme;

/// A user intent, independent of which key, button or command produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    New,
    Open(PathBuf),
    /// Open an entry picked in the file tree; directories are ignored.
    OpenFromTree(PathBuf),
    Save,
    SaveAs(PathBuf),
    Close(usize),
    CloseActive,
    SwitchTab(usize),
    NextTab,
    PreviousTab,
    /// New full contents of the active buffer.
    Edit(String),
    OpenFolder(PathBuf),
    Compile,
    Run,
    SetTheme(Theme),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    Opened(usize),
    Saved(PathBuf),
    /// A compile/run command line, ready to be written to the terminal shell.
    Command(String),
    /// Shutdown completed; the front end may exit.
    Quit,
}

impl Session {
    pub fn dispatch(
        &mut self,
        action: UserAction,
        prompt: &mut dyn Prompt,
    ) -> Result<ActionOutcome> {
        tracing::debug!("Dispatching {:?}", action);
        let outcome = match action {
            UserAction::New => ActionOutcome::Opened(self.open_new()),
            UserAction::Open(path) => ActionOutcome::Opened(self.open_path(path)?),
            UserAction::OpenFromTree(path) => {
                if path.is_file() {
                    ActionOutcome::Opened(self.open_path(path)?)
                } else {
                    ActionOutcome::Done
                }
            }
            UserAction::Save => ActionOutcome::Saved(self.save_active(prompt)?),
            UserAction::SaveAs(path) => ActionOutcome::Saved(self.save_active_as(path)?),
            UserAction::Close(index) => {
                self.close(index, prompt)?;
                ActionOutcome::Done
            }
            UserAction::CloseActive => {
                self.close_active(prompt)?;
                ActionOutcome::Done
            }
            UserAction::SwitchTab(index) => {
                self.set_active(index)?;
                ActionOutcome::Done
            }
            UserAction::NextTab => {
                self.next_tab();
                ActionOutcome::Done
            }
            UserAction::PreviousTab => {
                self.previous_tab();
                ActionOutcome::Done
            }
            UserAction::Edit(text) => {
                self.edit_active(text)?;
                ActionOutcome::Done
            }
            UserAction::OpenFolder(path) => {
                self.open_folder(path, prompt)?;
                ActionOutcome::Done
            }
            UserAction::Compile => {
                ActionOutcome::Command(self.command_for_active(BuildAction::Compile)?)
            }
            UserAction::Run => ActionOutcome::Command(self.command_for_active(BuildAction::Run)?),
            UserAction::SetTheme(theme) => {
                self.set_theme(theme);
                ActionOutcome::Done
            }
            UserAction::Quit => {
                self.shutdown(prompt)?;
                ActionOutcome::Quit
            }
        };
        Ok(outcome)
    }
}
