use tokio::sync::mpsc;

use crate::error::{IdeError, Result};
use crate::runner::{ProcessEvent, ShellProcess, StartOptions};
use crate::session::{ActionOutcome, Prompt, Session, UserAction};

/// Joins the session with the terminal pane's shell: user actions go through
/// the session's dispatch table, and compile/run commands are written into
/// the shell.
pub struct Workbench {
    session: Session,
    terminal: Option<ShellProcess>,
    shell_override: Option<String>,
}

impl Workbench {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            terminal: None,
            shell_override: None,
        }
    }

    /// Use `shell` for the terminal pane instead of the configured one.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell_override = Some(shell.into());
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn terminal(&self) -> Option<&ShellProcess> {
        self.terminal.as_ref()
    }

    pub fn terminal_running(&self) -> bool {
        self.terminal.as_ref().is_some_and(ShellProcess::is_running)
    }

    /// Start (or restart) the shell configured in `[terminal]`, in the open
    /// folder if there is one. A failure leaves the rest of the workbench
    /// usable.
    pub fn start_terminal(&mut self, events: mpsc::UnboundedSender<ProcessEvent>) -> Result<()> {
        let terminal = &self.session.store().settings().terminal;
        let shell = self
            .shell_override
            .clone()
            .unwrap_or_else(|| terminal.shell.clone());
        let mut options = StartOptions::new(shell).timeout(terminal.timeout());
        if let Some(folder) = self.session.folder() {
            options = options.cwd(folder);
        }

        match ShellProcess::start(options, events) {
            Ok(process) => {
                self.terminal = Some(process);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Terminal unavailable: {}", e);
                self.terminal = None;
                Err(e)
            }
        }
    }

    pub async fn send_to_terminal(&self, line: &str) -> Result<()> {
        match &self.terminal {
            Some(process) => process.send_line(line).await,
            None => Err(IdeError::ProcessNotRunning),
        }
    }

    pub fn kill_terminal(&mut self) -> Result<()> {
        match self.terminal.as_mut() {
            Some(process) => process.kill(),
            None => Err(IdeError::ProcessNotRunning),
        }
    }

    /// Dispatch `action`; built commands are forwarded to the shell before
    /// the outcome is returned.
    pub async fn dispatch(
        &mut self,
        action: UserAction,
        prompt: &mut dyn Prompt,
    ) -> Result<ActionOutcome> {
        let outcome = self.session.dispatch(action, prompt)?;
        if let ActionOutcome::Command(command) = &outcome {
            self.send_to_terminal(command).await?;
        }
        Ok(outcome)
    }
}
