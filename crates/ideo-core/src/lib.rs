pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod project;
pub mod runner;
pub mod session;
pub mod theme;
pub mod workbench;

// Re-export key types
pub use command::{build_command, BuildAction, CommandBuilder, Language, RunRequest, Toolchain};
pub use config::{PersistedState, Settings, StateStore};
pub use document::{Document, DocumentState};
pub use error::IdeError;
pub use runner::{CommandHistory, ProcessEvent, ShellProcess, StartOptions};
pub use session::{ActionOutcome, Prompt, PromptReason, PromptResponse, Session, UserAction};
pub use theme::Theme;
pub use workbench::Workbench;
