// Library interface for ideo-cli
// Lets integration tests reach the modules that don't need a terminal.

// These files are also declared in main.rs, so the path attribute keeps
// them from being compiled twice under different module trees.

#[path = "commands.rs"]
pub mod commands;

#[path = "pane.rs"]
pub mod pane;

#[path = "theme.rs"]
pub mod theme;

pub use commands::{expand_path, handle_command, CommandResult};
pub use pane::TerminalPane;
pub use theme::Palette;
