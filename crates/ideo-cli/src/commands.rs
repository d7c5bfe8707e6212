use ideo_core::{Theme, UserAction};
use std::path::PathBuf;

/// Result of processing a line typed into the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Route through the session's dispatch table.
    Action(UserAction),
    /// Display a message to the user.
    Message(String),
    /// Send the line to the terminal shell.
    Shell(String),
    /// Clear the terminal pane.
    ClearTerminal,
    /// Kill the terminal shell.
    KillTerminal,
    /// Start a fresh terminal shell.
    RestartTerminal,
    /// Show or hide the file tree.
    ToggleTree,
    /// Print the command history into the terminal pane.
    ShowHistory,
}

pub fn handle_command(input: &str) -> CommandResult {
    let trimmed = input.trim();
    if trimmed == "cls" || trimmed == "clear" {
        return CommandResult::ClearTerminal;
    }
    if !trimmed.starts_with('/') {
        return CommandResult::Shell(input.to_string());
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Action(UserAction::Quit),
        "/version" => CommandResult::Message(format!("IDEO v{}", env!("CARGO_PKG_VERSION"))),

        // File commands
        "/new" => CommandResult::Action(UserAction::New),
        "/open" | "/o" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /open <path>".into())
            } else {
                CommandResult::Action(UserAction::Open(expand_path(arg)))
            }
        }
        "/save" | "/w" => {
            if arg.is_empty() {
                CommandResult::Action(UserAction::Save)
            } else {
                CommandResult::Action(UserAction::SaveAs(expand_path(arg)))
            }
        }
        "/close" => {
            if arg.is_empty() {
                CommandResult::Action(UserAction::CloseActive)
            } else {
                match parse_tab_number(arg) {
                    Some(index) => CommandResult::Action(UserAction::Close(index)),
                    None => CommandResult::Message("Usage: /close [tab-number]".into()),
                }
            }
        }
        "/folder" | "/cd" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /folder <path>".into())
            } else {
                CommandResult::Action(UserAction::OpenFolder(expand_path(arg)))
            }
        }

        // Tab commands
        "/tab" => match parse_tab_number(arg) {
            Some(index) => CommandResult::Action(UserAction::SwitchTab(index)),
            None => CommandResult::Message("Usage: /tab <tab-number>".into()),
        },
        "/next" => CommandResult::Action(UserAction::NextTab),
        "/prev" => CommandResult::Action(UserAction::PreviousTab),

        // Build commands
        "/run" => CommandResult::Action(UserAction::Run),
        "/compile" => CommandResult::Action(UserAction::Compile),

        // Display commands
        "/theme" => {
            if arg.is_empty() {
                let themes: Vec<_> = Theme::all().iter().map(|t| t.name()).collect();
                CommandResult::Message(format!(
                    "Available themes: {}\nUsage: /theme <theme-name>",
                    themes.join(", ")
                ))
            } else {
                match arg.parse::<Theme>() {
                    Ok(theme) => CommandResult::Action(UserAction::SetTheme(theme)),
                    Err(e) => CommandResult::Message(e.to_string()),
                }
            }
        }
        "/tree" | "/files" => CommandResult::ToggleTree,

        // Terminal commands
        "/kill" => CommandResult::KillTerminal,
        "/restart" => CommandResult::RestartTerminal,
        "/history" => CommandResult::ShowHistory,

        _ => CommandResult::Message(format!(
            "Unknown command: {cmd}. Type /help for available commands."
        )),
    }
}

/// Tab numbers are shown 1-based; actions take 0-based indices.
fn parse_tab_number(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(arg: &str) -> PathBuf {
    if arg == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = arg.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(arg)
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        r#"IDEO Commands:

  Files
    /new                 New untitled tab (Ctrl+N)
    /open <path>         Open a file (Ctrl+O)
    /save [path]         Save, or save as (Ctrl+S)
    /close [n]           Close the active tab or tab n (Ctrl+W)
    /folder <path>       Show a folder in the file tree
    /tree                Show or hide the file tree

  Tabs
    /tab <n>             Switch to tab n
    /next, /prev         Cycle tabs (Alt+Right / Alt+Left)

  Build
    /compile             Compile the active file (Ctrl+K)
    /run                 Run the active file (F5)

  Terminal
    cls                  Clear the terminal pane
    /kill                Kill the shell
    /restart             Start a new shell
    /history             Show command history
    <anything else>      Sent to the shell

  Other
    /theme <name>        Dark or Light
    /version             Show version
    /quit                Exit (Ctrl+Q)"#
            .into(),
    )
}
