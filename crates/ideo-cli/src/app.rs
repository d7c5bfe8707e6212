use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tui_textarea::TextArea;

use ideo_core::config::{FileBackend, Settings};
use ideo_core::project::{self, TreeEntry};
use ideo_core::runner::{run_once, ExitReason, ProcessEvent};
use ideo_core::{
    ActionOutcome, BuildAction, CommandBuilder, CommandHistory, Document, Prompt, PromptReason,
    PromptResponse, Session, StateStore, Theme, UserAction, Workbench,
};

use crate::commands::{expand_path, handle_command, CommandResult};
use crate::pane::TerminalPane;
use crate::theme::Palette;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Everything `main` decided before the UI starts.
pub struct LaunchOptions {
    pub settings_path: PathBuf,
    pub files: Vec<PathBuf>,
    pub theme: Option<Theme>,
    pub shell: Option<String>,
    pub restore: bool,
}

/// Build `file` with the configured toolchain, run the command once and
/// print its output. Returns the process exit code.
pub async fn run_single(
    settings_path: &Path,
    action: BuildAction,
    file: &Path,
    timeout: Option<Duration>,
) -> Result<i32> {
    let settings = Settings::load_from(settings_path);
    let command = CommandBuilder::new(settings.toolchain).build(action, file)?;

    println!("$ {command}");
    let output = run_once(&command, None, timeout).await?;
    print!("{}", output.output);

    match output.reason {
        ExitReason::TimedOut => eprintln!("Timed out"),
        ExitReason::Killed => eprintln!("Killed"),
        ExitReason::Finished => {}
    }
    Ok(output.code.unwrap_or(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Editor,
    Terminal,
    Tree,
}

struct AppState {
    /// One editor widget per session document, same order.
    editors: Vec<TextArea<'static>>,
    pane: TerminalPane,
    input: String,
    history: CommandHistory,
    focus: Focus,
    tree: Vec<TreeEntry>,
    tree_root: Option<PathBuf>,
    tree_state: ListState,
    show_tree: bool,
    status: Option<(String, bool)>,
    palette: Palette,
    events_tx: mpsc::UnboundedSender<ProcessEvent>,
}

impl AppState {
    fn new(session: &Session, events_tx: mpsc::UnboundedSender<ProcessEvent>) -> Self {
        let mut state = Self {
            editors: Vec::new(),
            pane: TerminalPane::new(),
            input: String::new(),
            history: CommandHistory::new(),
            focus: Focus::Editor,
            tree: Vec::new(),
            tree_root: None,
            tree_state: ListState::default(),
            show_tree: false,
            status: None,
            palette: Palette::for_theme(session.theme()),
            events_tx,
        };
        state.rebuild_editors(session);
        state.refresh_tree(session);
        state
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), false));
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), true));
    }

    fn rebuild_editors(&mut self, session: &Session) {
        self.editors = session.documents().iter().map(new_editor).collect();
    }

    /// Bring the editor list back in line with the session after `outcome`.
    /// `closed` is the index of a tab that was just closed, if any.
    fn sync_editors(&mut self, session: &Session, outcome: &ActionOutcome, closed: Option<usize>) {
        if let Some(index) = closed {
            if index < self.editors.len() {
                self.editors.remove(index);
            }
        }
        if let ActionOutcome::Opened(index) = outcome {
            if *index == self.editors.len() {
                if let Some(doc) = session.documents().get(*index) {
                    self.editors.push(new_editor(doc));
                }
            }
        }
        if self.editors.len() != session.len() {
            self.rebuild_editors(session);
        }
    }

    fn refresh_tree(&mut self, session: &Session) {
        let folder = session.folder().map(Path::to_path_buf);
        if folder == self.tree_root {
            return;
        }
        self.tree = folder
            .as_deref()
            .map(|root| project::list_folder(root, None))
            .unwrap_or_default();
        self.tree_state.select(if self.tree.is_empty() { None } else { Some(0) });
        self.show_tree = folder.is_some();
        self.tree_root = folder;
    }

    fn refresh_theme(&mut self, session: &Session) {
        if self.palette.name == session.theme().name() {
            return;
        }
        self.palette = Palette::for_theme(session.theme());
        match session.stylesheet() {
            Ok(Some(sheet)) => tracing::debug!("Loaded stylesheet ({} bytes)", sheet.len()),
            Ok(None) => {}
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor => Focus::Terminal,
            Focus::Terminal if self.show_tree => Focus::Tree,
            Focus::Terminal | Focus::Tree => Focus::Editor,
        };
    }
}

fn new_editor(doc: &Document) -> TextArea<'static> {
    let lines: Vec<String> = doc.text().split('\n').map(String::from).collect();
    TextArea::new(lines)
}

pub async fn run_tui(options: LaunchOptions) -> Result<()> {
    let store = StateStore::open(FileBackend::new(&options.settings_path));
    let mut session = Session::new(store);

    if options.restore {
        let reopened = session.restore();
        tracing::info!("Restored {} file(s) from the last session", reopened);
    }
    let mut startup_errors = Vec::new();
    for file in &options.files {
        if let Err(e) = session.open_path(file) {
            startup_errors.push(e.to_string());
        }
    }
    if let Some(theme) = options.theme {
        session.set_theme(theme);
    }

    let mut bench = Workbench::new(session);
    if let Some(shell) = options.shell {
        bench = bench.with_shell(shell);
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut state = AppState::new(bench.session(), events_tx.clone());
    if let Err(e) = bench.start_terminal(events_tx) {
        state.pane.push_line(e.to_string());
    }
    if let Some(e) = startup_errors.pop() {
        state.set_error(e);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut state, &mut bench, &mut events_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Tui,
    state: &mut AppState,
    bench: &mut Workbench,
    events_rx: &mut mpsc::UnboundedReceiver<ProcessEvent>,
) -> Result<()> {
    loop {
        // Process terminal output (non-blocking)
        while let Ok(event) = events_rx.try_recv() {
            handle_process_event(state, event);
        }

        let running = bench.terminal_running();
        terminal.draw(|f| draw_ui(f, state, bench.session(), running))?;

        if event::poll(Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(terminal, state, bench, key).await
                {
                    return Ok(());
                }
            }
        }
    }
}

fn handle_process_event(state: &mut AppState, event: ProcessEvent) {
    match event {
        ProcessEvent::Output(text) => state.pane.push_output(&text),
        ProcessEvent::Exited { code, reason } => {
            let note = match reason {
                ExitReason::Finished => match code {
                    Some(code) => format!("Process finished (exit code {code})."),
                    None => "Process finished.".to_string(),
                },
                ExitReason::Killed => "Process killed.".to_string(),
                ExitReason::TimedOut => "Process timed out.".to_string(),
            };
            state.pane.push_line(note);
        }
    }
}

/// Returns true when the application should exit.
async fn handle_key(
    terminal: &mut Tui,
    state: &mut AppState,
    bench: &mut Workbench,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let action = match key.code {
        KeyCode::Char('q') if ctrl => Some(UserAction::Quit),
        KeyCode::Char('n') if ctrl => Some(UserAction::New),
        KeyCode::Char('s') if ctrl => Some(UserAction::Save),
        KeyCode::Char('w') if ctrl => Some(UserAction::CloseActive),
        KeyCode::Char('k') if ctrl => Some(UserAction::Compile),
        KeyCode::F(5) => Some(UserAction::Run),
        KeyCode::Right if alt => Some(UserAction::NextTab),
        KeyCode::Left if alt => Some(UserAction::PreviousTab),
        _ => None,
    };
    if let Some(action) = action {
        return perform(terminal, state, bench, action).await;
    }

    match key.code {
        KeyCode::Char('o') if ctrl => {
            state.focus = Focus::Terminal;
            state.input = "/open ".to_string();
            return false;
        }
        KeyCode::Char('t') if ctrl => {
            state.next_focus();
            return false;
        }
        _ => {}
    }

    match state.focus {
        Focus::Editor => {
            handle_editor_key(state, bench, key);
            false
        }
        Focus::Terminal => handle_input_key(terminal, state, bench, key).await,
        Focus::Tree => handle_tree_key(terminal, state, bench, key).await,
    }
}

fn handle_editor_key(state: &mut AppState, bench: &mut Workbench, key: KeyEvent) {
    let Some(index) = bench.session().active_index() else {
        return;
    };
    let Some(editor) = state.editors.get_mut(index) else {
        return;
    };
    if editor.input(key) {
        let text = editor.lines().join("\n");
        if let Err(e) = bench.session_mut().edit_active(text) {
            state.set_error(e.to_string());
        }
    }
}

async fn handle_input_key(
    terminal: &mut Tui,
    state: &mut AppState,
    bench: &mut Workbench,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Enter => return submit_input(terminal, state, bench).await,
        KeyCode::Esc => state.focus = Focus::Editor,
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Up => {
            if let Some(previous) = state.history.previous() {
                state.input = previous.to_string();
            }
        }
        KeyCode::Down => {
            state.input = state.history.next().unwrap_or_default().to_string();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.push(c);
        }
        _ => {}
    }
    false
}

async fn handle_tree_key(
    terminal: &mut Tui,
    state: &mut AppState,
    bench: &mut Workbench,
    key: KeyEvent,
) -> bool {
    let selected = state.tree_state.selected().unwrap_or(0);
    match key.code {
        KeyCode::Up => state.tree_state.select(Some(selected.saturating_sub(1))),
        KeyCode::Down => {
            if selected + 1 < state.tree.len() {
                state.tree_state.select(Some(selected + 1));
            }
        }
        KeyCode::Enter => {
            if let Some(entry) = state.tree.get(selected) {
                let path = entry.path.clone();
                let quit = perform(terminal, state, bench, UserAction::OpenFromTree(path)).await;
                if !state.tree.get(selected).is_some_and(|e| e.is_dir) {
                    state.focus = Focus::Editor;
                }
                return quit;
            }
        }
        KeyCode::Esc => state.focus = Focus::Editor,
        _ => {}
    }
    false
}

async fn submit_input(terminal: &mut Tui, state: &mut AppState, bench: &mut Workbench) -> bool {
    let line = std::mem::take(&mut state.input);
    state.history.push(line.clone());

    match handle_command(&line) {
        CommandResult::Action(action) => return perform(terminal, state, bench, action).await,
        CommandResult::Message(message) => {
            for text in message.lines() {
                state.pane.push_line(text);
            }
        }
        CommandResult::Shell(command) => {
            state.pane.push_line(command.clone());
            if let Err(e) = bench.send_to_terminal(&command).await {
                state.set_error(e.to_string());
            }
        }
        CommandResult::ClearTerminal => state.pane.clear(),
        CommandResult::KillTerminal => {
            if let Err(e) = bench.kill_terminal() {
                state.set_error(e.to_string());
            }
        }
        CommandResult::RestartTerminal => match bench.start_terminal(state.events_tx.clone()) {
            Ok(()) => state.set_status("Terminal restarted"),
            Err(e) => state.set_error(e.to_string()),
        },
        CommandResult::ToggleTree => {
            if state.tree_root.is_some() {
                state.show_tree = !state.show_tree;
                if !state.show_tree && state.focus == Focus::Tree {
                    state.focus = Focus::Editor;
                }
            } else {
                state.set_status("No folder open. Use /folder <path>");
            }
        }
        CommandResult::ShowHistory => {
            let entries: Vec<String> = state.history.entries().to_vec();
            for (i, entry) in entries.iter().enumerate() {
                state.pane.push_line(format!("{:>4}  {}", i + 1, entry));
            }
        }
    }
    false
}

/// Route `action` through the workbench, then reconcile the UI with the
/// session. Returns true once shutdown has completed.
async fn perform(
    terminal: &mut Tui,
    state: &mut AppState,
    bench: &mut Workbench,
    action: UserAction,
) -> bool {
    let closed = match &action {
        UserAction::Close(index) => Some(*index),
        UserAction::CloseActive => bench.session().active_index(),
        _ => None,
    };

    let result = {
        let mut prompt = TuiPrompt {
            terminal: &mut *terminal,
            palette: &state.palette,
        };
        bench.dispatch(action, &mut prompt).await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => {
            state.set_status("Cancelled");
            return false;
        }
        Err(e) => {
            state.set_error(e.to_string());
            return false;
        }
    };

    let session = bench.session();
    state.sync_editors(session, &outcome, closed);
    state.refresh_tree(session);
    state.refresh_theme(session);

    match outcome {
        ActionOutcome::Quit => return true,
        ActionOutcome::Saved(path) => state.set_status(format!("Saved {}", path.display())),
        ActionOutcome::Command(command) => {
            state.pane.push_line(command);
            state.status = None;
        }
        ActionOutcome::Opened(_) | ActionOutcome::Done => state.status = None,
    }
    false
}

/// Modal dialogs drawn over the whole screen while the session waits for an answer.
struct TuiPrompt<'a> {
    terminal: &'a mut Tui,
    palette: &'a Palette,
}

impl TuiPrompt<'_> {
    fn draw_dialog(&mut self, title: &str, body: &str) -> io::Result<()> {
        let palette = self.palette;
        self.terminal.draw(|f| {
            let area = centered_rect(60, 40, f.area());
            f.render_widget(Clear, area);
            let dialog = Paragraph::new(body.to_string())
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(palette.fg).bg(palette.bg))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {title} "))
                        .border_style(Style::default().fg(palette.warning)),
                );
            f.render_widget(dialog, area);
        })?;
        Ok(())
    }
}

impl Prompt for TuiPrompt<'_> {
    fn confirm_unsaved(&mut self, document: &Document, reason: PromptReason) -> PromptResponse {
        let body = format!(
            "{}\n\n{}\n\n[S]ave   [D]iscard   [C]ancel",
            document.title(),
            reason.question()
        );
        loop {
            if self.draw_dialog("Save Changes?", &body).is_err() {
                return PromptResponse::Cancel;
            }
            let Some(key) = read_key() else {
                return PromptResponse::Cancel;
            };
            match key.code {
                KeyCode::Char('s') | KeyCode::Char('S') => return PromptResponse::Save,
                KeyCode::Char('d') | KeyCode::Char('D') => return PromptResponse::Discard,
                KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Esc => {
                    return PromptResponse::Cancel
                }
                _ => {}
            }
        }
    }

    fn choose_save_path(&mut self, document: &Document) -> Option<PathBuf> {
        let mut input = String::new();
        loop {
            let body = format!(
                "Save {} as:\n\n> {}\n\nEnter to save, Esc to cancel",
                document.title(),
                input
            );
            self.draw_dialog("Save File", &body).ok()?;
            let key = read_key()?;
            match key.code {
                KeyCode::Enter if !input.trim().is_empty() => {
                    return Some(expand_path(input.trim()));
                }
                KeyCode::Esc => return None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
        }
    }
}

fn read_key() -> Option<KeyEvent> {
    loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => return Some(key),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_ui(f: &mut Frame, state: &mut AppState, session: &Session, terminal_running: bool) {
    let palette = state.palette.clone();
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(10),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    draw_tabs(f, chunks[0], session, &palette);

    let editor_area = if state.show_tree {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(20), Constraint::Percentage(80)])
            .split(chunks[1]);
        draw_file_tree(f, body[0], state, &palette);
        body[1]
    } else {
        chunks[1]
    };

    draw_editor(f, editor_area, state, session, &palette);
    draw_terminal(f, chunks[2], state, session, terminal_running, &palette);
    draw_input(f, chunks[3], state, &palette);
    draw_status_bar(f, chunks[4], state, session, &palette);
}

fn draw_tabs(f: &mut Frame, area: Rect, session: &Session, palette: &Palette) {
    let titles: Vec<Line> = session
        .documents()
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let marker = if doc.is_dirty() { "*" } else { "" };
            Line::from(format!("{}:{}{}", i + 1, doc.title(), marker))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(session.active_index().unwrap_or(0))
        .style(Style::default().fg(palette.muted))
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");
    f.render_widget(tabs, area);
}

fn draw_file_tree(f: &mut Frame, area: Rect, state: &mut AppState, palette: &Palette) {
    let items: Vec<ListItem> = state
        .tree
        .iter()
        .map(|entry| {
            let indent = "  ".repeat(entry.depth.saturating_sub(1));
            let (icon, color) = if entry.is_dir {
                ("▸ ", palette.accent)
            } else {
                ("  ", palette.fg)
            };
            ListItem::new(Line::from(vec![
                Span::raw(indent),
                Span::styled(format!("{icon}{}", entry.name()), Style::default().fg(color)),
            ]))
        })
        .collect();

    let title = state
        .tree_root
        .as_deref()
        .and_then(|p| p.file_name())
        .map(|n| format!(" {} ", n.to_string_lossy()))
        .unwrap_or_else(|| " Files ".to_string());

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_border(state.focus == Focus::Tree, palette)),
        )
        .highlight_style(Style::default().bg(palette.selection));
    f.render_stateful_widget(list, area, &mut state.tree_state);
}

fn draw_editor(
    f: &mut Frame,
    area: Rect,
    state: &mut AppState,
    session: &Session,
    palette: &Palette,
) {
    let focused = state.focus == Focus::Editor;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", session.window_title()))
        .border_style(focus_border(focused, palette));

    let editor = session
        .active_index()
        .and_then(|i| state.editors.get_mut(i));
    match editor {
        Some(editor) => {
            editor.set_block(block);
            editor.set_style(Style::default().fg(palette.fg).bg(palette.bg));
            editor.set_line_number_style(Style::default().fg(palette.muted));
            editor.set_cursor_line_style(Style::default().bg(palette.selection));
            editor.set_cursor_style(if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            });
            f.render_widget(&*editor, area);
        }
        None => {
            let hint = Paragraph::new(
                "No file open.\n\nCtrl+N new file   Ctrl+O open file   /folder <path> open folder",
            )
            .style(Style::default().fg(palette.muted))
            .block(block);
            f.render_widget(hint, area);
        }
    }
}

fn draw_terminal(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    session: &Session,
    running: bool,
    palette: &Palette,
) {
    let shell = &session.store().settings().terminal.shell;
    let title = if running {
        format!(" Terminal ({shell}) ")
    } else {
        " Terminal (not running, /restart) ".to_string()
    };

    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .pane
        .tail(height)
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();

    let pane = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(palette.border)),
    );
    f.render_widget(pane, area);
}

fn draw_input(f: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let focused = state.focus == Focus::Terminal;
    let input = Paragraph::new(format!("> {}", state.input)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_border(focused, palette)),
    );
    f.render_widget(input, area);

    if focused {
        let x = area.x + 3 + state.input.chars().count() as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn draw_status_bar(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    session: &Session,
    palette: &Palette,
) {
    let (text, color) = match &state.status {
        Some((message, true)) => (message.clone(), palette.error),
        Some((message, false)) => (message.clone(), palette.success),
        None => (
            "^N New  ^O Open  ^S Save  ^W Close  ^K Compile  F5 Run  ^T Focus  ^Q Quit".to_string(),
            palette.muted,
        ),
    };

    let language = session
        .active()
        .and_then(|d| d.language())
        .map(|l| l.name())
        .unwrap_or("Plain Text");

    let line = Line::from(vec![
        Span::styled(text, Style::default().fg(color)),
        Span::styled(
            format!("  [{} | {}]", language, session.theme()),
            Style::default().fg(palette.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn focus_border(focused: bool, palette: &Palette) -> Style {
    if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.border)
    }
}
