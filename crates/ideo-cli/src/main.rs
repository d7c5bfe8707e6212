use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ideo_core::{BuildAction, Settings, Theme};

mod app;
mod commands;
mod pane;
mod theme;

#[derive(Parser)]
#[command(name = "ideo")]
#[command(about = "IDEO - tabbed editor with an embedded terminal")]
#[command(version)]
struct Cli {
    /// Files to open in tabs
    files: Vec<PathBuf>,

    /// Settings file (defaults to <config dir>/ideo/settings.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color theme (dark, light)
    #[arg(long)]
    theme: Option<Theme>,

    /// Shell for the terminal pane
    #[arg(long)]
    shell: Option<String>,

    /// Don't reopen the files from the last session
    #[arg(long)]
    no_restore: bool,

    /// Compile FILE with the configured toolchain and exit
    #[arg(long, value_name = "FILE", conflicts_with = "run")]
    compile: Option<PathBuf>,

    /// Compile and run FILE, then exit
    #[arg(long, value_name = "FILE")]
    run: Option<PathBuf>,

    /// Kill --compile/--run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

/// The TUI owns the screen, so logs go to a file next to the settings.
fn init_logging() -> Result<()> {
    let dir = Settings::config_dir();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let log_path = dir.join("ideo.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Logging disabled: {e:#}");
    }

    let settings_path = cli.config.unwrap_or_else(Settings::config_path);
    let timeout = cli.timeout.map(Duration::from_secs);

    let single = match (cli.compile, cli.run) {
        (Some(file), _) => Some((BuildAction::Compile, file)),
        (None, Some(file)) => Some((BuildAction::Run, file)),
        (None, None) => None,
    };

    if let Some((action, file)) = single {
        let code = app::run_single(&settings_path, action, &file, timeout).await?;
        std::process::exit(code);
    }

    app::run_tui(app::LaunchOptions {
        settings_path,
        files: cli.files,
        theme: cli.theme,
        shell: cli.shell,
        restore: !cli.no_restore,
    })
    .await
}
