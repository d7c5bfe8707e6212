use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{info, warn};

use super::decode::LossyDecoder;
use crate::error::{IdeError, Result};

/// How long to wait for the output pipe to close after the process is gone.
/// Background jobs started from the shell can keep them open indefinitely.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A chunk of merged stdout/stderr text.
    Output(String),
    /// Sent exactly once, after the last `Output` of the process.
    Exited { code: Option<i32>, reason: ExitReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Finished,
    Killed,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct StartOptions {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl StartOptions {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Kill the process once it has been alive this long.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// A running child process with piped stdio, normally the terminal pane's shell.
///
/// Output is pushed to the channel given to [`ShellProcess::start`]. Dropping
/// the handle kills the process.
pub struct ShellProcess {
    program: String,
    pid: Option<u32>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    running: Arc<AtomicBool>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ShellProcess {
    /// Spawn the process. Must be called from within a tokio runtime.
    ///
    /// stdout and stderr share one pipe, so output arrives in the order the
    /// process wrote it.
    pub fn start(
        options: StartOptions,
        events: mpsc::UnboundedSender<ProcessEvent>,
    ) -> Result<Self> {
        let program = options.program.clone();
        let spawn_error = |e: std::io::Error| IdeError::Spawn(format!("{}: {}", program, e));

        let (output, output_writer) = os_pipe::pipe().map_err(spawn_error)?;
        let stderr_writer = output_writer.try_clone().map_err(spawn_error)?;

        let mut cmd = Command::new(&options.program);
        cmd.args(&options.args)
            .stdin(Stdio::piped())
            .stdout(output_writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let spawned = cmd.spawn();
        // The command holds our copies of the write end; the reader only sees
        // end-of-file once they are closed.
        drop(cmd);
        let mut child = spawned.map_err(spawn_error)?;
        let pid = child.id();
        info!("Started {} (pid {:?})", options.program, pid);

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        spawn_reader(output, chunk_tx).map_err(spawn_error)?;

        let stdin = Arc::new(Mutex::new(child.stdin.take()));
        let running = Arc::new(AtomicBool::new(true));
        let (kill_tx, kill_rx) = oneshot::channel();

        tokio::spawn(supervise(
            child,
            chunk_rx,
            kill_rx,
            options.timeout,
            Arc::clone(&running),
            Arc::clone(&stdin),
            events,
            options.program.clone(),
        ));

        Ok(Self {
            program: options.program,
            pid,
            stdin,
            running,
            kill_tx: Some(kill_tx),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Write `text` followed by a newline to the process's stdin.
    pub async fn send_line(&self, text: &str) -> Result<()> {
        if !self.is_running() {
            return Err(IdeError::ProcessNotRunning);
        }

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(IdeError::ProcessNotRunning)?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|_| IdeError::ProcessNotRunning)?;
        stdin.flush().await.map_err(|_| IdeError::ProcessNotRunning)?;
        Ok(())
    }

    /// Terminate the process. The `Exited` event follows with [`ExitReason::Killed`].
    pub fn kill(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(IdeError::ProcessNotRunning);
        }
        match self.kill_tx.take() {
            Some(tx) => {
                let _ = tx.send(());
                Ok(())
            }
            None => Err(IdeError::ProcessNotRunning),
        }
    }
}

/// Output of a one-shot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub code: Option<i32>,
    pub output: String,
    pub reason: ExitReason,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.reason == ExitReason::Finished && self.code == Some(0)
    }
}

/// Run `command_line` through the host shell, wait for it, and collect its
/// merged output. The process is killed if it outlives `timeout`.
pub async fn run_once(
    command_line: &str,
    cwd: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<RunOutput> {
    let (shell, flag) = if cfg!(windows) {
        ("cmd.exe", "/C")
    } else {
        ("/bin/sh", "-c")
    };
    let mut options = StartOptions::new(shell)
        .arg(flag)
        .arg(command_line)
        .timeout(timeout);
    if let Some(cwd) = cwd {
        options = options.cwd(cwd);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let process = ShellProcess::start(options, tx)?;

    let mut output = String::new();
    while let Some(event) = rx.recv().await {
        match event {
            ProcessEvent::Output(text) => output.push_str(&text),
            ProcessEvent::Exited { code, reason } => {
                drop(process);
                return Ok(RunOutput {
                    code,
                    output,
                    reason,
                });
            }
        }
    }

    // The supervisor always sends `Exited` before dropping its sender.
    Err(IdeError::ProcessNotRunning)
}

/// Read the merged output pipe on a dedicated thread. A blocking task would
/// keep the runtime from shutting down while a background job holds the pipe.
fn spawn_reader(
    mut pipe: os_pipe::PipeReader,
    chunks: mpsc::UnboundedSender<String>,
) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("ideo-output".to_string())
        .spawn(move || {
            let mut decoder = LossyDecoder::default();
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                let n = match pipe.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                };
                let text = decoder.decode(&buf[..n]);
                if !text.is_empty() && chunks.send(text).is_err() {
                    return;
                }
            }
            let rest = decoder.finish();
            if !rest.is_empty() {
                let _ = chunks.send(rest);
            }
        })?;
    Ok(())
}

async fn wait_for_exit(
    child: &mut Child,
    kill_rx: &mut oneshot::Receiver<()>,
    timeout: Option<Duration>,
    program: &str,
) -> (std::io::Result<ExitStatus>, ExitReason) {
    let deadline = async {
        match timeout {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        status = child.wait() => (status, ExitReason::Finished),
        // Also fires when the handle is dropped.
        _ = kill_rx => {
            let _ = child.kill().await;
            (child.wait().await, ExitReason::Killed)
        }
        _ = deadline => {
            warn!("{} exceeded its time limit, killing it", program);
            let _ = child.kill().await;
            (child.wait().await, ExitReason::TimedOut)
        }
    }
}

/// Forward output while the process runs, then whatever is left in the pipe,
/// then `Exited`. Nothing is forwarded after `Exited`.
#[allow(clippy::too_many_arguments)]
async fn supervise(
    mut child: Child,
    mut chunks: mpsc::UnboundedReceiver<String>,
    mut kill_rx: oneshot::Receiver<()>,
    timeout: Option<Duration>,
    running: Arc<AtomicBool>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    events: mpsc::UnboundedSender<ProcessEvent>,
    program: String,
) {
    let (status, reason) = {
        let exit = wait_for_exit(&mut child, &mut kill_rx, timeout, &program);
        tokio::pin!(exit);
        loop {
            tokio::select! {
                Some(text) = chunks.recv() => {
                    let _ = events.send(ProcessEvent::Output(text));
                }
                result = &mut exit => break result,
            }
        }
    };

    running.store(false, Ordering::SeqCst);
    stdin.lock().await.take();

    let drain = async {
        while let Some(text) = chunks.recv().await {
            let _ = events.send(ProcessEvent::Output(text));
        }
    };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        warn!("{} left its output pipe open; dropping later output", program);
    }
    drop(chunks);

    let code = status.ok().and_then(|s| s.code());
    info!("{} exited with {:?} ({:?})", program, code, reason);
    let _ = events.send(ProcessEvent::Exited { code, reason });
}
