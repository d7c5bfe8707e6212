pub mod decode;
pub mod history;
pub mod shell;

pub use decode::LossyDecoder;
pub use history::CommandHistory;
pub use shell::{run_once, ExitReason, ProcessEvent, RunOutput, ShellProcess, StartOptions};
