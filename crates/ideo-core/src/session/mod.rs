pub mod dispatch;
pub mod manager;
pub mod prompt;

pub use dispatch::{ActionOutcome, UserAction};
pub use manager::Session;
pub use prompt::{Prompt, PromptReason, PromptResponse, ScriptedPrompt};
