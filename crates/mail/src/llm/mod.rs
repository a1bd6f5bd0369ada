//! Large language model access
//!
//! The command handler only needs "send a prompt, get text back", so the
//! provider sits behind [`LanguageModel`].

mod mistral;
mod scripted;

use anyhow::Result;

pub use mistral::MistralClient;
pub use scripted::ScriptedModel;

/// Shape the model is asked to answer in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    /// Provider-enforced JSON object output
    Json,
}

/// A chat model answering single-turn prompts
pub trait LanguageModel: Send + Sync {
    /// Send one user message and return the reply text
    fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String>;
}
