//! Scripted language model
//!
//! Replays canned replies in order and records every prompt. Used by tests
//! and for exercising the command flow without a provider key.

use anyhow::{Result, anyhow};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{LanguageModel, ResponseFormat};

pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<(String, ResponseFormat)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(reply.into()));
        }
        self
    }

    /// Queue a provider failure
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.into()));
        }
        self
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<(String, ResponseFormat)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| anyhow!("Scripted model lock poisoned"))?
            .push((prompt.to_string(), format));

        self.replies
            .lock()
            .map_err(|_| anyhow!("Scripted model lock poisoned"))?
            .pop_front()
            .unwrap_or_else(|| Err("No scripted reply left".to_string()))
            .map_err(|message| anyhow!(message))
    }
}
