//! Command execution
//!
//! Runs commands against a mailbox, using the language model for thread
//! summaries and reply drafting.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::command::{Command, RawCommand, parse_commands};
use super::compose::compose_message;
use super::prompts;
use crate::gmail::api::Header;
use crate::gmail::normalize::header_value;
use crate::llm::{LanguageModel, ResponseFormat};
use crate::mailbox::{Mailbox, MessageFilter};
use crate::models::{MessageId, ThreadId, labels};
use crate::query::{EmailSummary, ThreadNotFound, digest_message, get_thread_messages, list_emails};

const SUMMARY_FAILED: &str = "Failed to summarize the data.";
const NO_REPLY: &str = "No reply generated.";

/// Command failures reported to the user as-is
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Recipient not found.")]
    RecipientNotFound,
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    fn ok(command: &str, result: Value) -> Self {
        Self {
            command: command.to_string(),
            result: Some(result),
            error: None,
        }
    }

    fn err(command: &str, error: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Summary of a message's thread plus the message's own headers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailDetails {
    pub data: String,
    pub headers: Vec<Header>,
    #[serde(skip)]
    pub thread_id: Option<ThreadId>,
}

/// Reply drafted by the language model
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub metadata: Option<ReplyMetadata>,
    #[serde(default)]
    pub attachments: Vec<SuggestedAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReplyMetadata {
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAttachment {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub url: String,
}

/// Handler for natural-language mailbox commands
///
/// Each command's outcome is independent: a failing command is reported in
/// its result and execution continues with the next one.
pub struct ActionHandler {
    mailbox: Arc<dyn Mailbox>,
    model: Arc<dyn LanguageModel>,
}

impl ActionHandler {
    pub fn new(mailbox: Arc<dyn Mailbox>, model: Arc<dyn LanguageModel>) -> Self {
        Self { mailbox, model }
    }

    /// Map free text to commands and execute them
    ///
    /// Fails only when the model cannot be reached for the mapping.
    pub fn run(&self, user_input: &str) -> Result<Vec<CommandResult>> {
        let commands = self.map_command(user_input)?;
        Ok(self.execute(&commands))
    }

    /// Ask the model which commands the user means
    pub fn map_command(&self, user_input: &str) -> Result<Vec<RawCommand>> {
        let reply = self
            .model
            .complete(&prompts::command_map(user_input), ResponseFormat::Json)
            .context("Failed to map command")?;
        debug!("Command mapping reply: {}", reply);

        let commands = parse_commands(&reply);
        info!("Mapped user input to {} command(s)", commands.len());
        Ok(commands)
    }

    /// Execute commands in order
    pub fn execute(&self, commands: &[RawCommand]) -> Vec<CommandResult> {
        commands.iter().map(|raw| self.execute_one(raw)).collect()
    }

    fn execute_one(&self, raw: &RawCommand) -> CommandResult {
        let Some(command) = Command::from_raw(raw) else {
            warn!("Unknown command: {}", raw.command);
            return CommandResult::err(&raw.command, "Unknown command");
        };

        info!("Executing {}", command.name());
        let outcome = match &command {
            Command::Retrieve { query } => to_value(self.retrieve(query)),
            Command::Process { email_id } => self.process(email_id).and_then(to_value),
            Command::Send { to, subject, message } => {
                self.send(to, subject, message).map(Value::String)
            }
            Command::Reply { email_id, message } => self.reply(email_id, message).map(Value::String),
            Command::Delete { email_id } => self.delete(email_id).map(Value::String),
            Command::Archive { email_id } => self.archive(email_id).map(Value::String),
            Command::MarkRead { email_id } => self.mark_read(email_id).map(Value::String),
            Command::MarkUnread { email_id } => self.mark_unread(email_id).map(Value::String),
        };

        match outcome {
            Ok(result) => CommandResult::ok(command.name(), result),
            Err(e) => CommandResult::err(command.name(), error_message(&command, &e)),
        }
    }

    /// Up to one page of messages matching a search query
    ///
    /// Provider failures are logged and yield an empty list.
    pub fn retrieve(&self, query: &str) -> Vec<EmailSummary> {
        let filter = MessageFilter::Query(query.to_string());
        match list_emails(self.mailbox.as_ref(), &filter, None) {
            Ok(page) => {
                if page.emails.is_empty() {
                    warn!("No emails found for query: {:?}", query);
                }
                page.emails
            }
            Err(e) => {
                error!("Error fetching emails: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Summarize the thread containing a message
    pub fn process(&self, email_id: &MessageId) -> Result<EmailDetails> {
        let (message, thread) = get_thread_messages(self.mailbox.as_ref(), email_id)?;

        let digests = thread
            .iter()
            .map(|m| {
                let digest = digest_message(m)?;
                serde_json::to_string(&digest).context("Failed to serialize digest")
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EmailDetails {
            data: self.summarize(&digests),
            headers: message.headers().to_vec(),
            thread_id: message.thread_id.clone().map(ThreadId::new),
        })
    }

    fn summarize(&self, digests: &[String]) -> String {
        match self
            .model
            .complete(&prompts::summarize(digests), ResponseFormat::Text)
        {
            Ok(summary) => summary,
            Err(e) => {
                error!("Error summarizing data: {:#}", e);
                SUMMARY_FAILED.to_string()
            }
        }
    }

    /// Send a new plain-text email
    pub fn send(&self, to: &str, subject: &str, message: &str) -> Result<String> {
        if to.trim().is_empty() {
            return Err(CommandError::RecipientNotFound.into());
        }

        let raw = compose_message(&[("To", to), ("Subject", subject)], message);
        self.mailbox.send_raw(&raw, None)?;
        info!("Sent email to {}", to);
        Ok(format!("Email successfully sent to {}.", to))
    }

    /// Draft a reply with the model and send it to the original sender
    ///
    /// `instructions` is the user's wording for the reply, passed to the
    /// model alongside the thread summary.
    pub fn reply(&self, email_id: &MessageId, instructions: &str) -> Result<String> {
        let details = self.process(email_id)?;
        let generated = self.generate_reply(&details.data, instructions)?;

        let to = header_value(&details.headers, "From")
            .filter(|v| !v.trim().is_empty())
            .ok_or(CommandError::RecipientNotFound)?;

        let subject = header_value(&details.headers, "Subject").unwrap_or_default();
        let subject = if subject.starts_with("Re:") {
            subject.to_string()
        } else {
            format!("Re: {}", subject)
        };

        // Threading headers reference the RFC 822 Message-ID when the original has one
        let reference = header_value(&details.headers, "Message-ID").unwrap_or(email_id.as_str());

        let body = generated
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(NO_REPLY);

        if let Some(metadata) = &generated.metadata {
            debug!("Reply tone: {}, summary: {}", metadata.tone, metadata.summary);
        }
        if !generated.attachments.is_empty() {
            info!(
                "Ignoring {} attachment(s) suggested for the reply",
                generated.attachments.len()
            );
        }

        let raw = compose_message(
            &[
                ("To", to),
                ("Subject", subject.as_str()),
                ("In-Reply-To", reference),
                ("References", reference),
            ],
            body,
        );
        self.mailbox.send_raw(&raw, details.thread_id.as_ref())?;
        info!("Sent reply to {} for message {}", to, email_id);
        Ok(format!("Reply successfully sent to {}.", to))
    }

    fn generate_reply(&self, email_details: &str, instructions: &str) -> Result<GeneratedReply> {
        let reply = self
            .model
            .complete(&prompts::reply(email_details, instructions), ResponseFormat::Json)
            .context("Failed to generate reply")?;

        Ok(serde_json::from_str(reply.trim()).unwrap_or_else(|e| {
            warn!("Failed to parse generated reply: {}", e);
            GeneratedReply::default()
        }))
    }

    /// Permanently delete a message
    pub fn delete(&self, email_id: &MessageId) -> Result<String> {
        self.mailbox.delete_message(email_id)?;
        info!("Deleted message {}", email_id);
        Ok("Email successfully deleted.".to_string())
    }

    /// Archive a message (remove INBOX)
    pub fn archive(&self, email_id: &MessageId) -> Result<String> {
        self.mailbox.modify_labels(email_id, &[], &[labels::INBOX])?;
        info!("Archived message {}", email_id);
        Ok("Email successfully archived.".to_string())
    }

    /// Mark a message read (remove UNREAD)
    pub fn mark_read(&self, email_id: &MessageId) -> Result<String> {
        self.mailbox.modify_labels(email_id, &[], &[labels::UNREAD])?;
        Ok("Email marked as read.".to_string())
    }

    /// Mark a message unread (add UNREAD)
    pub fn mark_unread(&self, email_id: &MessageId) -> Result<String> {
        self.mailbox.modify_labels(email_id, &[labels::UNREAD], &[])?;
        Ok("Email marked as unread.".to_string())
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize command result")
}

/// User-facing error for a failed command; provider causes are only logged
fn error_message(command: &Command, err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<CommandError>() {
        return e.to_string();
    }
    if let Some(e) = err.downcast_ref::<ThreadNotFound>() {
        return e.to_string();
    }
    error!("{} failed: {:#}", command.name(), err);
    command.failure_message().to_string()
}
