//! Commands as produced by the language model

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::MessageId;

/// A command exactly as the model returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

impl RawCommand {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }

    /// String parameter, empty when missing. Numbers are accepted as IDs.
    pub fn param(&self, name: &str) -> String {
        match self.params.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

/// A recognized command with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Retrieve { query: String },
    Process { email_id: MessageId },
    Send { to: String, subject: String, message: String },
    Reply { email_id: MessageId, message: String },
    Delete { email_id: MessageId },
    Archive { email_id: MessageId },
    MarkRead { email_id: MessageId },
    MarkUnread { email_id: MessageId },
}

impl Command {
    /// Recognize a raw command; `None` for unknown names
    pub fn from_raw(raw: &RawCommand) -> Option<Self> {
        let email_id = || MessageId::new(raw.param("emailId"));

        let command = match raw.command.as_str() {
            "retrieve" => Command::Retrieve {
                query: raw.param("query"),
            },
            "process" => Command::Process { email_id: email_id() },
            "send" => Command::Send {
                to: raw.param("to"),
                subject: raw.param("subject"),
                message: raw.param("message"),
            },
            "reply" => Command::Reply {
                email_id: email_id(),
                message: raw.param("message"),
            },
            "delete" => Command::Delete { email_id: email_id() },
            "archive" => Command::Archive { email_id: email_id() },
            "mark_read" => Command::MarkRead { email_id: email_id() },
            "mark_unread" => Command::MarkUnread { email_id: email_id() },
            _ => return None,
        };
        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Retrieve { .. } => "retrieve",
            Command::Process { .. } => "process",
            Command::Send { .. } => "send",
            Command::Reply { .. } => "reply",
            Command::Delete { .. } => "delete",
            Command::Archive { .. } => "archive",
            Command::MarkRead { .. } => "mark_read",
            Command::MarkUnread { .. } => "mark_unread",
        }
    }

    /// Error reported when the provider call behind this command fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Command::Retrieve { .. } => "Failed to retrieve emails.",
            Command::Process { .. } => "Failed to fetch email details.",
            Command::Send { .. } => "Failed to send email.",
            Command::Reply { .. } => "Failed to send reply.",
            Command::Delete { .. } => "Failed to delete email.",
            Command::Archive { .. } => "Failed to archive email.",
            Command::MarkRead { .. } => "Failed to mark email as read.",
            Command::MarkUnread { .. } => "Failed to mark email as unread.",
        }
    }
}

/// Parse the model's reply into commands
///
/// Accepts a bare array, an object wrapping an array (`{"data": [...]}`),
/// or a single command object, optionally inside a Markdown code fence.
/// Anything else yields no commands.
pub fn parse_commands(reply: &str) -> Vec<RawCommand> {
    let value: Value = match serde_json::from_str(strip_code_fence(reply)) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse model reply as JSON: {}", e);
            return Vec::new();
        }
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("command") => vec![Value::Object(map)],
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!("Skipping malformed command: {}", e);
                None
            }
        })
        .collect()
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
