//! Thread views
//!
//! Renders every message of a thread for display, and condenses messages
//! into digests for the language model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::gmail::api::{GmailMessage, Header};
use crate::gmail::normalize::{collapse_whitespace, header_or, html_to_text};
use crate::gmail::{AttachmentRef, ExtractedParts, ImageRef, extract_parts, rewrite_inline_images};
use crate::mailbox::Mailbox;
use crate::models::{MessageId, ThreadId};

const NO_CONTENT: &str = "No content available";

/// The requested message has no thread
#[derive(Debug, thiserror::Error)]
#[error("No thread found")]
pub struct ThreadNotFound;

/// A message rendered for the thread view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    /// HTML (or plain text) body with inline images pointing at the attachment endpoint
    pub body: String,
    pub attachments: Vec<AttachmentRef>,
}

/// Compact description of a message for summarization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDigest {
    pub message_id: String,
    pub thread_id: Option<String>,
    pub metadata: DigestMetadata,
    pub content: DigestContent,
    pub attachments: Vec<DigestAttachment>,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestMetadata {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestAttachment {
    pub filename: String,
    pub mime_type: String,
}

impl DigestMetadata {
    fn from_headers(headers: &[Header]) -> Self {
        Self {
            subject: header_or(headers, "Subject", "(No Subject)"),
            from: header_or(headers, "From", "Unknown Sender"),
            to: header_or(headers, "To", "Unknown Recipient"),
            date: header_or(headers, "Date", "Unknown Date"),
        }
    }
}

/// Fetch a message and every message of its thread
pub fn get_thread_messages(
    mailbox: &dyn Mailbox,
    message_id: &MessageId,
) -> Result<(GmailMessage, Vec<GmailMessage>)> {
    let message = mailbox.get_message(message_id)?;
    let thread_id = message
        .thread_id
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or(ThreadNotFound)?;

    let thread = mailbox.get_thread(&ThreadId::new(thread_id))?;
    Ok((message, thread.messages.unwrap_or_default()))
}

/// Render the whole thread containing `message_id`
pub fn get_thread_view(mailbox: &dyn Mailbox, message_id: &MessageId) -> Result<Vec<ThreadMessage>> {
    let (_, messages) = get_thread_messages(mailbox, message_id)?;
    messages.iter().map(render_message).collect()
}

/// Render one message for display
pub fn render_message(message: &GmailMessage) -> Result<ThreadMessage> {
    let extracted = extract_message(message)?;
    let metadata = DigestMetadata::from_headers(message.headers());

    let body = rewrite_inline_images(
        extracted.body().unwrap_or(NO_CONTENT),
        &extracted.images,
        &MessageId::new(&message.id),
    );

    Ok(ThreadMessage {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        subject: metadata.subject,
        from: metadata.from,
        to: metadata.to,
        date: metadata.date,
        body,
        attachments: extracted.attachments,
    })
}

/// Condense one message for the language model
///
/// The text is the collapsed plain body followed by the HTML body rendered
/// as text, all on one line.
pub fn digest_message(message: &GmailMessage) -> Result<MessageDigest> {
    let extracted = extract_message(message)?;

    let text = format!(
        "{}  {}",
        collapse_whitespace(&extracted.text),
        html_to_text(&extracted.html)
    )
    .replace('\n', " ");

    Ok(MessageDigest {
        message_id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        metadata: DigestMetadata::from_headers(message.headers()),
        content: DigestContent { text },
        attachments: extracted
            .attachments
            .iter()
            .map(|a| DigestAttachment {
                filename: a.filename.clone(),
                mime_type: a.mime_type.clone(),
            })
            .collect(),
        images: extracted.images,
    })
}

fn extract_message(message: &GmailMessage) -> Result<ExtractedParts> {
    let Some(payload) = &message.payload else {
        return Ok(ExtractedParts::default());
    };
    extract_parts(payload.top_level_parts())
        .with_context(|| format!("Failed to extract parts of message {}", message.id))
}
