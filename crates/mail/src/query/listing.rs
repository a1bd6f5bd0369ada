//! Mailbox listing

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::gmail::api::GmailMessage;
use crate::gmail::normalize::{decode_html_entities, format_date, header_value};
use crate::mailbox::{Mailbox, MessageFilter};
use crate::models::{MessageId, labels};

/// Messages fetched per listing page
pub const EMAILS_PER_PAGE: usize = 10;

/// One row of the message list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummary {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub date: String,
    pub snippet: String,
    pub is_read: bool,
}

/// A page of the message list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPage {
    pub emails: Vec<EmailSummary>,
    pub next_page_token: Option<String>,
}

/// List one page of messages
///
/// Each listed message is fetched individually, in order. Messages without
/// headers are skipped.
pub fn list_emails(
    mailbox: &dyn Mailbox,
    filter: &MessageFilter,
    page_token: Option<&str>,
) -> Result<EmailPage> {
    let response = mailbox.list_messages(filter, page_token, EMAILS_PER_PAGE)?;
    let refs = response.messages.unwrap_or_default();
    debug!("Listing {} messages for {:?}", refs.len(), filter);

    let mut emails = Vec::with_capacity(refs.len());
    for message_ref in refs {
        if message_ref.id.is_empty() {
            continue;
        }

        let message = mailbox.get_message(&MessageId::new(message_ref.id))?;
        match summarize_message(&message) {
            Some(summary) => emails.push(summary),
            None => warn!("Skipping message {} without headers", message.id),
        }
    }

    Ok(EmailPage {
        emails,
        next_page_token: response.next_page_token,
    })
}

/// Build a list row from a full message, `None` when it has no headers
pub fn summarize_message(message: &GmailMessage) -> Option<EmailSummary> {
    let headers = message.payload.as_ref()?.headers.as_deref()?;

    let date = match header_value(headers, "Date").filter(|d| !d.is_empty()) {
        Some(raw) => format_date(raw),
        None => "Unknown Date".to_string(),
    };

    let snippet = match message.snippet.as_deref().filter(|s| !s.is_empty()) {
        Some(snippet) => decode_html_entities(snippet),
        None => "No snippet available".to_string(),
    };

    Some(EmailSummary {
        id: message.id.clone(),
        subject: header_value(headers, "Subject")
            .filter(|s| !s.is_empty())
            .unwrap_or("No Subject")
            .to_string(),
        from: header_value(headers, "From")
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown Sender")
            .to_string(),
        date,
        snippet,
        is_read: !message.has_label(labels::UNREAD),
    })
}
