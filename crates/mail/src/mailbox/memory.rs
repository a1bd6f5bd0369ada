//! In-memory mailbox implementation
//!
//! Used by tests and for running the front end without a Google account.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Mailbox, MessageFilter};
use crate::gmail::api::{
    AttachmentResponse, GmailMessage, GmailThread, ListMessagesResponse, MessageRef,
};
use crate::gmail::normalize::header_value;
use crate::models::{MessageId, ThreadId};

/// A message handed to [`Mailbox::send_raw`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub raw: String,
    pub thread_id: Option<ThreadId>,
}

/// In-memory implementation of Mailbox
///
/// Messages are listed in insertion order. Search queries understand
/// `is:`, `label:`, `from:`, `to:` and `subject:` terms; any other term
/// matches against subject and snippet.
pub struct InMemoryMailbox {
    messages: RwLock<Vec<GmailMessage>>,
    attachments: RwLock<HashMap<(String, String), String>>,
    sent: RwLock<Vec<SentMessage>>,
    unavailable: AtomicBool,
}

impl InMemoryMailbox {
    /// Create a new empty mailbox
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            attachments: RwLock::new(HashMap::new()),
            sent: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Add a message (replacing any message with the same ID)
    pub fn insert_message(&self, message: GmailMessage) -> Result<()> {
        let mut messages = write(&self.messages)?;
        messages.retain(|m| m.id != message.id);
        messages.push(message);
        Ok(())
    }

    /// Register base64url attachment data for a message
    pub fn insert_attachment(&self, message_id: &str, attachment_id: &str, data: &str) -> Result<()> {
        write(&self.attachments)?.insert(
            (message_id.to_string(), attachment_id.to_string()),
            data.to_string(),
        );
        Ok(())
    }

    /// Snapshot of a stored message
    pub fn message(&self, id: &str) -> Result<Option<GmailMessage>> {
        Ok(read(&self.messages)?.iter().find(|m| m.id == id).cloned())
    }

    /// Everything sent so far, oldest first
    pub fn sent(&self) -> Result<Vec<SentMessage>> {
        Ok(read(&self.sent)?.clone())
    }

    /// Make every call fail, as if the provider were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("Mailbox unavailable");
        }
        Ok(())
    }
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox for InMemoryMailbox {
    fn list_messages(
        &self,
        filter: &MessageFilter,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<ListMessagesResponse> {
        self.check_available()?;

        let offset: usize = match page_token.filter(|t| !t.is_empty()) {
            Some(token) => token.parse().context("Invalid page token")?,
            None => 0,
        };

        let messages = read(&self.messages)?;
        let matching: Vec<&GmailMessage> =
            messages.iter().filter(|m| matches_filter(m, filter)).collect();

        let page: Vec<MessageRef> = matching
            .iter()
            .skip(offset)
            .take(max_results)
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
            })
            .collect();

        let next = offset + page.len();
        Ok(ListMessagesResponse {
            next_page_token: (next < matching.len()).then(|| next.to_string()),
            result_size_estimate: Some(matching.len() as u32),
            messages: if page.is_empty() { None } else { Some(page) },
        })
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        self.check_available()?;
        self.message(id.as_str())?
            .ok_or_else(|| anyhow!("Message {} not found", id))
    }

    fn get_thread(&self, id: &ThreadId) -> Result<GmailThread> {
        self.check_available()?;
        let messages: Vec<GmailMessage> = read(&self.messages)?
            .iter()
            .filter(|m| m.thread_id.as_deref() == Some(id.as_str()))
            .cloned()
            .collect();

        if messages.is_empty() {
            bail!("Thread {} not found", id);
        }

        Ok(GmailThread {
            id: id.as_str().to_string(),
            messages: Some(messages),
        })
    }

    fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &str,
    ) -> Result<AttachmentResponse> {
        self.check_available()?;
        let attachments = read(&self.attachments)?;
        let data = attachments
            .get(&(message_id.as_str().to_string(), attachment_id.to_string()))
            .cloned();

        Ok(AttachmentResponse {
            size: data.as_ref().map(|d| d.len() as u64),
            data,
        })
    }

    fn modify_labels(&self, id: &MessageId, add: &[&str], remove: &[&str]) -> Result<()> {
        self.check_available()?;
        let mut messages = write(&self.messages)?;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id.as_str())
            .ok_or_else(|| anyhow!("Message {} not found", id))?;

        let labels = message.label_ids.get_or_insert_with(Vec::new);
        labels.retain(|l| !remove.contains(&l.as_str()));
        for label in add {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
        Ok(())
    }

    fn delete_message(&self, id: &MessageId) -> Result<()> {
        self.check_available()?;
        let mut messages = write(&self.messages)?;
        let before = messages.len();
        messages.retain(|m| m.id != id.as_str());
        if messages.len() == before {
            bail!("Message {} not found", id);
        }
        Ok(())
    }

    fn send_raw(&self, message: &str, thread_id: Option<&ThreadId>) -> Result<()> {
        self.check_available()?;
        write(&self.sent)?.push(SentMessage {
            raw: message.to_string(),
            thread_id: thread_id.cloned(),
        });
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("Mailbox lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("Mailbox lock poisoned"))
}

fn matches_filter(message: &GmailMessage, filter: &MessageFilter) -> bool {
    match filter {
        MessageFilter::Label(label) => message.has_label(label),
        MessageFilter::Query(query) => query
            .split_whitespace()
            .all(|term| matches_term(message, term)),
    }
}

fn matches_term(message: &GmailMessage, term: &str) -> bool {
    let header_contains = |name: &str, needle: &str| {
        header_value(message.headers(), name)
            .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
    };

    match term.split_once(':') {
        Some(("is" | "label", label)) => message.has_label(&label.to_uppercase()),
        Some(("from", needle)) => header_contains("From", needle),
        Some(("to", needle)) => header_contains("To", needle),
        Some(("subject", needle)) => header_contains("Subject", needle),
        _ => {
            header_contains("Subject", term)
                || message
                    .snippet
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&term.to_lowercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(id: &str, thread: &str, labels: &[&str], from: &str, subject: &str) -> GmailMessage {
        serde_json::from_value(json!({
            "id": id,
            "threadId": thread,
            "labelIds": labels,
            "snippet": format!("snippet {}", id),
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    { "name": "From", "value": from },
                    { "name": "Subject", "value": subject }
                ]
            }
        }))
        .unwrap()
    }

    fn ids(response: &ListMessagesResponse) -> Vec<String> {
        response
            .messages
            .iter()
            .flatten()
            .map(|m| m.id.clone())
            .collect()
    }

    #[test]
    fn test_list_by_label() {
        let mailbox = InMemoryMailbox::new();
        mailbox.insert_message(message("m1", "t1", &["INBOX"], "a@x.com", "One")).unwrap();
        mailbox.insert_message(message("m2", "t2", &["SENT"], "b@x.com", "Two")).unwrap();

        let response = mailbox
            .list_messages(&MessageFilter::Label("INBOX".into()), None, 10)
            .unwrap();
        assert_eq!(ids(&response), ["m1"]);
    }

    #[test]
    fn test_list_by_query() {
        let mailbox = InMemoryMailbox::new();
        mailbox.insert_message(message("m1", "t1", &["INBOX", "UNREAD"], "spam@example.com", "Win")).unwrap();
        mailbox.insert_message(message("m2", "t2", &["INBOX"], "boss@example.com", "Invoice")).unwrap();

        let query = |q: &str| {
            ids(&mailbox
                .list_messages(&MessageFilter::Query(q.into()), None, 10)
                .unwrap())
        };

        assert_eq!(query("is:unread"), ["m1"]);
        assert_eq!(query("from:spam@example.com"), ["m1"]);
        assert_eq!(query("subject:invoice"), ["m2"]);
        assert_eq!(query(""), ["m1", "m2"]);
    }

    #[test]
    fn test_pagination() {
        let mailbox = InMemoryMailbox::new();
        for i in 0..3 {
            mailbox
                .insert_message(message(&format!("m{i}"), "t", &["INBOX"], "a@x.com", "S"))
                .unwrap();
        }
        let filter = MessageFilter::Label("INBOX".into());

        let first = mailbox.list_messages(&filter, None, 2).unwrap();
        assert_eq!(ids(&first), ["m0", "m1"]);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let second = mailbox.list_messages(&filter, Some("2"), 2).unwrap();
        assert_eq!(ids(&second), ["m2"]);
        assert_eq!(second.next_page_token, None);
    }

    #[test]
    fn test_empty_page_token_starts_at_first_page() {
        let mailbox = InMemoryMailbox::new();
        for i in 0..3 {
            mailbox
                .insert_message(message(&format!("m{i}"), "t", &["INBOX"], "a@x.com", "S"))
                .unwrap();
        }
        let filter = MessageFilter::Label("INBOX".into());

        let page = mailbox.list_messages(&filter, Some(""), 2).unwrap();
        assert_eq!(ids(&page), ["m0", "m1"]);
        assert_eq!(page.next_page_token.as_deref(), Some("2"));
    }

    #[test]
    fn test_modify_labels() {
        let mailbox = InMemoryMailbox::new();
        mailbox.insert_message(message("m1", "t1", &["INBOX", "UNREAD"], "a@x.com", "S")).unwrap();

        mailbox.modify_labels(&MessageId::new("m1"), &["STARRED"], &["UNREAD"]).unwrap();

        let stored = mailbox.message("m1").unwrap().unwrap();
        assert_eq!(stored.label_ids.unwrap(), ["INBOX", "STARRED"]);
    }

    #[test]
    fn test_thread_and_delete() {
        let mailbox = InMemoryMailbox::new();
        mailbox.insert_message(message("m1", "t1", &[], "a@x.com", "S")).unwrap();
        mailbox.insert_message(message("m2", "t1", &[], "b@x.com", "Re: S")).unwrap();

        let thread = mailbox.get_thread(&ThreadId::new("t1")).unwrap();
        assert_eq!(thread.messages.unwrap().len(), 2);

        mailbox.delete_message(&MessageId::new("m1")).unwrap();
        assert!(mailbox.get_message(&MessageId::new("m1")).is_err());
        assert!(mailbox.delete_message(&MessageId::new("m1")).is_err());
    }

    #[test]
    fn test_unavailable() {
        let mailbox = InMemoryMailbox::new();
        mailbox.set_unavailable(true);
        assert!(mailbox.send_raw("To: a@x.com\r\n\r\nhi", None).is_err());
        assert!(mailbox.sent().unwrap().is_empty());
    }
}
