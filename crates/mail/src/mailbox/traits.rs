//! Mailbox trait definitions

use anyhow::Result;

use crate::gmail::api::{AttachmentResponse, GmailMessage, GmailThread, ListMessagesResponse};
use crate::models::{MessageId, ThreadId};

/// Which messages a listing returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    /// Messages carrying a Gmail label ID (e.g. "INBOX")
    Label(String),
    /// Messages matching a Gmail search query (e.g. "is:unread")
    Query(String),
}

/// Trait for remote mailbox operations
///
/// Every call is a single blocking round-trip. Implementations don't retry.
pub trait Mailbox: Send + Sync {
    /// List message references, newest first
    fn list_messages(
        &self,
        filter: &MessageFilter,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<ListMessagesResponse>;

    /// Get a full message by ID
    fn get_message(&self, id: &MessageId) -> Result<GmailMessage>;

    /// Get a full thread by ID
    fn get_thread(&self, id: &ThreadId) -> Result<GmailThread>;

    /// Get the (base64url) content of an attachment
    fn get_attachment(&self, message_id: &MessageId, attachment_id: &str)
    -> Result<AttachmentResponse>;

    /// Add and remove labels on a message
    fn modify_labels(&self, id: &MessageId, add: &[&str], remove: &[&str]) -> Result<()>;

    /// Permanently delete a message
    fn delete_message(&self, id: &MessageId) -> Result<()>;

    /// Send an RFC 822 message, optionally into an existing thread
    fn send_raw(&self, message: &str, thread_id: Option<&ThreadId>) -> Result<()>;
}
