//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 web flow and session token verification
//! - Gmail API client for reading and mutating messages
//! - Message part extraction (bodies, inline images, attachments)
//! - Header and body normalization helpers

mod auth;
mod client;
mod extract;
pub mod normalize;

pub use auth::{AuthError, GmailAuth, SessionToken, VerifiedToken};
pub use client::GmailClient;
pub use extract::{
    AttachmentRef, DecodeError, ExtractedParts, ImageRef, attachment_link, extract_parts,
    extract_parts_into, rewrite_inline_images,
};

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        #[serde(default)]
        pub id: String,
        pub thread_id: Option<String>,
    }

    /// Full message from Gmail API
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub thread_id: Option<String>,
        pub label_ids: Option<Vec<String>>,
        pub snippet: Option<String>,
        pub internal_date: Option<String>,
        pub payload: Option<MessagePart>,
    }

    impl GmailMessage {
        /// Headers of the top-level payload, empty when there is no payload
        pub fn headers(&self) -> &[Header] {
            self.payload
                .as_ref()
                .and_then(|p| p.headers.as_deref())
                .unwrap_or_default()
        }

        pub fn has_label(&self, label: &str) -> bool {
            self.label_ids
                .as_ref()
                .is_some_and(|labels| labels.iter().any(|l| l == label))
        }
    }

    /// Full thread from Gmail API
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailThread {
        pub id: String,
        pub messages: Option<Vec<GmailMessage>>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Part body: inline base64url data, or a reference to fetch it later
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub size: Option<u64>,
        pub data: Option<String>,
        pub attachment_id: Option<String>,
    }

    /// A node of the MIME tree. Gmail uses the same shape for the payload root.
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        #[serde(default)]
        pub mime_type: String,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    impl MessagePart {
        /// Find a header by name (case-insensitive)
        pub fn header(&self, name: &str) -> Option<&str> {
            super::normalize::header_value(self.headers.as_deref().unwrap_or_default(), name)
        }

        /// Inline body payload, if non-empty
        pub fn body_data(&self) -> Option<&str> {
            self.body
                .as_ref()
                .and_then(|b| b.data.as_deref())
                .filter(|d| !d.is_empty())
        }

        /// Attachment reference, if non-empty
        pub fn attachment_id(&self) -> Option<&str> {
            self.body
                .as_ref()
                .and_then(|b| b.attachment_id.as_deref())
                .filter(|id| !id.is_empty())
        }

        /// Filename, if non-empty (Gmail sends "" for body parts)
        pub fn filename(&self) -> Option<&str> {
            self.filename.as_deref().filter(|f| !f.is_empty())
        }

        /// The parts to walk when this node is a message payload.
        ///
        /// A multipart payload yields its children; a single-part payload
        /// carries its body itself and yields just itself.
        pub fn top_level_parts(&self) -> &[MessagePart] {
            match &self.parts {
                Some(parts) => parts,
                None => std::slice::from_ref(self),
            }
        }
    }

    /// Response from fetching an attachment
    #[derive(Debug, Clone, Deserialize)]
    pub struct AttachmentResponse {
        pub size: Option<u64>,
        pub data: Option<String>,
    }

    /// Body of a label modification request
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ModifyMessageRequest<'a> {
        pub add_label_ids: &'a [&'a str],
        pub remove_label_ids: &'a [&'a str],
    }

    /// Body of a send request (RFC 822 message, base64url encoded)
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendMessageRequest {
        pub raw: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub thread_id: Option<String>,
    }
}
