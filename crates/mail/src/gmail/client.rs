//! Gmail API HTTP client
//!
//! Provides the mailbox operations over the Gmail REST API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;

use super::api::{
    AttachmentResponse, GmailMessage, GmailThread, ListMessagesResponse, ModifyMessageRequest,
    SendMessageRequest,
};
use super::normalize::encode_base64url;
use crate::mailbox::{Mailbox, MessageFilter};
use crate::models::{MessageId, ThreadId};

/// Gmail API client acting for one signed-in user
pub struct GmailClient {
    access_token: String,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a client from a verified access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// GET a Gmail endpoint and parse its JSON response
    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!("GET {}", url);
        let mut response = ureq::get(url)
            .header("Authorization", &self.bearer())
            .call()
            .with_context(|| format!("Failed to send {} request", what))?;

        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse {} response", what))
    }

    /// Build the list URL for a filter
    fn list_url(filter: &MessageFilter, page_token: Option<&str>, max_results: usize) -> String {
        let mut url = format!(
            "{}/users/me/messages?maxResults={}",
            Self::BASE_URL,
            max_results.clamp(1, 500)
        );

        match filter {
            MessageFilter::Label(label) => {
                url.push_str(&format!("&labelIds={}", urlencoding::encode(label)));
            }
            MessageFilter::Query(query) if !query.is_empty() => {
                url.push_str(&format!("&q={}", urlencoding::encode(query)));
            }
            MessageFilter::Query(_) => {}
        }

        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }
}

impl Mailbox for GmailClient {
    fn list_messages(
        &self,
        filter: &MessageFilter,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<ListMessagesResponse> {
        let url = Self::list_url(filter, page_token, max_results);
        self.get_json(&url, "list messages")
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        let url = format!(
            "{}/users/me/messages/{}?format=full",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );
        self.get_json(&url, "get message")
    }

    fn get_thread(&self, id: &ThreadId) -> Result<GmailThread> {
        let url = format!(
            "{}/users/me/threads/{}?format=full",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );
        self.get_json(&url, "get thread")
    }

    fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &str,
    ) -> Result<AttachmentResponse> {
        let url = format!(
            "{}/users/me/messages/{}/attachments/{}",
            Self::BASE_URL,
            urlencoding::encode(message_id.as_str()),
            urlencoding::encode(attachment_id)
        );
        self.get_json(&url, "get attachment")
    }

    fn modify_labels(&self, id: &MessageId, add: &[&str], remove: &[&str]) -> Result<()> {
        let url = format!(
            "{}/users/me/messages/{}/modify",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(&ModifyMessageRequest {
                add_label_ids: add,
                remove_label_ids: remove,
            })
            .context("Failed to send modify request")?;

        Ok(())
    }

    fn delete_message(&self, id: &MessageId) -> Result<()> {
        let url = format!(
            "{}/users/me/messages/{}",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        ureq::delete(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send delete request")?;

        Ok(())
    }

    fn send_raw(&self, message: &str, thread_id: Option<&ThreadId>) -> Result<()> {
        let url = format!("{}/users/me/messages/send", Self::BASE_URL);

        ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(&SendMessageRequest {
                raw: encode_base64url(message.as_bytes()),
                thread_id: thread_id.map(|t| t.as_str().to_string()),
            })
            .context("Failed to send message")?;

        Ok(())
    }
}
