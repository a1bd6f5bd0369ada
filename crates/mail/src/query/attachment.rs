use anyhow::{Context, Result};

use crate::gmail::normalize::decode_base64;
use crate::mailbox::Mailbox;
use crate::models::MessageId;

/// Fetch and decode an attachment's bytes
///
/// Returns `None` when the provider has no data for the attachment.
pub fn fetch_attachment(
    mailbox: &dyn Mailbox,
    message_id: &MessageId,
    attachment_id: &str,
) -> Result<Option<Vec<u8>>> {
    let response = mailbox.get_attachment(message_id, attachment_id)?;

    let Some(data) = response.data.filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    let bytes = decode_base64(&data)
        .with_context(|| format!("Invalid attachment data for {}", attachment_id))?;
    Ok(Some(bytes))
}
