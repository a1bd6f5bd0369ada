//! Message part extraction
//!
//! Walks a Gmail MIME part tree and flattens it into the pieces a renderer
//! needs: the plain text body, the HTML body, inline images and attachments.

use serde::{Deserialize, Serialize};

use super::api::MessagePart;
use super::normalize::decode_base64;
use crate::models::MessageId;

/// Filename recorded for inline images that don't carry one
const INLINE_IMAGE_FILENAME: &str = "inline-image";

/// A part body that isn't valid base64
#[derive(Debug, thiserror::Error)]
#[error("Invalid base64 body in {mime_type} part")]
pub struct DecodeError {
    pub mime_type: String,
    #[source]
    source: base64::DecodeError,
}

/// An image part that can be fetched by attachment ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub filename: String,
    pub mime_type: String,
    pub attachment_id: String,
    /// Content-ID without angle brackets, empty when the part has none
    pub cid: String,
}

/// A named part that can be fetched by attachment ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub filename: String,
    pub mime_type: String,
    pub attachment_id: String,
}

/// Flattened view of a message's part tree
///
/// `text` and `html` hold the last matching part seen in depth-first
/// pre-order. An image part with a filename is listed in both `images` and
/// `attachments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedParts {
    pub text: String,
    pub html: String,
    pub images: Vec<ImageRef>,
    pub attachments: Vec<AttachmentRef>,
}

impl ExtractedParts {
    /// Body to display: HTML if present, else plain text
    pub fn body(&self) -> Option<&str> {
        [self.html.as_str(), self.text.as_str()]
            .into_iter()
            .find(|b| !b.is_empty())
    }
}

/// Extract bodies, inline images and attachments from sibling parts
pub fn extract_parts(parts: &[MessagePart]) -> Result<ExtractedParts, DecodeError> {
    let mut extracted = ExtractedParts::default();
    extract_parts_into(parts, &mut extracted)?;
    Ok(extracted)
}

/// Extract into an existing accumulator
///
/// Children are visited before the next sibling, all writing into the same
/// `extracted`. Stops at the first body that fails to decode.
pub fn extract_parts_into(
    parts: &[MessagePart],
    extracted: &mut ExtractedParts,
) -> Result<(), DecodeError> {
    for part in parts {
        match (part.mime_type.as_str(), part.body_data()) {
            ("text/plain", Some(data)) => extracted.text = decode_text(part, data)?,
            ("text/html", Some(data)) => extracted.html = decode_text(part, data)?,
            _ => {}
        }

        if let Some(attachment_id) = part.attachment_id() {
            if let Some(filename) = part.filename() {
                extracted.attachments.push(AttachmentRef {
                    filename: filename.to_string(),
                    mime_type: part.mime_type.clone(),
                    attachment_id: attachment_id.to_string(),
                });
            }

            if part.mime_type.starts_with("image/") {
                extracted.images.push(ImageRef {
                    filename: part.filename().unwrap_or(INLINE_IMAGE_FILENAME).to_string(),
                    mime_type: part.mime_type.clone(),
                    attachment_id: attachment_id.to_string(),
                    cid: content_id(part),
                });
            }
        }

        if let Some(children) = &part.parts {
            extract_parts_into(children, extracted)?;
        }
    }

    Ok(())
}

fn decode_text(part: &MessagePart, data: &str) -> Result<String, DecodeError> {
    let bytes = decode_base64(data).map_err(|source| DecodeError {
        mime_type: part.mime_type.clone(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn content_id(part: &MessagePart) -> String {
    let Some(value) = part.header("Content-ID") else {
        return String::new();
    };
    let value = value.strip_prefix('<').unwrap_or(value);
    value.strip_suffix('>').unwrap_or(value).to_string()
}

/// Link served by the attachment endpoint for one attachment
pub fn attachment_link(message_id: &MessageId, attachment_id: &str) -> String {
    format!(
        "/api/attachment?messageId={}&attachmentId={}",
        urlencoding::encode(message_id.as_str()),
        urlencoding::encode(attachment_id)
    )
}

/// Replace every `cid:<cid>` reference in `body` with its attachment link
///
/// Images without a Content-ID are skipped.
pub fn rewrite_inline_images(body: &str, images: &[ImageRef], message_id: &MessageId) -> String {
    images
        .iter()
        .filter(|image| !image.cid.is_empty())
        .fold(body.to_string(), |body, image| {
            body.replace(
                &format!("cid:{}", image.cid),
                &attachment_link(message_id, &image.attachment_id),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::normalize::encode_base64url;
    use serde_json::{Value, json};

    fn parts(value: Value) -> Vec<MessagePart> {
        serde_json::from_value(value).unwrap()
    }

    fn b64(s: &str) -> String {
        encode_base64url(s.as_bytes())
    }

    #[test]
    fn test_empty_parts() {
        let extracted = extract_parts(&[]).unwrap();
        assert_eq!(extracted, ExtractedParts::default());
        assert_eq!(extracted.body(), None);
    }

    #[test]
    fn test_worked_example() {
        let input = parts(json!([
            { "mimeType": "text/plain", "body": { "data": b64("hello") } },
            { "mimeType": "text/html", "body": { "data": b64("<b>hi</b>") } },
            {
                "mimeType": "image/jpeg",
                "filename": "pic.jpg",
                "body": { "attachmentId": "ATT1" },
                "headers": [{ "name": "Content-ID", "value": "<pic1>" }]
            }
        ]));

        let extracted = extract_parts(&input).unwrap();

        assert_eq!(extracted.text, "hello");
        assert_eq!(extracted.html, "<b>hi</b>");
        assert_eq!(
            extracted.images,
            vec![ImageRef {
                filename: "pic.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                attachment_id: "ATT1".to_string(),
                cid: "pic1".to_string(),
            }]
        );
        assert_eq!(
            extracted.attachments,
            vec![AttachmentRef {
                filename: "pic.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                attachment_id: "ATT1".to_string(),
            }]
        );
    }

    #[test]
    fn test_last_text_part_wins_in_preorder() {
        let input = parts(json!([
            {
                "mimeType": "multipart/alternative",
                "parts": [
                    { "mimeType": "text/plain", "body": { "data": b64("first") } },
                    {
                        "mimeType": "multipart/related",
                        "parts": [
                            { "mimeType": "text/plain", "body": { "data": b64("nested") } }
                        ]
                    }
                ]
            },
            { "mimeType": "text/plain", "body": { "data": b64("last") } }
        ]));

        assert_eq!(extract_parts(&input).unwrap().text, "last");
    }

    #[test]
    fn test_children_visited_before_siblings() {
        let input = parts(json!([
            { "mimeType": "text/plain", "body": { "data": b64("outer") } },
            {
                "mimeType": "multipart/mixed",
                "parts": [
                    { "mimeType": "text/plain", "body": { "data": b64("inner") } }
                ]
            }
        ]));

        assert_eq!(extract_parts(&input).unwrap().text, "inner");
    }

    #[test]
    fn test_image_attachment_in_both_lists() {
        let input = parts(json!([
            { "mimeType": "image/png", "filename": "logo.png", "body": { "attachmentId": "A1" } }
        ]));

        let extracted = extract_parts(&input).unwrap();
        assert_eq!(extracted.images.len(), 1);
        assert_eq!(extracted.attachments.len(), 1);
        assert_eq!(extracted.images[0].attachment_id, "A1");
        assert_eq!(extracted.attachments[0].filename, "logo.png");
    }

    #[test]
    fn test_inline_image_defaults() {
        let input = parts(json!([
            { "mimeType": "image/gif", "filename": "", "body": { "attachmentId": "G1" } }
        ]));

        let extracted = extract_parts(&input).unwrap();
        assert!(extracted.attachments.is_empty());
        assert_eq!(extracted.images[0].filename, "inline-image");
        assert_eq!(extracted.images[0].cid, "");
    }

    #[test]
    fn test_content_id_brackets_stripped() {
        let input = parts(json!([
            {
                "mimeType": "image/png",
                "body": { "attachmentId": "A1" },
                "headers": [{ "name": "Content-ID", "value": "<abc123>" }]
            },
            {
                "mimeType": "image/png",
                "body": { "attachmentId": "A2" },
                "headers": [{ "name": "Content-Id", "value": "bare-id" }]
            }
        ]));

        let extracted = extract_parts(&input).unwrap();
        assert_eq!(extracted.images[0].cid, "abc123");
        assert_eq!(extracted.images[1].cid, "bare-id");
    }

    #[test]
    fn test_image_without_attachment_id_ignored() {
        let input = parts(json!([
            { "mimeType": "image/png", "filename": "tiny.png", "body": { "data": b64("png") } }
        ]));

        let extracted = extract_parts(&input).unwrap();
        assert!(extracted.images.is_empty());
        assert!(extracted.attachments.is_empty());
    }

    #[test]
    fn test_deeply_nested_attachment() {
        let input = parts(json!([
            {
                "mimeType": "multipart/mixed",
                "parts": [{
                    "mimeType": "multipart/related",
                    "parts": [{
                        "mimeType": "multipart/alternative",
                        "parts": [{
                            "mimeType": "application/pdf",
                            "filename": "report.pdf",
                            "body": { "attachmentId": "PDF1", "size": 1024 }
                        }]
                    }]
                }]
            }
        ]));

        let extracted = extract_parts(&input).unwrap();
        assert_eq!(
            extracted.attachments,
            vec![AttachmentRef {
                filename: "report.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                attachment_id: "PDF1".to_string(),
            }]
        );
    }

    #[test]
    fn test_extract_is_repeatable() {
        let input = parts(json!([
            { "mimeType": "text/html", "body": { "data": b64("<p>x</p>") } },
            { "mimeType": "image/png", "filename": "a.png", "body": { "attachmentId": "A" } }
        ]));

        assert_eq!(extract_parts(&input).unwrap(), extract_parts(&input).unwrap());
    }

    #[test]
    fn test_extract_into_existing_accumulator() {
        let mut extracted = ExtractedParts::default();
        let first = parts(json!([
            { "mimeType": "application/zip", "filename": "a.zip", "body": { "attachmentId": "Z1" } }
        ]));
        let second = parts(json!([
            { "mimeType": "application/zip", "filename": "b.zip", "body": { "attachmentId": "Z2" } }
        ]));

        extract_parts_into(&first, &mut extracted).unwrap();
        extract_parts_into(&second, &mut extracted).unwrap();

        let names: Vec<_> = extracted.attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, ["a.zip", "b.zip"]);
    }

    #[test]
    fn test_invalid_base64_propagates() {
        let input = parts(json!([
            { "mimeType": "text/plain", "body": { "data": "%%% not base64 %%%" } }
        ]));

        let err = extract_parts(&input).unwrap_err();
        assert_eq!(err.mime_type, "text/plain");
    }

    #[test]
    fn test_invalid_utf8_decoded_lossily() {
        // "_w" is the single byte 0xFF
        let input = parts(json!([
            { "mimeType": "text/plain", "body": { "data": "_w" } }
        ]));

        let extracted = extract_parts(&input).unwrap();
        assert_eq!(extracted.text, "\u{FFFD}");
    }

    #[test]
    fn test_body_prefers_html() {
        let extracted = ExtractedParts {
            text: "plain".to_string(),
            html: "<p>rich</p>".to_string(),
            ..Default::default()
        };
        assert_eq!(extracted.body(), Some("<p>rich</p>"));

        let text_only = ExtractedParts {
            text: "plain".to_string(),
            ..Default::default()
        };
        assert_eq!(text_only.body(), Some("plain"));
    }

    #[test]
    fn test_rewrite_inline_images() {
        let images = vec![
            ImageRef {
                filename: "pic.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                attachment_id: "ATT1".to_string(),
                cid: "pic1".to_string(),
            },
            ImageRef {
                filename: "inline-image".to_string(),
                mime_type: "image/png".to_string(),
                attachment_id: "ATT2".to_string(),
                cid: String::new(),
            },
        ];
        let html = r#"<img src="cid:pic1"><img src="cid:pic1"><img src="cid:other">"#;

        let rewritten = rewrite_inline_images(html, &images, &MessageId::new("m1"));

        assert_eq!(
            rewritten,
            r#"<img src="/api/attachment?messageId=m1&attachmentId=ATT1"><img src="/api/attachment?messageId=m1&attachmentId=ATT1"><img src="cid:other">"#
        );
    }
}
