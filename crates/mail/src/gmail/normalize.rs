//! Gmail API response normalization
//!
//! Small helpers shared by the extractor and the views: header lookup,
//! base64 body decoding, date and text cleanup.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::prelude::*;
use chrono::DateTime;

use super::api::Header;

/// Gmail emits base64url, usually unpadded. Padding is accepted either way.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Find a header value by name (case-insensitive)
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Find a header value by name, falling back to `default`
pub fn header_or(headers: &[Header], name: &str, default: &str) -> String {
    header_value(headers, name)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Decode base64-encoded body data
///
/// Tries the URL-safe alphabet first, then the standard one. The error
/// reported is the URL-safe one since that is what Gmail sends.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_LENIENT
        .decode(data)
        .or_else(|err| STANDARD_LENIENT.decode(data).map_err(|_| err))
}

/// Encode bytes as unpadded base64url (the form Gmail expects for `raw`)
pub fn encode_base64url(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Format an RFC 2822 `Date` header like `3/14/2024, 9:05:00 AM`
///
/// The date is rendered in the sender's own offset. Values that don't parse
/// are returned unchanged.
pub fn format_date(raw: &str) -> String {
    // Strip a trailing zone comment such as "(UTC)"
    let trimmed = match raw.rfind('(') {
        Some(idx) if raw.trim_end().ends_with(')') => raw[..idx].trim_end(),
        _ => raw.trim(),
    };

    match DateTime::parse_from_rfc2822(trimmed) {
        Ok(date) => date.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Decode HTML entities in snippet text
pub fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Collapse every whitespace run to a single space and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render HTML to plain text
pub fn html_to_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    html2text::from_read(html.as_bytes(), 80).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
        pairs
            .iter()
            .map(|(n, v)| Header {
                name: n.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_header_value() {
        let headers = headers(&[("From", "test@example.com"), ("Subject", "Test Subject")]);

        assert_eq!(header_value(&headers, "From"), Some("test@example.com"));
        assert_eq!(header_value(&headers, "Subject"), Some("Test Subject"));
        assert_eq!(header_value(&headers, "Cc"), None);
    }

    #[test]
    fn test_header_value_case_insensitive() {
        let headers = headers(&[("FROM", "test@example.com")]);
        assert_eq!(header_value(&headers, "from"), Some("test@example.com"));
    }

    #[test]
    fn test_header_or_default() {
        let headers = headers(&[("Subject", "")]);
        assert_eq!(header_or(&headers, "Subject", "No Subject"), "No Subject");
        assert_eq!(header_or(&headers, "From", "Unknown Sender"), "Unknown Sender");
    }

    #[test]
    fn test_decode_base64_url_safe() {
        // "Hello, World!" in base64url
        let decoded = decode_base64("SGVsbG8sIFdvcmxkIQ").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_decode_base64_padded_and_standard() {
        assert_eq!(decode_base64("aGk=").unwrap(), b"hi");
        // "??>" encodes with '+' / '/' in the standard alphabet
        assert_eq!(decode_base64("Pz8+").unwrap(), b"??>");
        assert_eq!(decode_base64("Pz8-").unwrap(), b"??>");
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert!(decode_base64("not base64!!").is_err());
    }

    #[test]
    fn test_encode_base64url_round_trip() {
        let encoded = encode_base64url(b"To: a@example.com\n\nhi?>");
        assert!(!encoded.contains('='));
        assert_eq!(decode_base64(&encoded).unwrap(), b"To: a@example.com\n\nhi?>");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date("Thu, 14 Mar 2024 09:05:00 +0000"),
            "3/14/2024, 9:05:00 AM"
        );
        assert_eq!(
            format_date("Tue, 1 Oct 2024 17:30:12 -0700 (PDT)"),
            "10/1/2024, 5:30:12 PM"
        );
    }

    #[test]
    fn test_format_date_unparseable() {
        assert_eq!(format_date("sometime last week"), "sometime last week");
    }

    #[test]
    fn test_decode_html_entities() {
        let input = "Hello &amp; welcome &lt;user&gt;";
        assert_eq!(decode_html_entities(input), "Hello & welcome <user>");
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\t c  "), "a b c");
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<p>Hello <b>there</b></p>");
        assert!(text.contains("Hello"));
        assert!(text.contains("there"));
        assert!(!text.contains("<b>"));
        assert_eq!(html_to_text(""), "");
    }
}
