//! Mistral chat completions client
//!
//! Uses synchronous HTTP (ureq) like the Gmail client.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LanguageModel, ResponseFormat};
use crate::config::MistralConfig;

pub struct MistralClient {
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatSpec>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormatSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Value,
}

impl MistralClient {
    const CHAT_URL: &'static str = "https://api.mistral.ai/v1/chat/completions";

    pub fn new(config: &MistralConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn request<'a>(&'a self, prompt: &'a str, format: ResponseFormat) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: match format {
                ResponseFormat::Text => None,
                ResponseFormat::Json => Some(ResponseFormatSpec {
                    kind: "json_object",
                }),
            },
        }
    }
}

impl LanguageModel for MistralClient {
    fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        debug!("Sending {} char prompt to {}", prompt.len(), self.model);

        let mut response = ureq::post(Self::CHAT_URL)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&self.request(prompt, format))
            .context("Failed to send chat completion request")?;

        let chat: ChatResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse chat completion response")?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .context("Chat completion returned no choices")?;

        Ok(content_text(&choice.message.content))
    }
}

/// Flatten message content: a plain string, or an array of text chunks
fn content_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(chunks) => chunks
            .iter()
            .filter_map(|chunk| match chunk {
                Value::String(s) => Some(s.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MistralClient {
        MistralClient::new(&MistralConfig {
            api_key: "key".to_string(),
            model: "ministral-8b-latest".to_string(),
        })
    }

    #[test]
    fn test_json_request_body() {
        let client = client();
        let body = serde_json::to_value(client.request("hi", ResponseFormat::Json)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "ministral-8b-latest",
                "messages": [{ "role": "user", "content": "hi" }],
                "response_format": { "type": "json_object" }
            })
        );
    }

    #[test]
    fn test_text_request_omits_format() {
        let client = client();
        let body = serde_json::to_value(client.request("hi", ResponseFormat::Text)).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_content_text() {
        assert_eq!(content_text(&json!("plain")), "plain");
        assert_eq!(
            content_text(&json!([{ "type": "text", "text": "a" }, { "type": "text", "text": "b" }])),
            "ab"
        );
        assert_eq!(content_text(&Value::Null), "");
    }

    #[test]
    fn test_parse_chat_response() {
        let chat: ChatResponse = serde_json::from_value(json!({
            "id": "x",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "[]" } }]
        }))
        .unwrap();
        assert_eq!(content_text(&chat.choices[0].message.content), "[]");
    }
}
