//! Prompt templates for the language model

/// Few-shot prompt mapping free text to commands
pub fn command_map(user_input: &str) -> String {
    format!(
        r#"Only give the JSON array, no other text, because the answer is passed straight to a program.
Map the following user input to one or more actions, and always return the result as an array of commands.
The only valid commands are:
"retrieve", "process", "send", "reply", "delete", "archive", "mark_read", "mark_unread".

Examples:

1. "Show me unread emails"
   → {{"data": [{{ "command": "retrieve", "params": {{ "query": "is:unread" }} }}]}}
2. "Send an email to john@example.com with subject 'Meeting' and message 'Let's discuss tomorrow'"
   → {{"data": [{{ "command": "send", "params": {{ "to": "john@example.com", "subject": "Meeting", "message": "Let's discuss tomorrow" }} }}]}}
3. "Mark all emails from yesterday as read"
   → {{"data": [
        {{ "command": "retrieve", "params": {{ "query": "after:yesterday" }} }},
        {{ "command": "mark_read", "params": {{ "emailId": "<emailId>" }} }}
      ]}}
4. "Reply to email with ID 98765 with message 'Got it!'"
   → {{"data": [{{ "command": "reply", "params": {{ "emailId": "98765", "message": "Got it!" }} }}]}}
5. "Delete the email with ID 56789"
   → {{"data": [{{ "command": "delete", "params": {{ "emailId": "56789" }} }}]}}
6. "Archive the email with ID 12345"
   → {{"data": [{{ "command": "archive", "params": {{ "emailId": "12345" }} }}]}}
7. "Mark the email with ID 67890 as unread"
   → {{"data": [{{ "command": "mark_unread", "params": {{ "emailId": "67890" }} }}]}}
8. "Show all emails with subject 'Invoice'"
   → {{"data": [{{ "command": "retrieve", "params": {{ "query": "subject:Invoice" }} }}]}}
9. "Delete all emails from 'spam@example.com'"
   → {{"data": [
        {{ "command": "retrieve", "params": {{ "query": "from:spam@example.com" }} }},
        {{ "command": "delete", "params": {{ "emailId": "<emailId>" }} }}
      ]}}
10. "Can you process and tell me what this email is about, email ID 23456"
   → {{"data": [{{ "command": "process", "params": {{ "emailId": "23456" }} }}]}}

User Input: "{user_input}"

Map this user input to the corresponding action(s) and return the result as an array of commands using only the valid commands listed above. No explanation, just the array."#
    )
}

/// Prompt asking for a summary of a thread's digests
pub fn summarize(digests: &[String]) -> String {
    format!(
        "Please summarize the following email thread data:\n\n{}",
        digests.join("\n")
    )
}

/// Prompt asking for a JSON reply to a summarized email
pub fn reply(email_details: &str, instructions: &str) -> String {
    let instructions = if instructions.trim().is_empty() {
        String::new()
    } else {
        format!("\nThe sender of the reply wants it to say: {instructions}\n")
    };

    format!(
        r#"Please generate a response to the following email. The response should follow this JSON format:
{{
    "message": "The content of the AI-generated response.",
    "metadata": {{
        "tone": "friendly",
        "summary": "A short summary of the reply or message."
    }},
    "attachments": [
        {{
            "filename": "example.jpg",
            "mimeType": "image/jpeg",
            "url": "http://example.com/path/to/image.jpg"
        }}
    ]
}}
{instructions}
Original Email:
{email_details}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_map_embeds_input() {
        let prompt = command_map("archive email 42");
        assert!(prompt.contains(r#"User Input: "archive email 42""#));
        assert!(prompt.contains(r#""mark_unread""#));
    }

    #[test]
    fn test_summarize_joins_digests() {
        let prompt = summarize(&["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
        assert_eq!(
            prompt,
            "Please summarize the following email thread data:\n\n{\"a\":1}\n{\"b\":2}"
        );
    }

    #[test]
    fn test_reply_prompt() {
        let prompt = reply("Lunch on Friday?", "Say yes");
        assert!(prompt.ends_with("Original Email:\nLunch on Friday?"));
        assert!(prompt.contains("it to say: Say yes"));
        assert!(!reply("x", "  ").contains("it to say"));
    }
}
