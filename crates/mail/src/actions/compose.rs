/// Build an RFC 822 message from headers and a plain-text body
///
/// Line breaks inside header values are replaced with spaces so a value
/// cannot start a new header.
pub fn compose_message(headers: &[(&str, &str)], body: &str) -> String {
    let mut message = String::new();
    for (name, value) in headers {
        message.push_str(name);
        message.push_str(": ");
        message.push_str(&value.replace(|c: char| c == '\r' || c == '\n', " "));
        message.push_str("\r\n");
    }
    message.push_str("\r\n");
    message.push_str(body);
    message
}
