use std::sync::Arc;

use mail::{AppConfig, GmailAuth, LanguageModel, MistralClient};

/// Shared by every request handler
pub struct AppState {
    pub auth: GmailAuth,
    pub model: Arc<dyn LanguageModel>,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            auth: GmailAuth::new(config.google),
            model: Arc::new(MistralClient::new(&config.mistral)),
            secure_cookies: config.server.secure_cookies,
        }
    }
}
