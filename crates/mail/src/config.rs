//! Configuration loading for the Courier backend
//!
//! Supports loading settings from (in order of priority):
//! 1. JSON file (~/.config/courier/courier.json)
//! 2. Runtime environment variables (a `.env` file is read by the binary)
//!
//! Google client credentials may also come from a Google Cloud Console
//! credential file named by `GOOGLE_CREDENTIALS_FILE`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Settings filename in the Courier config directory
const CONFIG_FILE: &str = "courier.json";

const DEFAULT_MODEL: &str = "ministral-8b-latest";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// OAuth client for the Gmail API
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<ConsoleCredentials>,
    web: Option<ConsoleCredentials>,
}

#[derive(Deserialize)]
struct ConsoleCredentials {
    client_id: String,
    client_secret: String,
}

impl GoogleCredentials {
    /// Parse a Google Cloud Console credential file
    ///
    /// The console file carries no redirect URI of ours, so it is passed in.
    pub fn from_console_json(json: &str, redirect_uri: impl Into<String>) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;

        // Support both "web" and "installed" credential types
        let console = creds
            .web
            .or(creds.installed)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: console.client_id,
            client_secret: console.client_secret,
            redirect_uri: redirect_uri.into(),
        })
    }
}

/// LLM provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct MistralConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Mark the session cookie `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            secure_cookies: false,
        }
    }
}

/// Complete backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub google: GoogleCredentials,
    pub mistral: MistralConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from the config file if present, else the environment
    pub fn load() -> Result<Self> {
        if config::config_exists(CONFIG_FILE) {
            return config::load_json(CONFIG_FILE);
        }
        Self::from_env()
    }

    /// Load configuration from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Default location of the config file
    pub fn default_config_path() -> Option<std::path::PathBuf> {
        config::config_path(CONFIG_FILE)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{} environment variable not set", key))
        };

        let redirect_uri = require("REDIRECT_URI")?;
        let google = match lookup("GOOGLE_CREDENTIALS_FILE") {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read credentials file: {}", path))?;
                GoogleCredentials::from_console_json(&json, redirect_uri)?
            }
            None => GoogleCredentials {
                client_id: require("CLIENT_ID")?,
                client_secret: require("CLIENT_SECRET")?,
                redirect_uri,
            },
        };

        let mistral = MistralConfig {
            api_key: require("MISTRAL_API_KEY")?,
            model: lookup("MISTRAL_MODEL").unwrap_or_else(default_model),
        };

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?,
            None => DEFAULT_PORT,
        };

        let server = ServerConfig {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(default_bind_address),
            port,
            secure_cookies: lookup("SECURE_COOKIES").is_some_and(|v| v == "true" || v == "1"),
        };

        Ok(Self {
            google,
            mistral,
            server,
        })
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CLIENT_ID", "id"),
        ("CLIENT_SECRET", "secret"),
        ("REDIRECT_URI", "http://localhost:3000/auth/callback"),
        ("MISTRAL_API_KEY", "key"),
    ];

    #[test]
    fn test_env_defaults() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.google.client_id, "id");
        assert_eq!(config.mistral.model, "ministral-8b-latest");
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(!config.server.secure_cookies);
    }

    #[test]
    fn test_env_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("PORT", "8080"), ("SECURE_COOKIES", "true"), ("MISTRAL_MODEL", "mistral-small")]);

        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.secure_cookies);
        assert_eq!(config.mistral.model, "mistral-small");
    }

    #[test]
    fn test_env_missing_key() {
        let err = AppConfig::from_lookup(lookup(&REQUIRED[..3])).unwrap_err();
        assert!(err.to_string().contains("MISTRAL_API_KEY"));
    }

    #[test]
    fn test_env_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.json");
        std::fs::write(
            &path,
            r#"{
                "google": {
                    "client_id": "file-id",
                    "client_secret": "file-secret",
                    "redirect_uri": "https://mail.example.com/auth/callback"
                },
                "mistral": { "api_key": "k" },
                "server": { "port": 9000 }
            }"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.google.client_id, "file-id");
        assert_eq!(config.mistral.model, "ministral-8b-latest");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_parse_installed_credentials() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let creds = GoogleCredentials::from_console_json(json, "http://localhost/cb").unwrap();
        assert_eq!(creds.client_id, "test-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
        assert_eq!(creds.redirect_uri, "http://localhost/cb");
    }

    #[test]
    fn test_parse_web_credentials() {
        let json = r#"{
            "web": {
                "client_id": "web-client-id.apps.googleusercontent.com",
                "client_secret": "web-secret"
            }
        }"#;

        let creds = GoogleCredentials::from_console_json(json, "http://localhost/cb").unwrap();
        assert_eq!(creds.client_id, "web-client-id.apps.googleusercontent.com");
    }

    #[test]
    fn test_invalid_credentials_json() {
        let json = r#"{ "other": {} }"#;
        assert!(GoogleCredentials::from_console_json(json, "x").is_err());
    }
}
