//! Gmail OAuth2 authentication
//!
//! Implements the OAuth2 web-server flow for the browser front end. The
//! token pair lives client-side in a cookie; every request verifies the
//! access token and refreshes it when Google no longer accepts it.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::GoogleCredentials;

/// Why a request could not be authorized
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No access token found")]
    MissingToken,
    #[error("Malformed access token")]
    MalformedToken,
    #[error("No refresh token available")]
    MissingRefreshToken,
    #[error("Failed to refresh token")]
    RefreshFailed,
}

impl AuthError {
    /// HTTP status to answer with
    pub fn status(&self) -> u16 {
        401
    }
}

/// Token pair as stored in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionToken {
    /// Parse the cookie value
    pub fn from_cookie(value: &str) -> Result<Self, AuthError> {
        serde_json::from_str(value).map_err(|_| AuthError::MalformedToken)
    }

    /// Serialize for the cookie value
    pub fn to_cookie(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize session token")
    }
}

/// Outcome of verifying a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Access token to call Gmail with
    pub access_token: String,
    /// Set when the token was refreshed and the cookie must be rewritten
    pub refreshed: Option<SessionToken>,
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<u64>,
}

/// OAuth2 configuration for Gmail
pub struct GmailAuth {
    credentials: GoogleCredentials,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    const TOKEN_INFO_URL: &'static str = "https://www.googleapis.com/oauth2/v1/tokeninfo";

    /// Full mailbox scope; permanent deletion is not allowed under narrower scopes
    const GMAIL_SCOPE: &'static str = "https://mail.google.com/";

    pub fn new(credentials: GoogleCredentials) -> Self {
        Self { credentials }
    }

    /// URL of Google's consent screen
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_uri),
            urlencoding::encode(Self::GMAIL_SCOPE),
        )
    }

    /// Exchange the authorization code from the callback for a token pair
    pub fn exchange_code(&self, code: &str) -> Result<SessionToken> {
        info!("Exchanging authorization code for tokens");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        Ok(SessionToken {
            token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    /// Verify the session token, refreshing the access token if needed
    pub fn verify_and_refresh(&self, session: Option<SessionToken>) -> Result<VerifiedToken, AuthError> {
        let session = session.ok_or(AuthError::MissingToken)?;

        if self.is_token_valid(&session.token) {
            return Ok(VerifiedToken {
                access_token: session.token,
                refreshed: None,
            });
        }

        let refresh_token = session.refresh_token.ok_or(AuthError::MissingRefreshToken)?;

        info!("Refreshing access token");
        let token = self.refresh_access_token(&refresh_token).map_err(|e| {
            error!("Failed to refresh access token: {:#}", e);
            AuthError::RefreshFailed
        })?;

        Ok(VerifiedToken {
            access_token: token.access_token.clone(),
            refreshed: Some(SessionToken {
                token: token.access_token,
                // Keep the same refresh token
                refresh_token: Some(refresh_token),
            }),
        })
    }

    /// Ask Google whether the access token is still accepted
    fn is_token_valid(&self, access_token: &str) -> bool {
        let url = format!(
            "{}?access_token={}",
            Self::TOKEN_INFO_URL,
            urlencoding::encode(access_token)
        );

        match ureq::get(&url).call() {
            Ok(_) => true,
            Err(ureq::Error::StatusCode(status)) => {
                info!("Access token rejected ({}), will refresh", status);
                false
            }
            Err(e) => {
                warn!("Error validating access token: {}", e);
                false
            }
        }
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let token: TokenResponse = response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")?;

        Ok(token)
    }
}
