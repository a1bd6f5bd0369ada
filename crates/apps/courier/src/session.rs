//! Cookie-carried OAuth session
//!
//! Every API request verifies the token pair in the `google_access_token`
//! cookie, refreshing the access token when Google rejects it. A refreshed
//! pair is written back on the response.

use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use anyhow::anyhow;
use log::{error, warn};
use mail::{GmailClient, Mailbox, SessionToken};
use serde_json::json;

use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "google_access_token";

/// Session cookie lifetime
const COOKIE_MAX_AGE_DAYS: i64 = 7;

/// A request whose Gmail access token has been verified
pub struct AuthorizedSession {
    mailbox: Arc<dyn Mailbox>,
    refreshed: Option<SessionToken>,
    secure_cookies: bool,
}

impl AuthorizedSession {
    pub fn mailbox(&self) -> Arc<dyn Mailbox> {
        self.mailbox.clone()
    }

    /// Start a response, rewriting the cookie if the token was refreshed
    pub fn response(&self, status: StatusCode) -> HttpResponseBuilder {
        let mut builder = HttpResponse::build(status);
        if let Some(token) = &self.refreshed {
            match session_cookie(token, self.secure_cookies) {
                Ok(cookie) => {
                    builder.cookie(cookie);
                }
                Err(e) => error!("Failed to write refreshed session cookie: {:#}", e),
            }
        }
        builder
    }

    /// JSON error body `{"error": message}`, keeping any refreshed cookie
    pub fn error(&self, status: StatusCode, message: &str) -> HttpResponse {
        self.response(status).json(json!({ "error": message }))
    }
}

/// Verify the request's session cookie
///
/// On failure returns the response to send: 401 with the auth error.
pub async fn authorize(
    req: &HttpRequest,
    state: &web::Data<AppState>,
) -> Result<AuthorizedSession, HttpResponse> {
    let token = match req.cookie(TOKEN_COOKIE) {
        Some(cookie) => match SessionToken::from_cookie(cookie.value()) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Rejecting request with unreadable session cookie");
                return Err(error_response(StatusCode::UNAUTHORIZED, &e.to_string()));
            }
        },
        None => None,
    };

    let auth_state = state.clone();
    let verified = blocking(move || Ok(auth_state.auth.verify_and_refresh(token)))
        .await
        .map_err(|e| {
            error!("Token verification failed to run: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?
        .map_err(|e| {
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::UNAUTHORIZED);
            error_response(status, &e.to_string())
        })?;

    Ok(AuthorizedSession {
        mailbox: Arc::new(GmailClient::new(verified.access_token)),
        refreshed: verified.refreshed,
        secure_cookies: state.secure_cookies,
    })
}

/// Build the session cookie for a token pair
pub fn session_cookie(token: &SessionToken, secure: bool) -> anyhow::Result<Cookie<'static>> {
    Ok(Cookie::build(TOKEN_COOKIE, token.to_cookie()?)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
        .finish())
}

/// JSON error body `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message }))
}

/// Run blocking provider calls off the async workers
pub async fn blocking<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match web::block(f).await {
        Ok(result) => result,
        Err(e) => Err(anyhow!("Blocking task failed: {}", e)),
    }
}
