use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, web};
use log::{error, info, warn};
use serde::Deserialize;

use crate::session::{blocking, error_response, session_cookie};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

async fn login(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, state.auth.authorization_url()))
        .finish()
}

async fn callback(state: web::Data<AppState>, query: web::Query<CallbackQuery>) -> HttpResponse {
    let CallbackQuery { code, error } = query.into_inner();

    if let Some(reason) = error {
        warn!("Authorization denied: {}", reason);
        return error_response(StatusCode::BAD_REQUEST, &format!("Authorization denied: {}", reason));
    }
    let Some(code) = code.filter(|c| !c.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing authorization code");
    };

    let auth_state = state.clone();
    let token = match blocking(move || auth_state.auth.exchange_code(&code)).await {
        Ok(token) => token,
        Err(e) => {
            error!("OAuth callback failed: {:#}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to exchange authorization code",
            );
        }
    };

    match session_cookie(&token, state.secure_cookies) {
        Ok(cookie) => {
            info!("Signed in, session cookie set");
            HttpResponse::Found()
                .insert_header((header::LOCATION, "/"))
                .cookie(cookie)
                .finish()
        }
        Err(e) => {
            error!("Failed to build session cookie: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store session")
        }
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/login").route(web::get().to(login)))
        .service(web::resource("/callback").route(web::get().to(callback)));
}
