use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use log::error;
use mail::{Mailbox, MessageId, ThreadMessage, ThreadNotFound, get_thread_view};
use serde::Deserialize;
use serde_json::json;

use crate::session::{authorize, blocking};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailQuery {
    message_id: Option<String>,
}

/// Load the thread view, mapping failures to a status and message
async fn load_thread(
    mailbox: Arc<dyn Mailbox>,
    message_id: MessageId,
) -> Result<Vec<ThreadMessage>, (StatusCode, &'static str)> {
    blocking(move || get_thread_view(mailbox.as_ref(), &message_id))
        .await
        .map_err(|e| {
            if e.downcast_ref::<ThreadNotFound>().is_some() {
                (StatusCode::NOT_FOUND, "No thread found")
            } else {
                error!("Error fetching thread: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch thread")
            }
        })
}

/// Every message of the thread containing `messageId`
async fn get_email(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let Some(message_id) = query.into_inner().message_id.filter(|id| !id.is_empty()) else {
        return session.error(StatusCode::BAD_REQUEST, "Message ID is required");
    };

    match load_thread(session.mailbox(), MessageId::new(message_id)).await {
        Ok(thread) => session.response(StatusCode::OK).json(json!({ "thread": thread })),
        Err((status, message)) => session.error(status, message),
    }
}

pub fn email_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/email").route(web::get().to(get_email)));
}
