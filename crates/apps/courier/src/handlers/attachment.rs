use std::sync::Arc;

use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use log::error;
use mail::{Mailbox, MessageId, fetch_attachment};
use serde::Deserialize;

use crate::session::{authorize, blocking};
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentQuery {
    message_id: Option<String>,
    attachment_id: Option<String>,
    mime_type: Option<String>,
}

/// `Content-Type` for the requested MIME type; unusable values fall back to binary
fn content_type(mime_type: Option<&str>) -> HeaderValue {
    mime_type
        .filter(|m| !m.is_empty())
        .and_then(|m| HeaderValue::from_str(m).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE))
}

async fn load_attachment(
    mailbox: Arc<dyn Mailbox>,
    message_id: MessageId,
    attachment_id: String,
) -> Result<Vec<u8>, (StatusCode, &'static str)> {
    match blocking(move || fetch_attachment(mailbox.as_ref(), &message_id, &attachment_id)).await {
        Ok(Some(bytes)) => Ok(bytes),
        Ok(None) => Err((StatusCode::NOT_FOUND, "No attachment data found")),
        Err(e) => {
            error!("Error fetching attachment: {:#}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Error fetching attachment"))
        }
    }
}

/// Raw attachment bytes, used for downloads and inline images
async fn get_attachment(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<AttachmentQuery>,
) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let AttachmentQuery {
        message_id,
        attachment_id,
        mime_type,
    } = query.into_inner();

    let (Some(message_id), Some(attachment_id)) = (
        message_id.filter(|id| !id.is_empty()),
        attachment_id.filter(|id| !id.is_empty()),
    ) else {
        return session.error(StatusCode::BAD_REQUEST, "Missing messageId or attachmentId");
    };

    match load_attachment(session.mailbox(), MessageId::new(message_id), attachment_id).await {
        Ok(bytes) => session
            .response(StatusCode::OK)
            .insert_header((header::CONTENT_TYPE, content_type(mime_type.as_deref())))
            .body(bytes),
        Err((status, message)) => session.error(status, message),
    }
}

pub fn attachment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/attachment").route(web::get().to(get_attachment)));
}
