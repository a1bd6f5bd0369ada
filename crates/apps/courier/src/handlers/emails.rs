use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use log::error;
use mail::{EmailPage, MessageFilter, list_emails};
use serde::Deserialize;

use crate::session::{authorize, blocking};
use crate::state::AppState;

const DEFAULT_LABEL: &str = "inbox";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailsQuery {
    label: Option<String>,
    page_token: Option<String>,
}

/// Gmail label ID for a label query value
fn label_id(label: Option<&str>) -> String {
    label
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LABEL)
        .to_uppercase()
}

/// One page of a label's messages
///
/// Listing failures are logged and answered with an empty page.
async fn get_emails(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<EmailsQuery>,
) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let EmailsQuery { label, page_token } = query.into_inner();
    let filter = MessageFilter::Label(label_id(label.as_deref()));
    let mailbox = session.mailbox();

    let page = blocking(move || list_emails(mailbox.as_ref(), &filter, page_token.as_deref()))
        .await
        .unwrap_or_else(|e| {
            error!("Error retrieving emails: {:#}", e);
            EmailPage::default()
        });

    session.response(StatusCode::OK).json(page)
}

pub fn emails_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/emails").route(web::get().to(get_emails)));
}
