use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use log::{error, info};
use mail::ActionHandler;
use serde::Deserialize;
use serde_json::json;

use crate::session::{authorize, blocking};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandRequest {
    #[serde(default)]
    user_command: String,
}

/// Map a natural-language request to mailbox commands and run them
async fn run_command(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CommandRequest>,
) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let user_command = body.into_inner().user_command;
    info!("Running user command ({} chars)", user_command.len());

    let handler = ActionHandler::new(session.mailbox(), state.model.clone());
    match blocking(move || handler.run(&user_command)).await {
        Ok(results) => session.response(StatusCode::OK).json(json!({
            "message": "Commands executed successfully.",
            "results": results,
        })),
        Err(e) => {
            error!("Failed to process command: {:#}", e);
            session.response(StatusCode::INTERNAL_SERVER_ERROR).json(json!({
                "error": "Failed to process command.",
                "details": format!("{:#}", e),
            }))
        }
    }
}

pub fn gmail_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/gmail").route(web::post().to(run_command)));
}
