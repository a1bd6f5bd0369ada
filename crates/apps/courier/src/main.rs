//! Courier - Gmail backend with natural-language commands
//!
//! Serves the JSON API used by the browser front end and the OAuth login
//! flow. Gmail and LLM calls are blocking and run on actix's blocking pool.

use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use log::{error, info, warn};
use mail::AppConfig;

mod handlers;
mod session;
mod state;

use handlers::{
    attachment::attachment_config, auth::auth_config, email::email_config,
    emails::emails_config, gmail::gmail_config,
};
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let app_config = match AppConfig::load() {
        Ok(app_config) => app_config,
        Err(e) => {
            if let Some(path) = AppConfig::default_config_path() {
                warn!(
                    "To configure Courier, either:\n\
                     1. Place a settings file at: {}\n\
                     2. Or set CLIENT_ID, CLIENT_SECRET, REDIRECT_URI and MISTRAL_API_KEY",
                    path.display()
                );
            }
            return Err(e);
        }
    };

    let bind_address = (
        app_config.server.bind_address.clone(),
        app_config.server.port,
    );
    let state = web::Data::new(AppState::new(app_config));

    info!("Listening on {}:{}", bind_address.0, bind_address.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(web::scope("/auth").configure(auth_config))
            .service(
                web::scope("/api")
                    .configure(emails_config)
                    .configure(email_config)
                    .configure(attachment_config)
                    .configure(gmail_config),
            )
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
