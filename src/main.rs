use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use anyhow::Context;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use moviedb::config::Config;
use moviedb::openapi::ApiDoc;
use moviedb::{config, mail, repo, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; deployments set the environment themselves.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let settings = Arc::new(Config::from_env().context("invalid configuration")?);
    info!("Bootstrapping movie database API");

    let repo = repo::open(&settings).await.context("failed to open the repository")?;
    let mailer = mail::from_config(&settings.mail).context("invalid mail settings")?;
    info!(smtp = ?settings.mail.smtp.as_ref().map(|s| &s.host), "mailer configured");

    let state = AppState { repo, mailer, config: settings.clone() };
    let openapi = ApiDoc::openapi();

    let origins = settings.cors_origins.clone();
    let server = HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |c, origin| c.allowed_origin(origin))
            .allow_any_header()
            .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .configure(config)
            .service(SwaggerUi::new("/api-docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            .app_data(web::Data::new(state.clone()))
    })
    .bind((settings.host.as_str(), settings.port))?;

    info!("Listening on http://{}:{}", settings.host, settings.port);
    server.run().await?;
    Ok(())
}
