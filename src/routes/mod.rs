use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::{json_error_handler, query_error_handler, ApiError};
use crate::mail::Mailer;
use crate::models::{parse_id, Id};
use crate::repo::Repo;

pub mod admin;
pub mod auth;
pub mod awards;
pub mod crew;
pub mod discussions;
pub mod lists;
pub mod movies;
pub mod news;
pub mod recommendations;
pub mod reviews;
pub mod subscriptions;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api")
                .configure(auth::config)
                .configure(users::config)
                .configure(movies::config)
                .configure(crew::config)
                .configure(reviews::config)
                .configure(recommendations::config)
                .configure(lists::config)
                .configure(subscriptions::config)
                .configure(news::config)
                .configure(discussions::config)
                .configure(admin::config),
        );
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse { message: text.to_string() })
}

/// Path segment that must be a well-formed id.
pub(crate) fn path_id(raw: &str) -> Result<Id, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::bad_request("Invalid id format"))
}

/// Resolve referenced documents, silently dropping ids that no longer exist.
pub(crate) async fn resolve_all<T: crate::repo::Document>(
    collection: &dyn crate::repo::Collection<T>,
    ids: &[Id],
) -> Result<Vec<T>, ApiError> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(doc) = collection.get(id).await? {
            out.push(doc);
        }
    }
    Ok(out)
}
