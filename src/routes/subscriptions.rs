use std::collections::HashSet;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::mail::{self, MailMessage};
use crate::models::{parse_id, Id, Movie, NewSubscription, NotificationType, Subscription};
use crate::query::{Filter, FilterBuilder, Query, Sort, Window};

use super::{path_id, AppState};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/subscriptions")
            .route(web::get().to(list_subscriptions))
            .route(web::post().to(create_subscription)),
    )
    .service(web::resource("/subscriptions/notify/{movie_id}").route(web::post().to(notify_subscribers)));
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedSubscription {
    pub message: String,
    pub subscription: Subscription,
}

/// Subscription with its movie resolved (null when it targets a genre or
/// the movie is gone).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(rename = "_id")]
    pub id: Id,
    pub movie: Option<Movie>,
    pub genre: Option<String>,
    pub notification_type: NotificationType,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionList {
    pub subscriptions: Vec<SubscriptionView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotifyResponse {
    pub message: String,
    /// Number of messages handed to the mailer.
    pub queued: usize,
}

#[utoipa::path(post, path = "/api/subscriptions", request_body = NewSubscription,
    responses((status = 201, body = CreatedSubscription), (status = 400, description = "Neither movieId nor genre given")),
    security(("bearer" = [])))]
pub async fn create_subscription(
    user: AuthUser,
    data: web::Data<AppState>,
    payload: web::Json<NewSubscription>,
) -> Result<HttpResponse, ApiError> {
    let mut input = payload.into_inner();
    if let Some(raw) = input.movie_id.take() {
        input.movie_id = Some(parse_id(&raw).ok_or_else(|| ApiError::bad_request("Invalid movie ID format"))?);
    }
    let subscription = data.repo.subscriptions().insert(input.into_subscription(&user.user_id)?).await?;
    Ok(HttpResponse::Created().json(CreatedSubscription {
        message: "Subscription created successfully".into(),
        subscription,
    }))
}

#[utoipa::path(get, path = "/api/subscriptions",
    responses((status = 200, body = SubscriptionList)),
    security(("bearer" = [])))]
pub async fn list_subscriptions(user: AuthUser, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let query = Query::filter(Filter::eq("user", user.user_id)).sorted(Sort::desc("createdAt"));
    let subs = data.repo.subscriptions().find(&query, Window::default()).await?;

    let mut subscriptions = Vec::with_capacity(subs.len());
    for s in subs {
        let movie = match &s.movie {
            Some(id) => data.repo.movies().get(id).await?,
            None => None,
        };
        subscriptions.push(SubscriptionView {
            id: s.id,
            movie,
            genre: s.genre,
            notification_type: s.notification_type,
            created_at: s.created_at,
        });
    }
    Ok(HttpResponse::Ok().json(SubscriptionList { subscriptions }))
}

fn release_notice(to: String, movie: &Movie) -> MailMessage {
    let when = movie
        .release_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "a date to be announced".to_string());
    MailMessage {
        to,
        subject: format!("Reminder: {} is releasing soon!", movie.title),
        text: format!(
            "Dear user,\n\nDon't miss the release of \"{}\" on {}. Stay tuned for more updates!",
            movie.title, when
        ),
    }
}

/// Email every subscriber of the movie or one of its genres. Sending happens
/// in the background; the response only reports how many were queued.
#[utoipa::path(post, path = "/api/subscriptions/notify/{movie_id}",
    params(("movie_id" = String, Path, description = "Movie id")),
    responses((status = 200, body = NotifyResponse), (status = 404, description = "Movie not found")),
    security(("bearer" = [])))]
pub async fn notify_subscribers(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    let movie = data.repo.movies().get(&id).await?.ok_or_else(|| ApiError::not_found("Movie not found"))?;

    let filter = FilterBuilder::new()
        .and(Filter::Or(vec![
            Filter::eq("movie", movie.id.as_str()),
            Filter::is_in("genre", movie.genre.iter().map(String::as_str)),
        ]))
        .and(Filter::eq("notificationType", "email"))
        .build();
    let subs = data.repo.subscriptions().find(&Query::filter(filter), Window::default()).await?;

    let mut seen = HashSet::new();
    let mut messages = Vec::new();
    for sub in subs {
        if !seen.insert(sub.user.clone()) {
            continue;
        }
        match data.repo.users().get(&sub.user).await? {
            Some(user) => messages.push(release_notice(user.email, &movie)),
            None => tracing::warn!(user = %sub.user, "subscription owner no longer exists"),
        }
    }

    let queued = messages.len();
    tracing::info!(movie = %movie.id, queued, "notifying subscribers");
    mail::dispatch(data.mailer.clone(), messages);
    Ok(HttpResponse::Ok().json(NotifyResponse { message: "Notifications queued".into(), queued }))
}
