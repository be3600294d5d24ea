use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Id, Movie, Review, ReviewError, ReviewInput};
use crate::pagination::{paginate, PageParams, Slice, DEFAULT_LIMIT};
use crate::query::Window;

use super::{message, path_id, AppState};

/// Page size used by the highlights endpoint when none is given.
pub const HIGHLIGHTS_LIMIT: u64 = 3;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reviews/{movie_id}")
            .route(web::get().to(list_reviews))
            .route(web::post().to(add_review))
            .route(web::put().to(update_review))
            .route(web::delete().to(delete_review)),
    )
    .service(web::resource("/reviews/{movie_id}/highlights").route(web::get().to(highlights)));
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::AlreadyReviewed => ApiError::BadRequest(e.to_string()),
            ReviewError::NotFound => ApiError::NotFound(e.to_string()),
        }
    }
}

async fn find_movie(data: &AppState, raw_id: &str) -> Result<Movie, ApiError> {
    let id = path_id(raw_id)?;
    data.repo.movies().get(&id).await?.ok_or_else(|| ApiError::not_found("Movie not found"))
}

/// Mirror the caller's rating into their user document.
async fn sync_user_rating(data: &AppState, user_id: &str, movie_id: &str, rating: Option<u8>) -> Result<(), ApiError> {
    let Some(mut user) = data.repo.users().get(user_id).await? else { return Ok(()) };
    match rating {
        Some(r) => user.record_rating(movie_id, r),
        None => user.forget_rating(movie_id),
    }
    data.repo.users().replace(user).await?;
    Ok(())
}

#[utoipa::path(post, path = "/api/reviews/{movie_id}", request_body = ReviewInput,
    params(("movie_id" = String, Path, description = "Movie id")),
    responses(
        (status = 201, description = "Movie with the new review", body = Movie),
        (status = 400, description = "Invalid rating/text or already reviewed"),
        (status = 404, description = "Movie not found")
    ),
    security(("bearer" = [])))]
pub async fn add_review(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    input.validate()?;
    let rating = input.rating;
    let mut movie = find_movie(&data, &path).await?;
    movie.add_review(&user.user_id, input)?;
    let movie = data.repo.movies().replace(movie).await?;
    sync_user_rating(&data, &user.user_id, &movie.id, Some(rating)).await?;
    Ok(HttpResponse::Created().json(movie))
}

#[utoipa::path(put, path = "/api/reviews/{movie_id}", request_body = ReviewInput,
    params(("movie_id" = String, Path, description = "Movie id")),
    responses((status = 200, body = Movie), (status = 404, description = "Movie or review not found")),
    security(("bearer" = [])))]
pub async fn update_review(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    input.validate()?;
    let rating = input.rating;
    let mut movie = find_movie(&data, &path).await?;
    movie.update_review(&user.user_id, input)?;
    let movie = data.repo.movies().replace(movie).await?;
    sync_user_rating(&data, &user.user_id, &movie.id, Some(rating)).await?;
    Ok(HttpResponse::Ok().json(movie))
}

#[utoipa::path(delete, path = "/api/reviews/{movie_id}",
    params(("movie_id" = String, Path, description = "Movie id")),
    responses((status = 200, description = "Review deleted"), (status = 404, description = "Movie or review not found")),
    security(("bearer" = [])))]
pub async fn delete_review(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut movie = find_movie(&data, &path).await?;
    movie.remove_review_by(&user.user_id)?;
    let movie = data.repo.movies().replace(movie).await?;
    sync_user_rating(&data, &user.user_id, &movie.id, None).await?;
    Ok(message("Review deleted successfully"))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Reviewer {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(rename = "_id")]
    pub id: Id,
    pub user: Reviewer,
    pub rating: u8,
    pub review_text: String,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[utoipa::path(get, path = "/api/reviews/{movie_id}",
    params(("movie_id" = String, Path, description = "Movie id"), PageParams),
    responses((status = 200, description = "Paginated reviews with reviewer usernames"), (status = 404, description = "Movie not found")))]
pub async fn list_reviews(
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let movie = find_movie(&data, &path).await?;
    let page = paginate(&Slice(movie.reviews), params.resolve(DEFAULT_LIMIT)).await?;

    let mut names: HashMap<Id, Option<String>> = HashMap::new();
    for review in &page.data {
        if !names.contains_key(&review.user) {
            let name = data.repo.users().get(&review.user).await?.map(|u| u.username);
            names.insert(review.user.clone(), name);
        }
    }
    let page = page.map(|r: Review| ReviewView {
        user: Reviewer { username: names.get(&r.user).cloned().flatten(), id: r.user },
        id: r.id,
        rating: r.rating,
        review_text: r.review_text,
        created_at: r.created_at,
        updated_at: r.updated_at,
    });
    Ok(HttpResponse::Ok().json(page))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub top_rated: Vec<Review>,
    pub most_discussed: Vec<Review>,
    pub page: u64,
    pub limit: u64,
}

/// Two views over the same reviews, each sorted and windowed on its own.
#[utoipa::path(get, path = "/api/reviews/{movie_id}/highlights",
    params(("movie_id" = String, Path, description = "Movie id"), PageParams),
    responses((status = 200, body = Highlights), (status = 404, description = "Movie not found")))]
pub async fn highlights(
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let movie = find_movie(&data, &path).await?;
    let req = params.resolve(HIGHLIGHTS_LIMIT);
    let window = Window::new(req.skip(), req.limit);

    let mut top_rated = movie.reviews.clone();
    top_rated.sort_by(|a, b| b.rating.cmp(&a.rating));
    let mut most_discussed = movie.reviews;
    most_discussed.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(HttpResponse::Ok().json(Highlights {
        top_rated: window.apply(top_rated),
        most_discussed: window.apply(most_discussed),
        page: req.page,
        limit: req.limit,
    }))
}
