use actix_web::{web, HttpResponse};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::pagination::{paginate, Find, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, FilterBuilder, Query, Sort, Window};

use super::{path_id, AppState};

/// How many watched movies feed the genre preferences.
const RECENT_WATCHED: u64 = 5;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommendations/user").route(web::get().to(for_user)))
        .service(web::resource("/recommendations/similar/{movie_id}").route(web::get().to(similar)))
        .service(web::resource("/recommendations/trending").route(web::get().to(trending)))
        .service(web::resource("/recommendations/top-rated").route(web::get().to(top_rated)));
}

async fn page_of(data: &AppState, query: Query, params: &PageParams) -> Result<HttpResponse, ApiError> {
    let page = paginate(&Find::new(data.repo.movies(), query), params.resolve(DEFAULT_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Unwatched movies in the caller's favorite genres or in the genres of
/// their most recently added watched movies.
#[utoipa::path(get, path = "/api/recommendations/user", params(PageParams),
    responses((status = 200, description = "Paginated recommendations")),
    security(("bearer" = [])))]
pub async fn for_user(
    user: AuthUser,
    data: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let user = data.repo.users().get(&user.user_id).await?.ok_or_else(|| ApiError::not_found("User not found"))?;

    let recent = data
        .repo
        .movies()
        .find(
            &Query::filter(Filter::is_in("_id", user.watched_movies.iter().map(String::as_str)))
                .sorted(Sort::desc("createdAt")),
            Window::first(RECENT_WATCHED),
        )
        .await?;

    let mut genres = user.favorite_genres.clone();
    for genre in recent.iter().flat_map(|m| m.genre.iter()) {
        if !genres.contains(genre) {
            genres.push(genre.clone());
        }
    }

    let filter = FilterBuilder::new()
        .and(Filter::is_in("genre", genres))
        .and(Filter::not_in("_id", user.watched_movies))
        .build();
    let query = Query::filter(filter).sorted(Sort::desc("popularityScore").then_desc("averageRating"));
    page_of(&data, query, &params).await
}

#[utoipa::path(get, path = "/api/recommendations/similar/{movie_id}",
    params(("movie_id" = String, Path, description = "Movie id"), PageParams),
    responses((status = 200, description = "Movies sharing a genre or the director"), (status = 404, description = "Movie not found")))]
pub async fn similar(
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    let movie = data.repo.movies().get(&id).await?.ok_or_else(|| ApiError::not_found("Movie not found"))?;
    let filter = FilterBuilder::new()
        .and(Filter::ne("_id", movie.id.as_str()))
        .and(Filter::Or(vec![
            Filter::is_in("genre", movie.genre),
            Filter::eq("director", movie.director),
        ]))
        .build();
    page_of(&data, Query::filter(filter), &params).await
}

#[utoipa::path(get, path = "/api/recommendations/trending", params(PageParams),
    responses((status = 200, description = "Movies by popularity")))]
pub async fn trending(data: web::Data<AppState>, params: web::Query<PageParams>) -> Result<HttpResponse, ApiError> {
    page_of(&data, Query::all().sorted(Sort::desc("popularityScore")), &params).await
}

#[utoipa::path(get, path = "/api/recommendations/top-rated", params(PageParams),
    responses((status = 200, description = "Movies by average rating")))]
pub async fn top_rated(data: web::Data<AppState>, params: web::Query<PageParams>) -> Result<HttpResponse, ApiError> {
    page_of(&data, Query::all().sorted(Sort::desc("averageRating")), &params).await
}
