use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::models::{Id, Movie, SearchCategory, User};
use crate::pagination::{paginate, Find, GroupCount, Page, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, Query, Sort, Window};
use crate::repo::Bucket;

use super::{message, path_id, AppState};

/// Genres reported in the statistics.
const TRENDING_GENRES: u64 = 5;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/admin/reviews/{movie_id}/{review_id}").route(web::delete().to(delete_review)))
        .service(web::resource("/admin/statistics").route(web::get().to(statistics)));
}

/// Remove any review by id and forget the matching rating on its author.
#[utoipa::path(delete, path = "/api/admin/reviews/{movie_id}/{review_id}",
    params(("movie_id" = String, Path, description = "Movie id"), ("review_id" = String, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Movie or review not found")
    ),
    security(("bearer" = [])))]
pub async fn delete_review(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (movie_id, review_id) = path.into_inner();
    let movie_id = path_id(&movie_id)?;
    let mut movie = data.repo.movies().get(&movie_id).await?.ok_or_else(|| ApiError::not_found("Movie not found"))?;
    let review = movie.remove_review(&review_id)?;
    let movie = data.repo.movies().replace(movie).await?;

    if let Some(mut author) = data.repo.users().get(&review.user).await? {
        author.forget_rating(&movie.id);
        data.repo.users().replace(author).await?;
    }
    tracing::info!(movie = %movie.id, review = %review.id, "review removed by admin");
    Ok(message("Review deleted successfully"))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopularMovie {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub popularity_score: f64,
}

impl From<Movie> for PopularMovie {
    fn from(m: Movie) -> Self {
        PopularMovie { id: m.id, title: m.title, popularity_score: m.popularity_score }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActorSearches {
    pub name: String,
    pub searches: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for RecentUser {
    fn from(u: User) -> Self {
        RecentUser { id: u.id, username: u.username, email: u.email, updated_at: u.updated_at }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub most_popular_movies: Page<PopularMovie>,
    pub trending_genres: Vec<GenreCount>,
    pub most_searched_actors: Page<ActorSearches>,
    pub recent_users: Page<RecentUser>,
}

fn bucket_label(b: &Bucket) -> String {
    match b.key.as_str() {
        Some(s) => s.to_string(),
        None => b.key.to_string(),
    }
}

/// Site-wide statistics. `page`/`limit` apply to every paginated section;
/// trending genres are always the top five.
#[utoipa::path(get, path = "/api/admin/statistics", params(PageParams),
    responses(
        (status = 200, description = "`{mostPopularMovies, trendingGenres, mostSearchedActors, recentUsers}`"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer" = [])))]
pub async fn statistics(
    _admin: AdminUser,
    data: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let req = params.resolve(DEFAULT_LIMIT);

    let movies = Find::new(data.repo.movies(), Query::all().sorted(Sort::desc("popularityScore")));
    let most_popular_movies = paginate(&movies, req).await?.map(PopularMovie::from);

    let trending_genres = data
        .repo
        .movies()
        .group_count(&Filter::All, "genre", Window::first(TRENDING_GENRES))
        .await?
        .into_iter()
        .map(|b| GenreCount { genre: bucket_label(&b), count: b.count })
        .collect();

    let actor_searches = GroupCount {
        collection: data.repo.search_logs(),
        filter: Filter::eq("category", SearchCategory::Actor.as_str()),
        field: "searchQuery",
    };
    let most_searched_actors =
        paginate(&actor_searches, req).await?.map(|b| ActorSearches { name: bucket_label(&b), searches: b.count });

    let users = Find::new(data.repo.users(), Query::all().sorted(Sort::desc("updatedAt")));
    let recent_users = paginate(&users, req).await?.map(RecentUser::from);

    Ok(HttpResponse::Ok().json(Statistics { most_popular_movies, trending_genres, most_searched_actors, recent_users }))
}
