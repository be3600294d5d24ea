use actix_web::{web, HttpResponse};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::models::{Award, AwardUpdate, BoxOffice, BoxOfficeUpdate, Crew, CrewRole, Movie, MovieUpdate, NewAward, NewMovie, SearchCategory, SearchLog};
use crate::pagination::{paginate, Find, Page, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, FilterBuilder, Query, Sort, Window};

use super::{awards, message, path_id, AppState};

pub fn config(cfg: &mut web::ServiceConfig) {
    // static segments first so they are not captured by `/movies/{id}`
    cfg.service(web::resource("/movies").route(web::get().to(list_movies)).route(web::post().to(create_movie)))
        .service(web::resource("/movies/search").route(web::get().to(search_movies)))
        .service(web::resource("/movies/filter/rating").route(web::get().to(filter_by_rating)))
        .service(web::resource("/movies/filter/popularity").route(web::get().to(filter_by_popularity)))
        .service(web::resource("/movies/filter/release-year").route(web::get().to(filter_by_release_year)))
        .service(web::resource("/movies/advanced-filter").route(web::get().to(advanced_filter)))
        .service(web::resource("/movies/top/genre/{genre}").route(web::get().to(top_by_genre)))
        .service(web::resource("/movies/top/month").route(web::get().to(top_of_month)))
        .service(web::resource("/movies/upcoming").route(web::get().to(upcoming)))
        .service(
            web::resource("/movies/{id}")
                .route(web::get().to(get_movie))
                .route(web::put().to(update_movie))
                .route(web::delete().to(delete_movie)),
        )
        .service(web::resource("/movies/{id}/box-office").route(web::put().to(update_box_office)))
        .service(web::resource("/movies/{id}/details").route(web::get().to(movie_details)))
        .service(web::resource("/movies/{id}/awards").route(web::post().to(add_award)))
        .service(
            web::resource("/movies/{id}/awards/{award_id}")
                .route(web::put().to(update_award))
                .route(web::delete().to(delete_award)),
        );
}

async fn find_movie(data: &AppState, raw_id: &str) -> Result<Movie, ApiError> {
    let id = path_id(raw_id)?;
    data.repo.movies().get(&id).await?.ok_or_else(|| ApiError::not_found("Movie not found"))
}

async fn page_of(data: &AppState, query: Query, params: &PageParams) -> Result<HttpResponse, ApiError> {
    let page = paginate(&Find::new(data.repo.movies(), query), params.resolve(DEFAULT_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Inclusive `YYYY-MM-DD` bounds covering whole calendar years.
fn year_span(first: i32, last: i32) -> Filter {
    Filter::range("releaseDate", Some(format!("{first:04}-01-01")), Some(format!("{last:04}-12-31")))
}

#[utoipa::path(get, path = "/api/movies", params(PageParams),
    responses((status = 200, description = "Paginated movies")))]
pub async fn list_movies(data: web::Data<AppState>, params: web::Query<PageParams>) -> Result<HttpResponse, ApiError> {
    page_of(&data, Query::all(), &params).await
}

#[utoipa::path(get, path = "/api/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, body = Movie), (status = 404, description = "Movie not found")))]
pub async fn get_movie(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(find_movie(&data, &path).await?))
}

#[utoipa::path(post, path = "/api/movies", request_body = NewMovie,
    responses(
        (status = 201, body = Movie),
        (status = 400, description = "Invalid input or duplicate title"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer" = [])))]
pub async fn create_movie(
    _admin: AdminUser,
    data: web::Data<AppState>,
    payload: web::Json<NewMovie>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner();
    if data.repo.movies().find_one(&Filter::eq("title", new.title.as_str())).await?.is_some() {
        return Err(ApiError::bad_request("Movie with this title already exists"));
    }
    let movie = data.repo.movies().insert(new.into_movie()?).await?;
    tracing::info!(movie = %movie.id, title = %movie.title, "movie created");
    Ok(HttpResponse::Created().json(movie))
}

#[utoipa::path(put, path = "/api/movies/{id}", request_body = MovieUpdate,
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, body = Movie), (status = 404, description = "Movie not found")),
    security(("bearer" = [])))]
pub async fn update_movie(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<MovieUpdate>,
) -> Result<HttpResponse, ApiError> {
    let mut movie = find_movie(&data, &path).await?;
    let upd = payload.into_inner();
    if let Some(title) = upd.title.as_deref() {
        let clash = FilterBuilder::new()
            .and(Filter::eq("title", title))
            .and(Filter::ne("_id", movie.id.as_str()))
            .build();
        if data.repo.movies().find_one(&clash).await?.is_some() {
            return Err(ApiError::bad_request("Movie with this title already exists"));
        }
    }
    upd.apply(&mut movie);
    Ok(HttpResponse::Ok().json(data.repo.movies().replace(movie).await?))
}

#[utoipa::path(delete, path = "/api/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, description = "Movie deleted"), (status = 404, description = "Movie not found")),
    security(("bearer" = [])))]
pub async fn delete_movie(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    data.repo.movies().delete(&id).await?.ok_or_else(|| ApiError::not_found("Movie not found"))?;
    Ok(message("Movie deleted successfully"))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// matched against title, genre, director and cast
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub movies: Page<Movie>,
    pub actors: Vec<Crew>,
}

/// Case-insensitive substring search. Queries that also match an actor's
/// name are recorded for the admin statistics.
#[utoipa::path(get, path = "/api/movies/search", params(SearchParams, PageParams),
    responses(
        (status = 200, description = "`{movies: Page<Movie>, actors: [Crew]}`"),
        (status = 400, description = "Missing query")
    ))]
pub async fn search_movies(
    caller: Option<AuthUser>,
    data: web::Data<AppState>,
    search: web::Query<SearchParams>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let q = search
        .query
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter is required"))?;

    let filter = Filter::Or(
        ["title", "genre", "director", "cast"]
            .into_iter()
            .map(|field| Filter::contains(field, q))
            .collect(),
    );
    let movies = paginate(&Find::new(data.repo.movies(), Query::filter(filter)), params.resolve(DEFAULT_LIMIT)).await?;

    let actor_filter = FilterBuilder::new()
        .and(Filter::contains("name", q))
        .and(Filter::eq("role", CrewRole::Actor.as_str()))
        .build();
    let actors = data.repo.crew().find(&Query::filter(actor_filter), Window::default()).await?;
    if !actors.is_empty() {
        let log = SearchLog::new(q, SearchCategory::Actor, caller.map(|c| c.user_id));
        data.repo.search_logs().insert(log).await?;
    }

    Ok(HttpResponse::Ok().json(SearchResponse { movies, actors }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct RatingRange {
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

#[utoipa::path(get, path = "/api/movies/filter/rating", params(RatingRange, PageParams),
    responses((status = 200, description = "Paginated movies within the rating range")))]
pub async fn filter_by_rating(
    data: web::Data<AppState>,
    range: web::Query<RatingRange>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = match (range.min_rating, range.max_rating) {
        (None, None) => Filter::All,
        (min, max) => Filter::range("averageRating", min, max),
    };
    page_of(&data, Query::filter(filter), &params).await
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct PopularityRange {
    pub min_popularity: Option<f64>,
    pub max_popularity: Option<f64>,
}

#[utoipa::path(get, path = "/api/movies/filter/popularity", params(PopularityRange, PageParams),
    responses((status = 200, description = "Paginated movies within the popularity range")))]
pub async fn filter_by_popularity(
    data: web::Data<AppState>,
    range: web::Query<PopularityRange>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = match (range.min_popularity, range.max_popularity) {
        (None, None) => Filter::All,
        (min, max) => Filter::range("popularityScore", min, max),
    };
    page_of(&data, Query::filter(filter), &params).await
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct ReleaseYear {
    pub release_year: Option<i32>,
}

#[utoipa::path(get, path = "/api/movies/filter/release-year", params(ReleaseYear, PageParams),
    responses(
        (status = 200, description = "Paginated movies released that year"),
        (status = 400, description = "Missing releaseYear")
    ))]
pub async fn filter_by_release_year(
    data: web::Data<AppState>,
    year: web::Query<ReleaseYear>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let year = year.release_year.ok_or_else(|| ApiError::bad_request("Release year is required"))?;
    page_of(&data, Query::filter(year_span(year, year)), &params).await
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdvancedFilter {
    /// first year of the decade, e.g. 1990
    pub decade: Option<i32>,
    pub country: Option<String>,
    pub language: Option<String>,
    /// exact phrase searched in title and synopsis
    pub keywords: Option<String>,
}

#[utoipa::path(get, path = "/api/movies/advanced-filter", params(AdvancedFilter, PageParams),
    responses(
        (status = 200, description = "Paginated movies matching every supplied criterion"),
        (status = 400, description = "Invalid decade")
    ))]
pub async fn advanced_filter(
    data: web::Data<AppState>,
    criteria: web::Query<AdvancedFilter>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let c = criteria.into_inner();
    let decade = match c.decade {
        Some(start) => {
            let last = start.checked_add(9).ok_or_else(|| ApiError::bad_request("Invalid decade"))?;
            Some(year_span(start, last))
        }
        None => None,
    };
    let filter = FilterBuilder::new()
        .and_opt(decade)
        .and_opt(c.country.filter(|s| !s.is_empty()).map(|v| Filter::eq("country", v)))
        .and_opt(c.language.filter(|s| !s.is_empty()).map(|v| Filter::eq("language", v)))
        .and_opt(c.keywords.filter(|s| !s.trim().is_empty()).map(Filter::Phrase))
        .build();
    page_of(&data, Query::filter(filter), &params).await
}

#[utoipa::path(get, path = "/api/movies/top/genre/{genre}",
    params(("genre" = String, Path, description = "Genre name"), PageParams),
    responses((status = 200, description = "Best rated movies of the genre")))]
pub async fn top_by_genre(
    data: web::Data<AppState>,
    genre: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let query = Query::filter(Filter::eq("genre", genre.into_inner()))
        .sorted(Sort::desc("averageRating").then_desc("popularityScore"));
    page_of(&data, query, &params).await
}

#[utoipa::path(get, path = "/api/movies/top/month", params(PageParams),
    responses((status = 200, description = "Movies released since the first of this month, most popular first")))]
pub async fn top_of_month(data: web::Data<AppState>, params: web::Query<PageParams>) -> Result<HttpResponse, ApiError> {
    let today = Utc::now().date_naive();
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let query = Query::filter(Filter::range("releaseDate", Some(first.to_string()), None::<String>))
        .sorted(Sort::desc("popularityScore").then_desc("averageRating"));
    page_of(&data, query, &params).await
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpcomingParams {
    pub genre: Option<String>,
}

#[utoipa::path(get, path = "/api/movies/upcoming", params(UpcomingParams, PageParams),
    responses((status = 200, description = "Movies releasing today or later, soonest first")))]
pub async fn upcoming(
    data: web::Data<AppState>,
    filter: web::Query<UpcomingParams>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let today = Utc::now().date_naive().to_string();
    let filter = FilterBuilder::new()
        .and(Filter::range("releaseDate", Some(today), None::<String>))
        .and_opt(filter.into_inner().genre.filter(|g| !g.is_empty()).map(|g| Filter::eq("genre", g)))
        .build();
    page_of(&data, Query::filter(filter).sorted(Sort::asc("releaseDate")), &params).await
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxOfficeRequest {
    pub box_office: BoxOfficeUpdate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxOfficeResponse {
    pub message: String,
    pub box_office: BoxOffice,
}

#[utoipa::path(put, path = "/api/movies/{id}/box-office", request_body = BoxOfficeRequest,
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, body = BoxOfficeResponse), (status = 404, description = "Movie not found")),
    security(("bearer" = [])))]
pub async fn update_box_office(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<BoxOfficeRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut movie = find_movie(&data, &path).await?;
    payload.into_inner().box_office.apply(&mut movie.box_office);
    let movie = data.repo.movies().replace(movie).await?;
    Ok(HttpResponse::Ok().json(BoxOfficeResponse {
        message: "Box Office updated successfully".into(),
        box_office: movie.box_office,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub box_office: BoxOffice,
    pub awards: Vec<Award>,
}

#[utoipa::path(get, path = "/api/movies/{id}/details",
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, body = MovieDetails), (status = 404, description = "Movie not found")))]
pub async fn movie_details(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let movie = find_movie(&data, &path).await?;
    Ok(HttpResponse::Ok().json(MovieDetails { box_office: movie.box_office, awards: movie.awards }))
}

#[utoipa::path(post, path = "/api/movies/{id}/awards", request_body = NewAward,
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, body = crate::routes::awards::AwardsResponse)),
    security(("bearer" = [])))]
pub async fn add_award(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<NewAward>,
) -> Result<HttpResponse, ApiError> {
    awards::add(data.repo.movies(), &path, "Movie", payload.into_inner()).await
}

#[utoipa::path(put, path = "/api/movies/{id}/awards/{award_id}", request_body = AwardUpdate,
    params(("id" = String, Path, description = "Movie id"), ("award_id" = String, Path, description = "Award id")),
    responses((status = 200, body = crate::routes::awards::AwardsResponse), (status = 404, description = "Movie or award not found")),
    security(("bearer" = [])))]
pub async fn update_award(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
    payload: web::Json<AwardUpdate>,
) -> Result<HttpResponse, ApiError> {
    let (movie_id, award_id) = path.into_inner();
    awards::update(data.repo.movies(), &movie_id, &award_id, "Movie", payload.into_inner()).await
}

#[utoipa::path(delete, path = "/api/movies/{id}/awards/{award_id}",
    params(("id" = String, Path, description = "Movie id"), ("award_id" = String, Path, description = "Award id")),
    responses((status = 200, body = crate::routes::awards::AwardsResponse), (status = 404, description = "Movie or award not found")),
    security(("bearer" = [])))]
pub async fn delete_award(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (movie_id, award_id) = path.into_inner();
    awards::remove(data.repo.movies(), &movie_id, &award_id, "Movie").await
}
