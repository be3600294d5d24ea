use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{hash_password, AdminUser, AuthUser};
use crate::error::ApiError;
use crate::models::{parse_id, ProfileUpdate, PublicUser};
use crate::pagination::{paginate, Find, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, Query, Sort};

use super::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users/me").route(web::get().to(me)))
        .service(web::resource("/users/profile").route(web::put().to(update_profile)))
        .service(web::resource("/users/wishlist").route(web::post().to(add_to_wishlist)))
        .service(web::resource("/users/non-admins").route(web::get().to(non_admin_users)));
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    pub movie_id: String,
}

#[utoipa::path(get, path = "/api/users/me",
    responses((status = 200, description = "Caller's profile", body = PublicUser)),
    security(("bearer" = [])))]
pub async fn me(user: AuthUser, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = data.repo.users().require(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

#[utoipa::path(put, path = "/api/users/profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = PublicUser),
        (status = 400, description = "Username or email already taken")
    ),
    security(("bearer" = [])))]
pub async fn update_profile(
    user: AuthUser,
    data: web::Data<AppState>,
    payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let upd = payload.into_inner();
    let mut current = data.repo.users().require(&user.user_id).await?;

    if let Some(username) = upd.username.filter(|s| !s.trim().is_empty()) {
        current.username = username;
    }
    if let Some(email) = upd.email.filter(|s| !s.trim().is_empty()) {
        current.email = email;
    }
    if let Some(password) = upd.password.filter(|s| !s.is_empty()) {
        current.password = hash_password(password, data.config.bcrypt_cost).await?;
    }
    if let Some(genres) = upd.favorite_genres {
        current.favorite_genres = dedup(genres);
    }
    if let Some(watched) = upd.watched_movies {
        current.watched_movies = dedup(watched);
    }

    let saved = data.repo.users().replace(current).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(saved)))
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Idempotent: adding a movie twice leaves a single entry.
#[utoipa::path(post, path = "/api/users/wishlist",
    request_body = WishlistRequest,
    responses(
        (status = 200, description = "Wishlist after the addition", body = [String]),
        (status = 400, description = "Malformed movie id")
    ),
    security(("bearer" = [])))]
pub async fn add_to_wishlist(
    user: AuthUser,
    data: web::Data<AppState>,
    payload: web::Json<WishlistRequest>,
) -> Result<HttpResponse, ApiError> {
    let movie_id = parse_id(&payload.movie_id).ok_or_else(|| ApiError::bad_request("Invalid movie ID format"))?;
    let mut current = data.repo.users().require(&user.user_id).await?;
    if current.wish(&movie_id) {
        current = data.repo.users().replace(current).await?;
    }
    Ok(HttpResponse::Ok().json(current.wishlist))
}

#[utoipa::path(get, path = "/api/users/non-admins",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated non-admin users, passwords omitted"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer" = [])))]
pub async fn non_admin_users(
    _admin: AdminUser,
    data: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let source = Find::new(
        data.repo.users(),
        Query::filter(Filter::eq("isAdmin", false)).sorted(Sort::asc("createdAt")),
    );
    let page = paginate(&source, params.resolve(DEFAULT_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(page.map(PublicUser::from)))
}
