use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Id, ListUpdate, Movie, MovieList, NewList};
use crate::pagination::{paginate, Find, Page, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, Query};

use super::{message, path_id, resolve_all, AppState};

const NOT_VISIBLE: &str = "List not found or access denied";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/lists").route(web::get().to(get_lists)).route(web::post().to(create_list)))
        .service(
            web::resource("/lists/{id}")
                .route(web::get().to(get_list))
                .route(web::put().to(update_list))
                .route(web::delete().to(delete_list)),
        )
        .service(web::resource("/lists/{id}/follow").route(web::post().to(follow_list)))
        .service(web::resource("/lists/{id}/unfollow").route(web::post().to(unfollow_list)));
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Creator {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: Option<String>,
}

/// List with its movies and creator resolved.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub movies: Vec<Movie>,
    pub creator: Creator,
    pub is_public: bool,
    pub followers: Vec<Id>,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub list: T,
}

async fn resolve(data: &AppState, list: MovieList) -> Result<ListView, ApiError> {
    let movies = resolve_all(data.repo.movies(), &list.movies).await?;
    let username = data.repo.users().get(&list.creator).await?.map(|u| u.username);
    Ok(ListView {
        id: list.id,
        title: list.title,
        description: list.description,
        movies,
        creator: Creator { id: list.creator, username },
        is_public: list.is_public,
        followers: list.followers,
        created_at: list.created_at,
        updated_at: list.updated_at,
    })
}

/// Load a list the caller may see; private lists of others are reported
/// as missing.
async fn visible_list(data: &AppState, raw_id: &str, caller: Option<&str>) -> Result<MovieList, ApiError> {
    let id = path_id(raw_id)?;
    data.repo
        .lists()
        .get(&id)
        .await?
        .filter(|l| l.visible_to(caller))
        .ok_or_else(|| ApiError::not_found(NOT_VISIBLE))
}

async fn owned_list(data: &AppState, raw_id: &str, caller: &str) -> Result<MovieList, ApiError> {
    let id = path_id(raw_id)?;
    data.repo
        .lists()
        .get(&id)
        .await?
        .filter(|l| l.creator == caller)
        .ok_or_else(|| ApiError::not_found(NOT_VISIBLE))
}

#[utoipa::path(post, path = "/api/lists", request_body = NewList,
    responses((status = 201, description = "List created"), (status = 400, description = "Missing title")),
    security(("bearer" = [])))]
pub async fn create_list(
    user: AuthUser,
    data: web::Data<AppState>,
    payload: web::Json<NewList>,
) -> Result<HttpResponse, ApiError> {
    let list = payload.into_inner().into_list(&user.user_id)?;
    let list = data.repo.lists().insert(list).await?;
    Ok(HttpResponse::Created().json(ListEnvelope { message: Some("List created successfully".into()), list }))
}

/// Anonymous callers see public lists; signed-in callers also see their own.
#[utoipa::path(get, path = "/api/lists", params(PageParams),
    responses((status = 200, description = "Paginated lists with movies and creator resolved")))]
pub async fn get_lists(
    caller: Option<AuthUser>,
    data: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let public = Filter::eq("isPublic", true);
    let filter = match caller {
        Some(c) => Filter::Or(vec![public, Filter::eq("creator", c.user_id)]),
        None => public,
    };
    let page = paginate(&Find::new(data.repo.lists(), Query::filter(filter)), params.resolve(DEFAULT_LIMIT)).await?;

    let mut views = Vec::with_capacity(page.data.len());
    for list in page.data {
        views.push(resolve(&data, list).await?);
    }
    Ok(HttpResponse::Ok().json(Page { total: page.total, page: page.page, page_size: page.page_size, data: views }))
}

#[utoipa::path(get, path = "/api/lists/{id}",
    params(("id" = String, Path, description = "List id")),
    responses((status = 200, description = "`{list}` with movies and creator resolved"), (status = 404, description = "Missing or private")))]
pub async fn get_list(
    caller: Option<AuthUser>,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let list = visible_list(&data, &path, caller.as_ref().map(|c| c.user_id.as_str())).await?;
    let list = resolve(&data, list).await?;
    Ok(HttpResponse::Ok().json(ListEnvelope { message: None, list }))
}

#[utoipa::path(put, path = "/api/lists/{id}", request_body = ListUpdate,
    params(("id" = String, Path, description = "List id")),
    responses((status = 200, description = "List updated"), (status = 404, description = "Missing or not the creator")),
    security(("bearer" = [])))]
pub async fn update_list(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ListUpdate>,
) -> Result<HttpResponse, ApiError> {
    let mut list = owned_list(&data, &path, &user.user_id).await?;
    payload.into_inner().apply(&mut list);
    let list = data.repo.lists().replace(list).await?;
    Ok(HttpResponse::Ok().json(ListEnvelope { message: Some("List updated successfully".into()), list }))
}

#[utoipa::path(delete, path = "/api/lists/{id}",
    params(("id" = String, Path, description = "List id")),
    responses((status = 200, description = "List deleted"), (status = 404, description = "Missing or not the creator")),
    security(("bearer" = [])))]
pub async fn delete_list(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let list = owned_list(&data, &path, &user.user_id).await?;
    data.repo.lists().delete(&list.id).await?;
    Ok(message("List deleted successfully"))
}

#[utoipa::path(post, path = "/api/lists/{id}/follow",
    params(("id" = String, Path, description = "List id")),
    responses((status = 200, description = "Following"), (status = 400, description = "Already following")),
    security(("bearer" = [])))]
pub async fn follow_list(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut list = visible_list(&data, &path, Some(&user.user_id)).await?;
    if list.followers.contains(&user.user_id) {
        return Err(ApiError::bad_request("Already following this list"));
    }
    list.followers.push(user.user_id);
    data.repo.lists().replace(list).await?;
    Ok(message("List followed successfully"))
}

#[utoipa::path(post, path = "/api/lists/{id}/unfollow",
    params(("id" = String, Path, description = "List id")),
    responses((status = 200, description = "Not following any more")),
    security(("bearer" = [])))]
pub async fn unfollow_list(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut list = visible_list(&data, &path, Some(&user.user_id)).await?;
    list.followers.retain(|f| f != &user.user_id);
    data.repo.lists().replace(list).await?;
    Ok(message("Unfollowed the list successfully"))
}
