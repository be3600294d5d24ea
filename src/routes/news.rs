use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::models::{News, NewsCategory, NewsUpdate, NewNews};
use crate::pagination::{paginate, Find, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, FilterBuilder, Query, Sort};

use super::{message, path_id, AppState};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/news").route(web::get().to(list_news)).route(web::post().to(create_news)))
        .service(
            web::resource("/news/{id}")
                .route(web::get().to(get_news))
                .route(web::put().to(update_news))
                .route(web::delete().to(delete_news)),
        );
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewsFilter {
    pub category: Option<NewsCategory>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsResponse {
    pub message: String,
    pub news: News,
}

#[utoipa::path(get, path = "/api/news", params(NewsFilter, PageParams),
    responses((status = 200, description = "Paginated news, newest first")))]
pub async fn list_news(
    data: web::Data<AppState>,
    filter: web::Query<NewsFilter>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = filter.into_inner();
    let predicate = FilterBuilder::new()
        .and_opt(filter.category.map(|c| Filter::eq("category", c.as_str())))
        .and_opt(filter.tag.map(|t| Filter::eq("tags", t)))
        .build();
    let query = Query::filter(predicate).sorted(Sort::desc("createdAt"));
    let page = paginate(&Find::new(data.repo.news(), query), params.resolve(DEFAULT_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(get, path = "/api/news/{id}",
    params(("id" = String, Path, description = "News id")),
    responses((status = 200, body = News), (status = 404, description = "News not found")))]
pub async fn get_news(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    let news = data.repo.news().get(&id).await?.ok_or_else(|| ApiError::not_found("News not found"))?;
    Ok(HttpResponse::Ok().json(news))
}

#[utoipa::path(post, path = "/api/news", request_body = NewNews,
    responses((status = 201, body = NewsResponse), (status = 400, description = "Missing title, content or author")),
    security(("bearer" = [])))]
pub async fn create_news(
    _admin: AdminUser,
    data: web::Data<AppState>,
    payload: web::Json<NewNews>,
) -> Result<HttpResponse, ApiError> {
    let news = data.repo.news().insert(payload.into_inner().into_news()?).await?;
    Ok(HttpResponse::Created().json(NewsResponse { message: "News added successfully".into(), news }))
}

#[utoipa::path(put, path = "/api/news/{id}", request_body = NewsUpdate,
    params(("id" = String, Path, description = "News id")),
    responses((status = 200, body = NewsResponse), (status = 404, description = "News not found")),
    security(("bearer" = [])))]
pub async fn update_news(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<NewsUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    let mut news = data.repo.news().get(&id).await?.ok_or_else(|| ApiError::not_found("News not found"))?;
    payload.into_inner().apply(&mut news);
    let news = data.repo.news().replace(news).await?;
    Ok(HttpResponse::Ok().json(NewsResponse { message: "News updated successfully".into(), news }))
}

#[utoipa::path(delete, path = "/api/news/{id}",
    params(("id" = String, Path, description = "News id")),
    responses((status = 200, description = "News deleted"), (status = 404, description = "News not found")),
    security(("bearer" = [])))]
pub async fn delete_news(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    data.repo.news().delete(&id).await?.ok_or_else(|| ApiError::not_found("News not found"))?;
    Ok(message("News deleted successfully"))
}
