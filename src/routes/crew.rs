use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::models::{AwardUpdate, Crew, CrewRole, CrewUpdate, Movie, NewAward, NewCrew};
use crate::pagination::{paginate, Find, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, Query};

use super::{awards, message, path_id, AppState};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/crew").route(web::get().to(list_crew)).route(web::post().to(create_crew)))
        .service(
            web::resource("/crew/{id}")
                .route(web::get().to(get_crew))
                .route(web::put().to(update_crew))
                .route(web::delete().to(delete_crew)),
        )
        .service(web::resource("/crew/{id}/awards").route(web::post().to(add_award)))
        .service(
            web::resource("/crew/{id}/awards/{award_id}")
                .route(web::put().to(update_award))
                .route(web::delete().to(delete_award)),
        );
}

const WHAT: &str = "Crew member";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CrewFilter {
    pub role: Option<CrewRole>,
}

#[utoipa::path(get, path = "/api/crew", params(CrewFilter, PageParams),
    responses((status = 200, description = "Paginated crew members")))]
pub async fn list_crew(
    data: web::Data<AppState>,
    filter: web::Query<CrewFilter>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = match filter.role {
        Some(role) => Filter::eq("role", role.as_str()),
        None => Filter::All,
    };
    let page = paginate(&Find::new(data.repo.crew(), Query::filter(filter)), params.resolve(DEFAULT_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[derive(Debug, Serialize)]
struct ResolvedCredit {
    movie: Option<Movie>,
    character: Option<String>,
}

/// Crew member with filmography entries replaced by the movies they reference.
#[utoipa::path(get, path = "/api/crew/{id}",
    params(("id" = String, Path, description = "Crew id")),
    responses((status = 200, description = "Crew member with resolved filmography"), (status = 404, description = "Crew member not found")))]
pub async fn get_crew(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    let crew = data.repo.crew().get(&id).await?.ok_or_else(|| ApiError::not_found("Crew member not found"))?;

    let mut credits = Vec::with_capacity(crew.filmography.len());
    for entry in &crew.filmography {
        credits.push(ResolvedCredit {
            movie: data.repo.movies().get(&entry.movie).await?,
            character: entry.character.clone(),
        });
    }
    let mut body = serde_json::to_value(&crew).map_err(|e| ApiError::Internal(e.to_string()))?;
    body["filmography"] = serde_json::to_value(credits).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(post, path = "/api/crew", request_body = NewCrew,
    responses((status = 201, body = Crew), (status = 403, description = "Admins only")),
    security(("bearer" = [])))]
pub async fn create_crew(
    _admin: AdminUser,
    data: web::Data<AppState>,
    payload: web::Json<NewCrew>,
) -> Result<HttpResponse, ApiError> {
    let crew = data.repo.crew().insert(payload.into_inner().into_crew()?).await?;
    Ok(HttpResponse::Created().json(crew))
}

#[utoipa::path(put, path = "/api/crew/{id}", request_body = CrewUpdate,
    params(("id" = String, Path, description = "Crew id")),
    responses((status = 200, body = Crew), (status = 404, description = "Crew member not found")),
    security(("bearer" = [])))]
pub async fn update_crew(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<CrewUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    let mut crew = data.repo.crew().get(&id).await?.ok_or_else(|| ApiError::not_found("Crew member not found"))?;
    payload.into_inner().apply(&mut crew);
    Ok(HttpResponse::Ok().json(data.repo.crew().replace(crew).await?))
}

#[utoipa::path(delete, path = "/api/crew/{id}",
    params(("id" = String, Path, description = "Crew id")),
    responses((status = 200, description = "Crew member deleted"), (status = 404, description = "Crew member not found")),
    security(("bearer" = [])))]
pub async fn delete_crew(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path_id(&path)?;
    data.repo.crew().delete(&id).await?.ok_or_else(|| ApiError::not_found("Crew member not found"))?;
    Ok(message("Crew profile deleted successfully"))
}

#[utoipa::path(post, path = "/api/crew/{id}/awards", request_body = NewAward,
    params(("id" = String, Path, description = "Crew id")),
    responses((status = 200, body = crate::routes::awards::AwardsResponse)),
    security(("bearer" = [])))]
pub async fn add_award(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<NewAward>,
) -> Result<HttpResponse, ApiError> {
    awards::add(data.repo.crew(), &path, WHAT, payload.into_inner()).await
}

#[utoipa::path(put, path = "/api/crew/{id}/awards/{award_id}", request_body = AwardUpdate,
    params(("id" = String, Path, description = "Crew id"), ("award_id" = String, Path, description = "Award id")),
    responses((status = 200, body = crate::routes::awards::AwardsResponse)),
    security(("bearer" = [])))]
pub async fn update_award(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
    payload: web::Json<AwardUpdate>,
) -> Result<HttpResponse, ApiError> {
    let (crew_id, award_id) = path.into_inner();
    awards::update(data.repo.crew(), &crew_id, &award_id, WHAT, payload.into_inner()).await
}

#[utoipa::path(delete, path = "/api/crew/{id}/awards/{award_id}",
    params(("id" = String, Path, description = "Crew id"), ("award_id" = String, Path, description = "Award id")),
    responses((status = 200, body = crate::routes::awards::AwardsResponse)),
    security(("bearer" = [])))]
pub async fn delete_award(
    _admin: AdminUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (crew_id, award_id) = path.into_inner();
    awards::remove(data.repo.crew(), &crew_id, &award_id, WHAT).await
}
