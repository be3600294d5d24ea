use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{hash_password, issue_token, verify_password, AuthUser};
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::query::Filter;

use super::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/register").route(web::post().to(register)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/auth/register-admin").route(web::post().to(register_admin)));
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
}

async fn create_user(data: &AppState, req: RegisterRequest, is_admin: bool) -> Result<User, ApiError> {
    req.validate()?;
    let hash = hash_password(req.password, data.config.bcrypt_cost).await?;
    let user = User::new(req.username, req.email, hash, is_admin);
    Ok(data.repo.users().insert(user).await?)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisteredResponse),
        (status = 400, description = "Missing field or duplicate username/email")
    )
)]
pub async fn register(data: web::Data<AppState>, payload: web::Json<RegisterRequest>) -> Result<HttpResponse, ApiError> {
    let user = create_user(&data, payload.into_inner(), false).await?;
    tracing::info!(user = %user.id, "user registered");
    Ok(HttpResponse::Created().json(RegisteredResponse {
        message: "User registered successfully".into(),
        user_id: user.id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed token", body = LoginResponse),
        (status = 400, description = "Invalid email or password")
    )
)]
pub async fn login(data: web::Data<AppState>, payload: web::Json<LoginRequest>) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = payload.into_inner();
    let invalid = || ApiError::bad_request("Invalid email or password");

    let user = data
        .repo
        .users()
        .find_one(&Filter::eq("email", email))
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(password, user.password.clone()).await? {
        return Err(invalid());
    }
    let token = issue_token(&data.config, &user.id).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().json(LoginResponse { token, user_id: user.id }))
}

/// Anyone may create the first admin; after that an admin token is needed.
#[utoipa::path(
    post,
    path = "/api/auth/register-admin",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin registered", body = RegisteredResponse),
        (status = 403, description = "An admin exists and the caller is not one")
    ),
    security(("bearer" = []))
)]
pub async fn register_admin(
    caller: Option<AuthUser>,
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let admins = data.repo.users().count(&Filter::eq("isAdmin", true)).await?;
    if admins > 0 && !caller.is_some_and(|c| c.is_admin) {
        return Err(ApiError::forbidden("Access denied. Admin only."));
    }
    let user = create_user(&data, payload.into_inner(), true).await?;
    tracing::info!(user = %user.id, "admin registered");
    Ok(HttpResponse::Created().json(RegisteredResponse {
        message: "Admin user registered successfully".into(),
        user_id: user.id,
    }))
}
