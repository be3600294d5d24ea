use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::Id;
use crate::routes::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Create a signed token for `user_id`, valid for `config.token_ttl`.
pub fn issue_token(config: &Config, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat,
        exp: iat.saturating_add(config.token_ttl.num_seconds()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validate signature and expiry and return the claims.
pub fn verify_token(config: &Config, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    web::block(move || bcrypt::hash(password, cost))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    web::block(move || bcrypt::verify(password, &hash))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Authenticated caller. Resolving it checks the bearer token and loads the
/// user, so a token whose user has since been removed is rejected with 404.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Id,
    pub is_admin: bool,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
        // Delegate to BearerAuth to parse the header.
        let bearer = BearerAuth::from_request(req, pl).into_inner();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let resolve = async move {
                let state = state.ok_or_else(|| ApiError::Internal("application state not configured".into()))?;
                let bearer = bearer.map_err(|_| ApiError::Unauthorized("No token, authorization denied".into()))?;
                let claims = verify_token(&state.config, bearer.token())
                    .map_err(|_| ApiError::Unauthorized("Token is not valid".into()))?;
                let user = state
                    .repo
                    .users()
                    .get(&claims.sub)
                    .await?
                    .ok_or_else(|| ApiError::not_found("User not found"))?;
                Ok::<_, ApiError>(AuthUser { user_id: user.id, is_admin: user.is_admin })
            };
            resolve.await.map_err(Into::into)
        })
    }
}

/// Authenticated caller with the admin flag set.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
        let user = AuthUser::from_request(req, pl);
        Box::pin(async move {
            let user = user.await?;
            if !user.is_admin {
                return Err(ApiError::forbidden("Access denied. Admin only.").into());
            }
            Ok(AdminUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    #[test]
    fn issued_tokens_verify() {
        let cfg = Config::new(SECRET);
        let token = issue_token(&cfg, "user-1").unwrap();
        let claims = verify_token(&cfg, &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn foreign_and_expired_tokens_fail() {
        let cfg = Config::new(SECRET);
        let other = Config::new("another-secret-of-sufficient-length!!");
        let token = issue_token(&other, "user-1").unwrap();
        assert!(verify_token(&cfg, &token).is_err());

        let mut short = Config::new(SECRET);
        short.token_ttl = chrono::Duration::seconds(-10);
        let expired = issue_token(&short, "user-1").unwrap();
        assert!(verify_token(&cfg, &expired).is_err());
    }
}
