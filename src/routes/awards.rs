//! Award sub-resources shared by movies and crew members.

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{Award, AwardUpdate, HasAwards, NewAward};
use crate::repo::{Collection, Document};

use super::path_id;

#[derive(Debug, Serialize, ToSchema)]
pub struct AwardsResponse {
    pub message: String,
    pub awards: Vec<Award>,
}

async fn load<T: Document + HasAwards>(col: &dyn Collection<T>, id: &str, what: &str) -> Result<T, ApiError> {
    let id = path_id(id)?;
    col.get(&id).await?.ok_or_else(|| ApiError::not_found(format!("{what} not found")))
}

fn respond(message: &str, awards: &[Award]) -> HttpResponse {
    HttpResponse::Ok().json(AwardsResponse { message: message.to_string(), awards: awards.to_vec() })
}

pub(crate) async fn add<T: Document + HasAwards>(
    col: &dyn Collection<T>,
    owner_id: &str,
    what: &str,
    new: NewAward,
) -> Result<HttpResponse, ApiError> {
    let mut owner = load(col, owner_id, what).await?;
    owner.awards_mut().push(new.into_award()?);
    let owner = col.replace(owner).await?;
    Ok(respond("Award added successfully", owner.awards()))
}

pub(crate) async fn update<T: Document + HasAwards>(
    col: &dyn Collection<T>,
    owner_id: &str,
    award_id: &str,
    what: &str,
    upd: AwardUpdate,
) -> Result<HttpResponse, ApiError> {
    let mut owner = load(col, owner_id, what).await?;
    if !owner.update_award(award_id, upd) {
        return Err(ApiError::not_found("Award not found"));
    }
    let owner = col.replace(owner).await?;
    Ok(respond("Award updated successfully", owner.awards()))
}

pub(crate) async fn remove<T: Document + HasAwards>(
    col: &dyn Collection<T>,
    owner_id: &str,
    award_id: &str,
    what: &str,
) -> Result<HttpResponse, ApiError> {
    let mut owner = load(col, owner_id, what).await?;
    if owner.remove_award(award_id).is_none() {
        return Err(ApiError::not_found("Award not found"));
    }
    let owner = col.replace(owner).await?;
    Ok(respond("Award deleted successfully", owner.awards()))
}
