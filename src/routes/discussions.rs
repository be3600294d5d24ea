use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{parse_id, Discussion, DiscussionCategory, Id, NewDiscussion, NewReply, Reply, Votable, Vote};
use crate::pagination::{paginate, Find, PageParams, DEFAULT_LIMIT};
use crate::query::{Filter, FilterBuilder, Query, Sort, Window};

use super::{message, path_id, resolve_all, AppState};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/discussions")
            .route(web::get().to(list_discussions))
            .route(web::post().to(create_discussion)),
    )
    .service(
        web::resource("/discussions/{id}")
            .route(web::get().to(get_discussion))
            .route(web::delete().to(delete_discussion)),
    )
    .service(web::resource("/discussions/{id}/like").route(web::post().to(like_discussion)))
    .service(web::resource("/discussions/{id}/dislike").route(web::post().to(dislike_discussion)))
    .service(web::resource("/discussions/{id}/replies").route(web::post().to(create_reply)))
    .service(web::resource("/discussions/{id}/replies/{reply_id}").route(web::delete().to(delete_reply)))
    .service(web::resource("/discussions/{id}/replies/{reply_id}/like").route(web::post().to(like_reply)))
    .service(web::resource("/discussions/{id}/replies/{reply_id}/dislike").route(web::post().to(dislike_reply)));
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DiscussionFilter {
    pub category: Option<DiscussionCategory>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionView {
    #[serde(rename = "_id")]
    pub id: Id,
    pub category: DiscussionCategory,
    pub title: String,
    pub content: String,
    pub created_by: Author,
    pub replies: Vec<Reply>,
    pub likes: Vec<Id>,
    pub dislikes: Vec<Id>,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscussionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub discussion: DiscussionView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedDiscussion {
    pub message: String,
    pub discussion: Discussion,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedReply {
    pub message: String,
    pub reply: Reply,
}

/// Outcome of a vote: the size of the set the caller voted into.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<usize>,
}

impl VoteResponse {
    fn new(target: &str, vote: Vote, likes: &[Id], dislikes: &[Id]) -> Self {
        match vote {
            Vote::Like => VoteResponse {
                message: format!("Liked the {target}"),
                likes: Some(likes.len()),
                dislikes: None,
            },
            Vote::Dislike => VoteResponse {
                message: format!("Disliked the {target}"),
                likes: None,
                dislikes: Some(dislikes.len()),
            },
        }
    }
}

async fn find_discussion(data: &AppState, raw_id: &str) -> Result<Discussion, ApiError> {
    let id = path_id(raw_id)?;
    data.repo.discussions().get(&id).await?.ok_or_else(|| ApiError::not_found("Discussion not found"))
}

/// A reply addressed through its discussion; replies of other discussions
/// are treated as missing.
async fn find_reply(data: &AppState, discussion_id: &str, raw_reply_id: &str) -> Result<Reply, ApiError> {
    let id = path_id(raw_reply_id)?;
    data.repo
        .replies()
        .get(&id)
        .await?
        .filter(|r| r.discussion == discussion_id)
        .ok_or_else(|| ApiError::not_found("Reply not found"))
}

#[utoipa::path(post, path = "/api/discussions", request_body = NewDiscussion,
    responses((status = 201, body = CreatedDiscussion), (status = 400, description = "Missing title or content")),
    security(("bearer" = [])))]
pub async fn create_discussion(
    user: AuthUser,
    data: web::Data<AppState>,
    payload: web::Json<NewDiscussion>,
) -> Result<HttpResponse, ApiError> {
    let discussion = payload.into_inner().into_discussion(&user.user_id)?;
    let discussion = data.repo.discussions().insert(discussion).await?;
    Ok(HttpResponse::Created().json(CreatedDiscussion { message: "Discussion created successfully".into(), discussion }))
}

#[utoipa::path(get, path = "/api/discussions", params(DiscussionFilter, PageParams),
    responses((status = 200, description = "Paginated discussions, newest first")))]
pub async fn list_discussions(
    data: web::Data<AppState>,
    filter: web::Query<DiscussionFilter>,
    params: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = filter.into_inner();
    let predicate = FilterBuilder::new()
        .and_opt(filter.category.map(|c| Filter::eq("category", c.as_str())))
        .and_opt(filter.search.filter(|s| !s.is_empty()).map(|s| Filter::contains("title", &s)))
        .build();
    let query = Query::filter(predicate).sorted(Sort::desc("createdAt"));
    let page = paginate(&Find::new(data.repo.discussions(), query), params.resolve(DEFAULT_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(get, path = "/api/discussions/{id}",
    params(("id" = String, Path, description = "Discussion id")),
    responses((status = 200, body = DiscussionResponse), (status = 404, description = "Discussion not found")))]
pub async fn get_discussion(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let d = find_discussion(&data, &path).await?;
    let username = data.repo.users().get(&d.created_by).await?.map(|u| u.username);
    let replies = resolve_all(data.repo.replies(), &d.replies).await?;
    let discussion = DiscussionView {
        id: d.id,
        category: d.category,
        title: d.title,
        content: d.content,
        created_by: Author { id: d.created_by, username },
        replies,
        likes: d.likes,
        dislikes: d.dislikes,
        created_at: d.created_at,
        updated_at: d.updated_at,
    };
    Ok(HttpResponse::Ok().json(DiscussionResponse { message: None, discussion }))
}

#[utoipa::path(post, path = "/api/discussions/{id}/replies", request_body = NewReply,
    params(("id" = String, Path, description = "Discussion id")),
    responses(
        (status = 201, body = CreatedReply),
        (status = 400, description = "Empty content or parent reply from another discussion"),
        (status = 404, description = "Discussion not found")
    ),
    security(("bearer" = [])))]
pub async fn create_reply(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<NewReply>,
) -> Result<HttpResponse, ApiError> {
    let mut discussion = find_discussion(&data, &path).await?;
    let mut input = payload.into_inner();
    input.parent_reply = input.parent_reply.filter(|p| !p.is_empty());

    if let Some(parent) = &input.parent_reply {
        let belongs = match parse_id(parent) {
            Some(pid) => data.repo.replies().get(&pid).await?.is_some_and(|p| p.discussion == discussion.id),
            None => false,
        };
        if !belongs {
            return Err(ApiError::bad_request("Parent reply does not belong to this discussion"));
        }
    }

    let reply = data.repo.replies().insert(input.into_reply(&discussion.id, &user.user_id)?).await?;
    discussion.replies.push(reply.id.clone());
    data.repo.discussions().replace(discussion).await?;
    Ok(HttpResponse::Created().json(CreatedReply { message: "Reply added successfully".into(), reply }))
}

async fn vote_discussion(data: &AppState, raw_id: &str, user: &str, vote: Vote) -> Result<HttpResponse, ApiError> {
    let mut discussion = find_discussion(data, raw_id).await?;
    if discussion.vote(user, vote) {
        discussion = data.repo.discussions().replace(discussion).await?;
    }
    Ok(HttpResponse::Ok().json(VoteResponse::new("discussion", vote, &discussion.likes, &discussion.dislikes)))
}

async fn vote_reply(
    data: &AppState,
    raw_id: &str,
    raw_reply_id: &str,
    user: &str,
    vote: Vote,
) -> Result<HttpResponse, ApiError> {
    let discussion = find_discussion(data, raw_id).await?;
    let mut reply = find_reply(data, &discussion.id, raw_reply_id).await?;
    if reply.vote(user, vote) {
        reply = data.repo.replies().replace(reply).await?;
    }
    Ok(HttpResponse::Ok().json(VoteResponse::new("reply", vote, &reply.likes, &reply.dislikes)))
}

#[utoipa::path(post, path = "/api/discussions/{id}/like",
    params(("id" = String, Path, description = "Discussion id")),
    responses((status = 200, body = VoteResponse), (status = 404, description = "Discussion not found")),
    security(("bearer" = [])))]
pub async fn like_discussion(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    vote_discussion(&data, &path, &user.user_id, Vote::Like).await
}

#[utoipa::path(post, path = "/api/discussions/{id}/dislike",
    params(("id" = String, Path, description = "Discussion id")),
    responses((status = 200, body = VoteResponse), (status = 404, description = "Discussion not found")),
    security(("bearer" = [])))]
pub async fn dislike_discussion(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    vote_discussion(&data, &path, &user.user_id, Vote::Dislike).await
}

#[utoipa::path(post, path = "/api/discussions/{id}/replies/{reply_id}/like",
    params(("id" = String, Path, description = "Discussion id"), ("reply_id" = String, Path, description = "Reply id")),
    responses((status = 200, body = VoteResponse), (status = 404, description = "Discussion or reply not found")),
    security(("bearer" = [])))]
pub async fn like_reply(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, reply_id) = path.into_inner();
    vote_reply(&data, &id, &reply_id, &user.user_id, Vote::Like).await
}

#[utoipa::path(post, path = "/api/discussions/{id}/replies/{reply_id}/dislike",
    params(("id" = String, Path, description = "Discussion id"), ("reply_id" = String, Path, description = "Reply id")),
    responses((status = 200, body = VoteResponse), (status = 404, description = "Discussion or reply not found")),
    security(("bearer" = [])))]
pub async fn dislike_reply(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, reply_id) = path.into_inner();
    vote_reply(&data, &id, &reply_id, &user.user_id, Vote::Dislike).await
}

/// Replies are removed before the discussion itself.
#[utoipa::path(delete, path = "/api/discussions/{id}",
    params(("id" = String, Path, description = "Discussion id")),
    responses(
        (status = 200, description = "Discussion and replies deleted"),
        (status = 403, description = "Neither creator nor admin"),
        (status = 404, description = "Discussion not found")
    ),
    security(("bearer" = [])))]
pub async fn delete_discussion(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let discussion = find_discussion(&data, &path).await?;
    if discussion.created_by != user.user_id && !user.is_admin {
        return Err(ApiError::forbidden("You do not have permission to delete this discussion"));
    }
    let removed = data.repo.replies().delete_many(&Filter::eq("discussion", discussion.id.as_str())).await?;
    data.repo.discussions().delete(&discussion.id).await?;
    tracing::info!(discussion = %discussion.id, replies = removed, "discussion deleted");
    Ok(message("Discussion and its replies deleted successfully"))
}

#[utoipa::path(delete, path = "/api/discussions/{id}/replies/{reply_id}",
    params(("id" = String, Path, description = "Discussion id"), ("reply_id" = String, Path, description = "Reply id")),
    responses(
        (status = 200, description = "Reply deleted"),
        (status = 403, description = "Neither author nor admin"),
        (status = 404, description = "Discussion or reply not found")
    ),
    security(("bearer" = [])))]
pub async fn delete_reply(
    user: AuthUser,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, reply_id) = path.into_inner();
    let mut discussion = find_discussion(&data, &id).await?;
    let reply = find_reply(&data, &discussion.id, &reply_id).await?;
    if reply.created_by != user.user_id && !user.is_admin {
        return Err(ApiError::forbidden("You do not have permission to delete this reply"));
    }
    data.repo.replies().delete(&reply.id).await?;

    // answers to the removed reply become top-level replies
    let children = data
        .repo
        .replies()
        .find(&Query::filter(Filter::eq("parentReply", reply.id.as_str())), Window::default())
        .await?;
    for mut child in children {
        child.parent_reply = None;
        data.repo.replies().replace(child).await?;
    }

    discussion.replies.retain(|r| r != &reply.id);
    data.repo.discussions().replace(discussion).await?;
    Ok(message("Reply deleted successfully"))
}
