use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::{CurrentUser, VerifiedUser},
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

use super::dto::{
    CommentResponse, CreateCommentRequest, CreatePostRequest, Pagination, PostResponse,
    MAX_CONTENT_LEN,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
}

fn check_content(content: &str) -> Result<&str, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Content is required"));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(AppError::validation("Content is too long"));
    }
    Ok(content)
}

#[instrument(skip_all)]
pub async fn list_posts(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let (limit, offset) = p.clamped();
    let posts = state.posts.list_posts(limit, offset).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    AppJson(body): AppJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let content = check_content(&body.content)?;
    let post = state.posts.insert_post(user.id, content).await?;
    info!(post_id = %post.id, "post created");
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[instrument(skip(state, _user))]
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    if state.posts.find_post(id).await?.is_none() {
        return Err(AppError::not_found("Post not found"));
    }
    let comments = state.posts.list_comments(id).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let content = check_content(&body.content)?;
    if state.posts.find_post(id).await?.is_none() {
        return Err(AppError::not_found("Post not found"));
    }
    let comment = state.posts.insert_comment(id, user.id, content).await?;
    info!(comment_id = %comment.id, "comment created");
    Ok((StatusCode::CREATED, Json(comment.into())))
}
