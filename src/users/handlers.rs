use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{dto::PublicUser, extractors::AdminUser},
    error::AppError,
    extract::{AppJson, AppPath},
    state::AppState,
    users::{
        model::{StatusCounts, VerificationStatus},
        services,
        verification::Transition,
    },
};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub status: VerificationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/verify", put(verify_user))
        .route("/users/stats", get(user_stats))
}

#[instrument(skip(state, admin, payload))]
pub async fn verify_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let transition = Transition::requested(payload.status, payload.remarks)
        .ok_or_else(|| AppError::validation("Status must be approved, rejected or blocked"))?;
    let user = services::set_verification(&state, &admin, id, transition).await?;
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn user_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<StatusCounts>, AppError> {
    Ok(Json(state.users.count_by_status().await?))
}
