use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, LoginRequest, PublicUser, RegisterRequest,
            UpdateProfileRequest,
        },
        extractors::{AdminUser, CurrentUser},
        jwt::JwtKeys,
        services,
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
    users::model::VerificationStatus,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/pending", get(list_pending))
        .route("/auth/profile", put(update_profile))
        .route("/auth/password", put(change_password))
}

fn issue_for(state: &AppState, user: crate::users::model::User) -> Result<AuthResponse, AppError> {
    let token = JwtKeys::from_ref(state).issue(user.id)?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = services::register_user(&state, payload).await?;
    // registration logs the member in; gating happens on content actions
    Ok((StatusCode::CREATED, Json(issue_for(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = services::login_user(&state, payload).await?;
    Ok(Json(issue_for(&state, user)?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_pending(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state
        .users
        .list_by_status(VerificationStatus::Pending)
        .await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let updated = services::update_profile(&state, &user, payload).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    services::change_password(&state, &user, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
