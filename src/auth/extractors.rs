//! Route guard chain.
//!
//! Handlers declare which gate they need by the extractor they take:
//! `CurrentUser` (authenticated, not blocked), `AdminUser` (role gate) or
//! `VerifiedUser` (verification gate). Each one runs the earlier stages
//! first, so the order is always authenticate, then role, then verification.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::jwt::JwtKeys,
    error::AppError,
    state::AppState,
    users::model::{User, VerificationStatus},
};

pub const PENDING_VERIFICATION: &str = "Your account is pending verification";
pub const REJECTED_VERIFICATION: &str =
    "Your account verification was rejected; contact an administrator";
pub const BLOCKED: &str = "Your account has been blocked";
pub const ADMIN_REQUIRED: &str = "Admin access required";

/// Authenticated subject from a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthenticated("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Invalid Authorization header"))?;

        let claims = JwtKeys::from_ref(state).validate(token).map_err(|e| {
            warn!("invalid or expired token");
            e
        })?;

        let user = AuthUser(claims.sub);
        parts.extensions.insert(user);
        Ok(user)
    }
}

/// Runs the authenticate stage and loads the subject's record. Blocked
/// accounts stop here; `missing` is returned when the record is gone.
async fn load_active_user(
    parts: &mut Parts,
    state: &AppState,
    missing: AppError,
) -> Result<User, AppError> {
    let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;

    let Some(user) = state.users.find_by_id(user_id).await? else {
        warn!(%user_id, "token subject not found");
        return Err(missing);
    };

    if user.is_blocked() {
        warn!(%user_id, "blocked user rejected");
        return Err(AppError::forbidden(BLOCKED));
    }
    Ok(user)
}

/// Loaded user record for an authenticated request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user =
            load_active_user(parts, state, AppError::unauthenticated("User not found")).await?;
        Ok(CurrentUser(user))
    }
}

/// Administrator-only endpoints.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user =
            load_active_user(parts, state, AppError::forbidden(ADMIN_REQUIRED)).await?;

        if !user.is_admin {
            warn!(user_id = %user.id, "admin gate rejected");
            return Err(AppError::forbidden(ADMIN_REQUIRED));
        }
        Ok(AdminUser(user))
    }
}

/// Verification stage on an already loaded user.
fn verification_gate(user: &User) -> Result<(), AppError> {
    let message = match user.verification_status {
        VerificationStatus::Approved => return Ok(()),
        VerificationStatus::Pending => PENDING_VERIFICATION,
        VerificationStatus::Rejected => REJECTED_VERIFICATION,
        VerificationStatus::Blocked => BLOCKED,
    };
    warn!(user_id = %user.id, status = %user.verification_status, "verification gate rejected");
    Err(AppError::forbidden(message))
}

/// Endpoints that create content: only approved members pass.
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        verification_gate(&user)?;
        Ok(VerifiedUser(user))
    }
}
