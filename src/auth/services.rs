use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
        extractors::BLOCKED,
        password::{hash_password, verify_credentials, verify_password},
    },
    config::AdminSeed,
    error::AppError,
    state::AppState,
    users::{
        model::{NewUser, User, UserPatch, VerificationStatus},
        repo::RepoError,
        verification::submit_for_verification,
    },
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates a member in `pending` state.
pub async fn register_user(state: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let email = normalize_email(&req.email);
    let name = req.name.trim().to_string();

    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    check_password_strength(&req.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .users
        .insert(NewUser {
            name,
            email,
            password_hash,
            is_admin: false,
            verification_status: submit_for_verification(),
        })
        .await
        .map_err(|e| match e {
            RepoError::DuplicateEmail => AppError::Conflict("Email already registered".into()),
            RepoError::Other(e) => AppError::Internal(e),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials and stamps `last_login_at`. Unknown email and wrong
/// password produce the same error.
pub async fn login_user(state: &AppState, req: LoginRequest) -> Result<User, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let found = state.users.find_by_email(&email).await?;
    let matched = verify_credentials(
        &req.password,
        found.as_ref().map(|u| u.password_hash.as_str()),
    )?;

    let user = match found {
        Some(user) if matched => user,
        Some(user) => {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AppError::unauthenticated(INVALID_CREDENTIALS));
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::unauthenticated(INVALID_CREDENTIALS));
        }
    };

    if user.is_blocked() {
        warn!(user_id = %user.id, "login refused for blocked user");
        return Err(AppError::forbidden(BLOCKED));
    }

    let user = state
        .users
        .update_fields(
            user.id,
            UserPatch {
                last_login_at: Some(OffsetDateTime::now_utc()),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::unauthenticated(INVALID_CREDENTIALS))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user)
}

pub async fn update_profile(
    state: &AppState,
    user: &User,
    req: UpdateProfileRequest,
) -> Result<User, AppError> {
    let name = match req.name {
        Some(n) if n.trim().is_empty() => return Err(AppError::validation("Name cannot be empty")),
        Some(n) => Some(n.trim().to_string()),
        None => None,
    };
    if let Some(year) = req.graduation_year {
        if !(1900..=2200).contains(&year) {
            return Err(AppError::validation("Invalid graduation year"));
        }
    }

    let patch = UserPatch {
        name,
        graduation_year: req.graduation_year,
        department: req.department.map(|s| s.trim().to_string()),
        company: req.company.map(|s| s.trim().to_string()),
        bio: req.bio,
        ..Default::default()
    };

    let updated = state
        .users
        .update_fields(user.id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id = %updated.id, "profile updated");
    Ok(updated)
}

pub async fn change_password(
    state: &AppState,
    user: &User,
    req: ChangePasswordRequest,
) -> Result<(), AppError> {
    if !verify_password(&req.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(AppError::validation("Current password is incorrect"));
    }
    check_password_strength(&req.new_password)?;

    let password_hash = hash_password(&req.new_password)?;
    state
        .users
        .update_fields(
            user.id,
            UserPatch {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id = %user.id, "password changed");
    Ok(())
}

/// Ensures the provisioning administrator exists, is an admin and is approved.
/// An existing account is reused; its password is left as is.
pub async fn seed_admin(state: &AppState, seed: &AdminSeed) -> anyhow::Result<User> {
    let email = normalize_email(&seed.email);

    if let Some(existing) = state.users.find_by_email(&email).await? {
        if existing.is_admin && existing.is_approved() {
            return Ok(existing);
        }
        let user = state
            .users
            .update_fields(
                existing.id,
                UserPatch {
                    is_admin: Some(true),
                    verification_status: Some(VerificationStatus::Approved),
                    rejection_remarks: Some(None),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin account disappeared during seeding"))?;
        info!(user_id = %user.id, "existing account promoted to administrator");
        return Ok(user);
    }

    let password_hash = hash_password(&seed.password)?;
    let user = state
        .users
        .insert(NewUser {
            name: seed.name.clone(),
            email,
            password_hash,
            is_admin: true,
            verification_status: VerificationStatus::Approved,
        })
        .await
        .map_err(|e| anyhow::anyhow!("seed admin: {e}"))?;
    info!(user_id = %user.id, "administrator account seeded");
    Ok(user)
}
