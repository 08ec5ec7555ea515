use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    notify::VerificationNotice,
    state::AppState,
    users::{
        model::User,
        verification::{self, Outcome, Transition},
    },
};

/// Applies an administrator's verification decision to `target_id` and
/// notifies the member. Notification failures are logged, never returned.
pub async fn set_verification(
    state: &AppState,
    actor: &User,
    target_id: Uuid,
    transition: Transition,
) -> Result<User, AppError> {
    let target = state
        .users
        .find_by_id(target_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let patch = match verification::apply(actor.is_admin, &target, transition) {
        Ok(Outcome::Unchanged) => {
            info!(user_id = %target.id, status = %target.verification_status, "verification unchanged");
            return Ok(target);
        }
        Ok(Outcome::Changed(patch)) => patch,
        Err(e) => {
            warn!(actor_id = %actor.id, user_id = %target.id, error = %e, "verification refused");
            return Err(AppError::forbidden(e.to_string()));
        }
    };

    let updated = state
        .users
        .update_fields(target.id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(
        actor_id = %actor.id,
        user_id = %updated.id,
        from = %target.verification_status,
        to = %updated.verification_status,
        "verification status changed"
    );

    let notice = VerificationNotice {
        email: updated.email.clone(),
        name: updated.name.clone(),
        status: updated.verification_status,
        remarks: updated.rejection_remarks.clone(),
    };
    if let Err(e) = state.notifier.notify_verification_outcome(&notice).await {
        warn!(user_id = %updated.id, error = %e, "verification notice not delivered");
    }

    Ok(updated)
}
