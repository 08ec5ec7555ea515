//! Member verification lifecycle.
//!
//! `pending` is the state every registration starts in. Only an
//! administrator moves a member to `approved`, `rejected` or `blocked`, and
//! may later move a rejected or blocked member back to `approved`.
//! Administrator accounts themselves stay `approved`.

use super::model::{User, UserPatch, VerificationStatus};

/// Status assigned when a member registers.
pub fn submit_for_verification() -> VerificationStatus {
    VerificationStatus::Pending
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject { remarks: Option<String> },
    Block,
}

impl Transition {
    /// Maps a requested target status to a transition. `pending` is not a
    /// valid target.
    pub fn requested(status: VerificationStatus, remarks: Option<String>) -> Option<Self> {
        match status {
            VerificationStatus::Pending => None,
            VerificationStatus::Approved => Some(Transition::Approve),
            VerificationStatus::Rejected => Some(Transition::Reject { remarks }),
            VerificationStatus::Blocked => Some(Transition::Block),
        }
    }

    pub fn target(&self) -> VerificationStatus {
        match self {
            Transition::Approve => VerificationStatus::Approved,
            Transition::Reject { .. } => VerificationStatus::Rejected,
            Transition::Block => VerificationStatus::Blocked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Only administrators can change verification status")]
    NotAdministrator,
    #[error("Administrator accounts cannot be rejected or blocked")]
    TargetIsAdministrator,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Already in the requested state; nothing to write.
    Unchanged,
    Changed(UserPatch),
}

/// Decides the effect of `transition` on `target` when requested by an actor.
pub fn apply(
    actor_is_admin: bool,
    target: &User,
    transition: Transition,
) -> Result<Outcome, TransitionError> {
    if !actor_is_admin {
        return Err(TransitionError::NotAdministrator);
    }
    if target.is_admin && transition != Transition::Approve {
        return Err(TransitionError::TargetIsAdministrator);
    }

    let status = transition.target();
    let remarks = match transition {
        Transition::Reject { remarks } => remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        Transition::Approve | Transition::Block => None,
    };

    let remarks_changed = match status {
        VerificationStatus::Rejected => target.rejection_remarks != remarks,
        // only approve clears remarks; block keeps the history
        VerificationStatus::Approved => target.rejection_remarks.is_some(),
        _ => false,
    };

    if target.verification_status == status && !remarks_changed {
        return Ok(Outcome::Unchanged);
    }

    let rejection_remarks = match status {
        VerificationStatus::Rejected => Some(remarks),
        VerificationStatus::Approved => Some(None),
        _ => None,
    };

    Ok(Outcome::Changed(UserPatch {
        verification_status: Some(status),
        rejection_remarks,
        ..Default::default()
    }))
}
