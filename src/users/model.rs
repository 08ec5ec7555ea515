use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Member eligibility to use content-creation features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Blocked,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 4] = [
        VerificationStatus::Pending,
        VerificationStatus::Approved,
        VerificationStatus::Rejected,
        VerificationStatus::Blocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub verification_status: VerificationStatus,
    pub rejection_remarks: Option<String>,
    pub graduation_year: Option<i32>,
    pub department: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_approved(&self) -> bool {
        self.verification_status == VerificationStatus::Approved
    }

    pub fn is_blocked(&self) -> bool {
        self.verification_status == VerificationStatus::Blocked
    }
}

/// Insert payload; `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub verification_status: VerificationStatus,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
    pub verification_status: Option<VerificationStatus>,
    pub rejection_remarks: Option<Option<String>>,
    pub graduation_year: Option<i32>,
    pub department: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub last_login_at: Option<OffsetDateTime>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.password_hash.is_none()
            && self.is_admin.is_none()
            && self.verification_status.is_none()
            && self.rejection_remarks.is_none()
            && self.graduation_year.is_none()
            && self.department.is_none()
            && self.company.is_none()
            && self.bio.is_none()
            && self.last_login_at.is_none()
    }

    pub fn apply_to(self, user: &mut User) {
        if let Some(v) = self.name {
            user.name = v;
        }
        if let Some(v) = self.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = self.is_admin {
            user.is_admin = v;
        }
        if let Some(v) = self.verification_status {
            user.verification_status = v;
        }
        if let Some(v) = self.rejection_remarks {
            user.rejection_remarks = v;
        }
        if let Some(v) = self.graduation_year {
            user.graduation_year = Some(v);
        }
        if let Some(v) = self.department {
            user.department = Some(v);
        }
        if let Some(v) = self.company {
            user.company = Some(v);
        }
        if let Some(v) = self.bio {
            user.bio = Some(v);
        }
        if let Some(v) = self.last_login_at {
            user.last_login_at = Some(v);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub blocked: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: VerificationStatus, n: i64) {
        match status {
            VerificationStatus::Pending => self.pending += n,
            VerificationStatus::Approved => self.approved += n,
            VerificationStatus::Rejected => self.rejected += n,
            VerificationStatus::Blocked => self.blocked += n,
        }
    }
}
