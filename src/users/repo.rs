use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewUser, StatusCounts, User, UserPatch, VerificationStatus};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Credential store. Lookups by email expect a normalized (lowercase) address.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new_user: NewUser) -> Result<User, RepoError>;
    /// Returns `None` when no user has this id.
    async fn update_fields(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>>;
    async fn count_by_status(&self) -> anyhow::Result<StatusCounts>;
    async fn list_by_status(&self, status: VerificationStatus) -> anyhow::Result<Vec<User>>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, verification_status, \
     rejection_remarks, graduation_year, department, company, bio, last_login_at, created_at";

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, RepoError> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin, verification_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.is_admin)
        .bind(new_user.verification_status)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(RepoError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn update_fields(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = patch.name {
            set.push("name = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.password_hash {
            set.push("password_hash = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.is_admin {
            set.push("is_admin = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.verification_status {
            set.push("verification_status = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.rejection_remarks {
            set.push("rejection_remarks = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.graduation_year {
            set.push("graduation_year = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.department {
            set.push("department = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.company {
            set.push("company = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.bio {
            set.push("bio = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.last_login_at {
            set.push("last_login_at = ").push_bind_unseparated(v);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(format!(" RETURNING {USER_COLUMNS}"));

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.db)
            .await
            .context("update user fields")?;
        Ok(user)
    }

    async fn count_by_status(&self) -> anyhow::Result<StatusCounts> {
        let rows = sqlx::query_as::<_, (VerificationStatus, i64)>(
            r#"
            SELECT verification_status, COUNT(*)
            FROM users
            GROUP BY verification_status
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("count users by status")?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            counts.add(status, n);
        }
        Ok(counts)
    }

    async fn list_by_status(&self, status: VerificationStatus) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE verification_status = $1 ORDER BY created_at ASC"
        ))
        .bind(status)
        .fetch_all(&self.db)
        .await
        .context("list users by status")?;
        Ok(users)
    }
}

/// Process-local store used for demos and tests.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(RepoError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_admin: new_user.is_admin,
            verification_status: new_user.verification_status,
            rejection_remarks: None,
            graduation_year: None,
            department: None,
            company: None,
            bio: None,
            last_login_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_fields(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(user);
        Ok(Some(user.clone()))
    }

    async fn count_by_status(&self) -> anyhow::Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for user in self.users.read().await.values() {
            counts.add(user.verification_status, 1);
        }
        Ok(counts)
    }

    async fn list_by_status(&self, status: VerificationStatus) -> anyhow::Result<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.verification_status == status)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}
