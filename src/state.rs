use std::sync::Arc;

use crate::{
    auth::jwt::JwtKeys,
    config::AppConfig,
    db,
    jobs::repo::{JobRepo, MemoryJobRepo, PgJobRepo},
    notify::{LogNotifier, Notifier},
    posts::repo::{MemoryPostRepo, PgPostRepo, PostRepo},
    users::repo::{MemoryUserRepo, PgUserRepo, UserRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub jobs: Arc<dyn JobRepo>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Postgres-backed state; runs migrations before returning.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(pool.clone())),
            Arc::new(PgPostRepo::new(pool.clone())),
            Arc::new(PgJobRepo::new(pool)),
            Arc::new(LogNotifier),
        ))
    }

    /// Process-local state for demos and tests.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            config,
            Arc::new(MemoryUserRepo::new()),
            Arc::new(MemoryPostRepo::new()),
            Arc::new(MemoryJobRepo::new()),
            Arc::new(LogNotifier),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserRepo>,
        posts: Arc<dyn PostRepo>,
        jobs: Arc<dyn JobRepo>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let jwt = JwtKeys::new(&config.jwt);
        Self {
            config: Arc::new(config),
            jwt,
            users,
            posts,
            jobs,
            notifier,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
