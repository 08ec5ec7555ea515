use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Job, NewJob};

#[async_trait]
pub trait JobRepo: Send + Sync {
    async fn insert(&self, job: NewJob) -> anyhow::Result<Job>;
    async fn list(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Job>>;
}

#[derive(Clone)]
pub struct PgJobRepo {
    db: PgPool,
}

impl PgJobRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobRepo for PgJobRepo {
    async fn insert(&self, job: NewJob) -> anyhow::Result<Job> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, posted_by, title, company, location, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, posted_by, title, company, location, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.posted_by)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .fetch_one(&self.db)
        .await
        .context("insert job")?;
        Ok(row)
    }

    async fn list(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, posted_by, title, company, location, description, created_at
            FROM jobs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list jobs")?;
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryJobRepo {
    jobs: RwLock<Vec<Job>>,
}

impl MemoryJobRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepo for MemoryJobRepo {
    async fn insert(&self, job: NewJob) -> anyhow::Result<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            posted_by: job.posted_by,
            title: job.title,
            company: job.company,
            location: job.location,
            description: job.description,
            created_at: OffsetDateTime::now_utc(),
        };
        self.jobs.write().await.push(job.clone());
        Ok(job)
    }

    async fn list(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job(title: &str) -> NewJob {
        NewJob {
            posted_by: Uuid::new_v4(),
            title: title.into(),
            company: "Acme".into(),
            location: None,
            description: "Rust backend".into(),
        }
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let repo = MemoryJobRepo::new();
        for title in ["first", "second", "third"] {
            repo.insert(new_job(title)).await.unwrap();
        }
        let page = repo.list(2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "third");
        let rest = repo.list(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "first");
    }
}
