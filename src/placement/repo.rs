use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobPost {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub eligibility_branch: String,
    pub application_link: String,
    pub posted_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewJobPost {
    pub title: String,
    pub company: String,
    pub description: String,
    pub eligibility_branch: String,
    pub application_link: String,
    pub posted_by: String,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: NewJobPost) -> anyhow::Result<JobPost>;
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<JobPost>>;
}

#[derive(Clone)]
pub struct PgJobStore {
    db: PgPool,
}

impl PgJobStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: NewJobPost) -> anyhow::Result<JobPost> {
        let row = sqlx::query_as::<_, JobPost>(
            r#"
            INSERT INTO jobs (id, title, company, description, eligibility_branch, application_link, posted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, company, description, eligibility_branch, application_link, posted_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(&job.eligibility_branch)
        .bind(&job.application_link)
        .bind(&job.posted_by)
        .fetch_one(&self.db)
        .await
        .context("insert job post")?;
        Ok(row)
    }

    async fn list(&self) -> anyhow::Result<Vec<JobPost>> {
        let rows = sqlx::query_as::<_, JobPost>(
            r#"
            SELECT id, title, company, description, eligibility_branch, application_link, posted_by, created_at
            FROM jobs
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list job posts")?;
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<Vec<JobPost>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: NewJobPost) -> anyhow::Result<JobPost> {
        let post = JobPost {
            id: Uuid::new_v4(),
            title: job.title,
            company: job.company,
            description: job.description,
            eligibility_branch: job.eligibility_branch,
            application_link: job.application_link,
            posted_by: job.posted_by,
            created_at: OffsetDateTime::now_utc(),
        };
        self.jobs
            .lock()
            .map_err(|_| anyhow::anyhow!("job store lock poisoned"))?
            .push(post.clone());
        Ok(post)
    }

    async fn list(&self) -> anyhow::Result<Vec<JobPost>> {
        let jobs = self
            .jobs
            .lock()
            .map_err(|_| anyhow::anyhow!("job store lock poisoned"))?;
        Ok(jobs.iter().rev().cloned().collect())
    }
}
