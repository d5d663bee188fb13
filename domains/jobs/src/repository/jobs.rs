//! Job repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Job, JobStatus};
use lumagen_common::Result;

const JOB_COLUMNS: &str = "id, user_id, kind, prompt, model, options, image_path, \
     image_mime_type, status, asset_id, result_url, error_message, created_at, updated_at";

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find job by ID
    pub async fn find(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Create a new job
    pub async fn create(&self, job: &Job) -> Result<Job> {
        let row = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (id, user_id, kind, prompt, model, options, image_path,
                              image_mime_type, status, asset_id, result_url, error_message,
                              created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job.id)
        .bind(job.user_id)
        .bind(job.kind)
        .bind(&job.prompt)
        .bind(&job.model)
        .bind(&job.options)
        .bind(&job.image_path)
        .bind(&job.image_mime_type)
        .bind(job.status)
        .bind(job.asset_id)
        .bind(&job.result_url)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Transition a job's status
    pub async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<()> {
        sqlx::query("UPDATE jobs SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Terminal transition: completed with its produced asset
    pub async fn mark_completed(&self, id: Uuid, asset_id: i64, result_url: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', asset_id = $2, result_url = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(asset_id)
        .bind(result_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal transition: failed with a user-visible message
    pub async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Recovery: flip every `processing` job back to `queued`.
    /// Returns the affected job ids.
    pub async fn requeue_processing(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE jobs SET status = 'queued', updated_at = NOW() \
             WHERE status = 'processing' RETURNING id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Recovery: all queued jobs, oldest first
    pub async fn find_queued_ascending(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'queued' ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Reaper: fail every job stuck in `processing` since before `threshold`.
    /// Returns the affected job ids.
    pub async fn reap_zombies(
        &self,
        threshold: DateTime<Utc>,
        error_message: &str,
    ) -> Result<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE jobs
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE status = 'processing' AND updated_at < $1
            RETURNING id
            "#,
        )
        .bind(threshold)
        .bind(error_message)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Count jobs in a given status (admin snapshot)
    pub async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
