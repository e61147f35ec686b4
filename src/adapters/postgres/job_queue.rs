//! PostgreSQL implementation of the durable job queue.
//!
//! `drain_due` deletes due rows with `FOR UPDATE SKIP LOCKED` and
//! returns them in one statement, so concurrent workers never claim
//! the same job and an uncommitted claim is released if the worker
//! dies mid-drain.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{Job, JobPayload, JobQueue};

use super::{db_error, from_doc, to_doc};

pub struct PostgresJobQueue {
    pool: PgPool,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    payload: serde_json::Value,
    run_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = DomainError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let payload: JobPayload = from_doc("jobs", row.payload)?;
        Ok(Job {
            payload,
            run_at: Timestamp::from_datetime(row.run_at),
        })
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO jobs (payload, run_at) VALUES ($1, $2)")
            .bind(to_doc("jobs", &job.payload)?)
            .bind(job.run_at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("enqueueing job", e))?;
        Ok(())
    }

    async fn drain_due(&self, now: Timestamp) -> Result<Vec<Job>, DomainError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            DELETE FROM jobs
            WHERE id IN (
                SELECT id FROM jobs
                WHERE run_at <= $1
                ORDER BY run_at ASC
                FOR UPDATE SKIP LOCKED
            )
            RETURNING payload, run_at
            "#,
        )
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("draining jobs", e))?;

        rows.into_iter().map(Job::try_from).collect()
    }
}
