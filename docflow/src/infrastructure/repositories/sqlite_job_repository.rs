// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`JobRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_domain::entities::job::{JobStatus, ProcessingJob};
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::job_repository::JobRepository;
use docflow_domain::value_objects::ids::{GxBucketId, JobId};
use sqlx::{Row, SqlitePool};

fn status_str(status: JobStatus) -> &'static str {
    status.as_str()
}

fn parse_status(raw: &str) -> DocFlowResult<JobStatus> {
    Ok(match raw {
        "PENDING_UPLOAD" => JobStatus::PendingUpload,
        "UPLOAD_COMPLETE" => JobStatus::UploadComplete,
        "QUEUED" => JobStatus::Queued,
        "PROCESSING" => JobStatus::Processing,
        "COMPLETED" => JobStatus::Completed,
        "PARTIAL_SUCCESS" => JobStatus::PartialSuccess,
        "FAILED" => JobStatus::Failed,
        "TERMINATED" => JobStatus::Terminated,
        other => return Err(DocFlowError::Database(format!("unknown job status: {other}"))),
    })
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> DocFlowResult<ProcessingJob> {
    Ok(ProcessingJob {
        id: JobId::new(row.try_get::<i64, _>("id").map_err(db_err)?),
        original_filename: row.try_get("original_filename").map_err(db_err)?,
        file_location: row.try_get("file_location").map_err(db_err)?,
        status: parse_status(row.try_get::<String, _>("status").map_err(db_err)?.as_str())?,
        current_stage: row.try_get("current_stage").map_err(db_err)?,
        error_message: row.try_get("error_message").map_err(db_err)?,
        remark: row.try_get("remark").map_err(db_err)?,
        gx_bucket_id: row.try_get::<Option<i64>, _>("gx_bucket_id").map_err(db_err)?.map(GxBucketId::new),
        skip_gx_process: row.try_get("skip_gx_process").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn db_err(err: sqlx::Error) -> DocFlowError {
    DocFlowError::Database(err.to_string())
}

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert(&self, job: ProcessingJob) -> DocFlowResult<ProcessingJob> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO processing_jobs
                (original_filename, file_location, status, current_stage, error_message, remark,
                 gx_bucket_id, skip_gx_process, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&job.original_filename)
        .bind(&job.file_location)
        .bind(status_str(job.status))
        .bind(&job.current_stage)
        .bind(&job.error_message)
        .bind(&job.remark)
        .bind(job.gx_bucket_id.map(|b| b.get()))
        .bind(job.skip_gx_process)
        .bind(job.created_at)
        .bind(job.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(ProcessingJob { id: JobId::new(id), ..job })
    }

    async fn find_by_id(&self, id: JobId) -> DocFlowResult<Option<ProcessingJob>> {
        let row = sqlx::query("SELECT * FROM processing_jobs WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_job).transpose()
    }

    async fn update(&self, job: &ProcessingJob) -> DocFlowResult<()> {
        sqlx::query(
            "UPDATE processing_jobs
             SET original_filename = ?, file_location = ?, current_stage = ?, error_message = ?,
                 remark = ?, gx_bucket_id = ?, skip_gx_process = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&job.original_filename)
        .bind(&job.file_location)
        .bind(&job.current_stage)
        .bind(&job.error_message)
        .bind(&job.remark)
        .bind(job.gx_bucket_id.map(|b| b.get()))
        .bind(job.skip_gx_process)
        .bind(job.updated_at)
        .bind(job.id.get())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn cas_status(
        &self,
        id: JobId,
        expected: &[JobStatus],
        new_status: JobStatus,
        error_message: Option<&str>,
        remark: Option<&str>,
    ) -> DocFlowResult<bool> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE processing_jobs SET status = ?, error_message = ?, remark = ?, updated_at = ?
             WHERE id = ? AND status IN ({placeholders})"
        );
        let now: DateTime<Utc> = Utc::now();
        let mut query = sqlx::query(&sql)
            .bind(status_str(new_status))
            .bind(error_message)
            .bind(remark)
            .bind(now)
            .bind(id.get());
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn bulk_cas_status(&self, expected: &[JobStatus], new_status: JobStatus) -> DocFlowResult<u64> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql =
            format!("UPDATE processing_jobs SET status = ?, updated_at = ? WHERE status IN ({placeholders})");
        let now: DateTime<Utc> = Utc::now();
        let mut query = sqlx::query(&sql).bind(status_str(new_status)).bind(now);
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn find_by_statuses(&self, statuses: &[JobStatus]) -> DocFlowResult<Vec<ProcessingJob>> {
        let placeholders = statuses.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM processing_jobs WHERE status IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for status in statuses {
            query = query.bind(status_str(*status));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_job).collect()
    }

    async fn find_stale_pending_uploads(&self, older_than: DateTime<Utc>) -> DocFlowResult<Vec<ProcessingJob>> {
        let rows = sqlx::query("SELECT * FROM processing_jobs WHERE status = ? AND created_at < ?")
            .bind(status_str(JobStatus::PendingUpload))
            .bind(older_than)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_job).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_domain::entities::job::ProcessingJob;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let repo = SqliteJobRepository::new(pool().await);
        let job = ProcessingJob::new_pending(JobId::new(0), "a.pdf", "bulk/source/0/a.pdf", None, false, Utc::now());
        let inserted = repo.insert(job).await.unwrap();
        assert!(inserted.id.get() > 0);

        let found = repo.find_by_id(inserted.id).await.unwrap().unwrap();
        assert_eq!(found.original_filename, "a.pdf");
        assert_eq!(found.status, JobStatus::PendingUpload);
    }

    #[tokio::test]
    async fn cas_status_only_succeeds_from_expected_state() {
        let repo = SqliteJobRepository::new(pool().await);
        let job = ProcessingJob::new_pending(JobId::new(0), "a.pdf", "bulk/source/0/a.pdf", None, false, Utc::now());
        let inserted = repo.insert(job).await.unwrap();

        let ok = repo
            .cas_status(inserted.id, &[JobStatus::PendingUpload], JobStatus::UploadComplete, None, None)
            .await
            .unwrap();
        assert!(ok);

        let stale = repo
            .cas_status(inserted.id, &[JobStatus::PendingUpload], JobStatus::Queued, None, None)
            .await
            .unwrap();
        assert!(!stale);
    }

    #[tokio::test]
    async fn bulk_cas_status_counts_affected_rows() {
        let repo = SqliteJobRepository::new(pool().await);
        for name in ["a.pdf", "b.pdf"] {
            let job = ProcessingJob::new_pending(JobId::new(0), name, "x", None, false, Utc::now());
            repo.insert(job).await.unwrap();
        }
        let n = repo
            .bulk_cas_status(&[JobStatus::PendingUpload], JobStatus::Terminated)
            .await
            .unwrap();
        assert_eq!(n, 2);
    }
}
