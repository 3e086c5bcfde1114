// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`ZipRepository`].

use async_trait::async_trait;
use docflow_domain::entities::zip::{ZipMaster, ZipProcessingStatus};
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::zip_repository::ZipRepository;
use docflow_domain::value_objects::ids::{GxBucketId, JobId, ZipId};
use sqlx::{Row, SqlitePool};

fn status_str(status: ZipProcessingStatus) -> &'static str {
    status.as_str()
}

fn parse_status(raw: &str) -> DocFlowResult<ZipProcessingStatus> {
    Ok(match raw {
        "QUEUED_FOR_EXTRACTION" => ZipProcessingStatus::QueuedForExtraction,
        "EXTRACTION_IN_PROGRESS" => ZipProcessingStatus::ExtractionInProgress,
        "EXTRACTION_SUCCESS" => ZipProcessingStatus::ExtractionSuccess,
        "EXTRACTION_FAILED" => ZipProcessingStatus::ExtractionFailed,
        "TERMINATED" => ZipProcessingStatus::Terminated,
        other => return Err(DocFlowError::Database(format!("unknown zip status: {other}"))),
    })
}

fn db_err(err: sqlx::Error) -> DocFlowError {
    DocFlowError::Database(err.to_string())
}

fn row_to_zip(row: &sqlx::sqlite::SqliteRow) -> DocFlowResult<ZipMaster> {
    Ok(ZipMaster {
        id: ZipId::new(row.try_get::<i64, _>("id").map_err(db_err)?),
        processing_job_id: JobId::new(row.try_get::<i64, _>("processing_job_id").map_err(db_err)?),
        gx_bucket_id: row.try_get::<Option<i64>, _>("gx_bucket_id").map_err(db_err)?.map(GxBucketId::new),
        original_file_path: row.try_get("original_file_path").map_err(db_err)?,
        original_file_name: row.try_get("original_file_name").map_err(db_err)?,
        file_size: row.try_get::<i64, _>("file_size").map_err(db_err)? as u64,
        zip_processing_status: parse_status(row.try_get::<String, _>("zip_processing_status").map_err(db_err)?.as_str())?,
        error_message: row.try_get("error_message").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

pub struct SqliteZipRepository {
    pool: SqlitePool,
}

impl SqliteZipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ZipRepository for SqliteZipRepository {
    async fn upsert_for_job(&self, zip: ZipMaster) -> DocFlowResult<ZipMaster> {
        if let Some(existing) = self.find_by_job_id(zip.processing_job_id).await? {
            return Ok(existing);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO zip_masters
                (processing_job_id, gx_bucket_id, original_file_path, original_file_name, file_size,
                 zip_processing_status, error_message, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(zip.processing_job_id.get())
        .bind(zip.gx_bucket_id.map(|b| b.get()))
        .bind(&zip.original_file_path)
        .bind(&zip.original_file_name)
        .bind(zip.file_size as i64)
        .bind(status_str(zip.zip_processing_status))
        .bind(&zip.error_message)
        .bind(zip.created_at)
        .bind(zip.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(ZipMaster { id: ZipId::new(id), ..zip })
    }

    async fn find_by_id(&self, id: ZipId) -> DocFlowResult<Option<ZipMaster>> {
        let row = sqlx::query("SELECT * FROM zip_masters WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_zip).transpose()
    }

    async fn find_by_job_id(&self, job_id: JobId) -> DocFlowResult<Option<ZipMaster>> {
        let row = sqlx::query("SELECT * FROM zip_masters WHERE processing_job_id = ?")
            .bind(job_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_zip).transpose()
    }

    async fn find_by_job_ids(&self, job_ids: &[JobId]) -> DocFlowResult<Vec<ZipMaster>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = job_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM zip_masters WHERE processing_job_id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in job_ids {
            query = query.bind(id.get());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_zip).collect()
    }

    async fn cas_status(
        &self,
        id: ZipId,
        expected: &[ZipProcessingStatus],
        new_status: ZipProcessingStatus,
        error_message: Option<&str>,
    ) -> DocFlowResult<bool> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE zip_masters SET zip_processing_status = ?, error_message = ?, updated_at = ?
             WHERE id = ? AND zip_processing_status IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql)
            .bind(status_str(new_status))
            .bind(error_message)
            .bind(chrono::Utc::now())
            .bind(id.get());
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn bulk_cas_status_for_jobs(
        &self,
        job_ids: &[JobId],
        expected: &[ZipProcessingStatus],
        new_status: ZipProcessingStatus,
    ) -> DocFlowResult<u64> {
        if job_ids.is_empty() {
            return Ok(0);
        }
        let job_placeholders = job_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let status_placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE zip_masters SET zip_processing_status = ?, updated_at = ?
             WHERE processing_job_id IN ({job_placeholders}) AND zip_processing_status IN ({status_placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(status_str(new_status)).bind(chrono::Utc::now());
        for id in job_ids {
            query = query.bind(id.get());
        }
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn bulk_cas_status(
        &self,
        expected: &[ZipProcessingStatus],
        new_status: ZipProcessingStatus,
    ) -> DocFlowResult<u64> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE zip_masters SET zip_processing_status = ?, updated_at = ? WHERE zip_processing_status IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(status_str(new_status)).bind(chrono::Utc::now());
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_domain::entities::job::ProcessingJob;
    use docflow_domain::repositories::job_repository::JobRepository;
    use crate::infrastructure::repositories::sqlite_job_repository::SqliteJobRepository;
    use chrono::Utc;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn upsert_for_job_is_idempotent() {
        let pool = pool().await;
        let jobs = SqliteJobRepository::new(pool.clone());
        let job = jobs
            .insert(ProcessingJob::new_pending(JobId::new(0), "a.zip", "x", None, false, Utc::now()))
            .await
            .unwrap();

        let zips = SqliteZipRepository::new(pool);
        let zip = ZipMaster::new_queued(ZipId::new(0), job.id, None, "/tmp/a.zip", "a.zip", 10, Utc::now());
        let first = zips.upsert_for_job(zip.clone()).await.unwrap();
        let second = zips.upsert_for_job(zip).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
