// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`GxRepository`].

use async_trait::async_trait;
use docflow_domain::entities::gx::{GxMaster, GxStatus};
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::gx_repository::GxRepository;
use docflow_domain::value_objects::ids::{FileId, GxBucketId, GxId, JobId};
use sqlx::{Row, SqlitePool};

fn status_str(status: GxStatus) -> &'static str {
    status.as_str()
}

fn parse_status(raw: &str) -> DocFlowResult<GxStatus> {
    GxStatus::parse_from_gx(raw).ok_or_else(|| DocFlowError::Database(format!("unknown gx status: {raw}")))
}

fn db_err(err: sqlx::Error) -> DocFlowError {
    DocFlowError::Database(err.to_string())
}

fn row_to_gx(row: &sqlx::sqlite::SqliteRow) -> DocFlowResult<GxMaster> {
    Ok(GxMaster {
        id: GxId::new(row.try_get::<i64, _>("id").map_err(db_err)?),
        source_file_id: FileId::new(row.try_get::<i64, _>("source_file_id").map_err(db_err)?),
        gx_bucket_id: GxBucketId::new(row.try_get::<i64, _>("gx_bucket_id").map_err(db_err)?),
        file_location: row.try_get("file_location").map_err(db_err)?,
        processed_file_name: row.try_get("processed_file_name").map_err(db_err)?,
        file_size: row.try_get::<i64, _>("file_size").map_err(db_err)? as u64,
        extension: row.try_get("extension").map_err(db_err)?,
        gx_status: parse_status(row.try_get::<String, _>("gx_status").map_err(db_err)?.as_str())?,
        gx_process_id: row.try_get("gx_process_id").map_err(db_err)?,
        error_message: row.try_get("error_message").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

pub struct SqliteGxRepository {
    pool: SqlitePool,
}

impl SqliteGxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GxRepository for SqliteGxRepository {
    async fn insert(&self, gx: GxMaster) -> DocFlowResult<GxMaster> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO gx_masters
                (source_file_id, gx_bucket_id, file_location, processed_file_name, file_size, extension,
                 gx_status, gx_process_id, error_message, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(gx.source_file_id.get())
        .bind(gx.gx_bucket_id.get())
        .bind(&gx.file_location)
        .bind(&gx.processed_file_name)
        .bind(gx.file_size as i64)
        .bind(&gx.extension)
        .bind(status_str(gx.gx_status))
        .bind(&gx.gx_process_id)
        .bind(&gx.error_message)
        .bind(gx.created_at)
        .bind(gx.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(GxMaster { id: GxId::new(id), ..gx })
    }

    async fn find_by_id(&self, id: GxId) -> DocFlowResult<Option<GxMaster>> {
        let row = sqlx::query("SELECT * FROM gx_masters WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_gx).transpose()
    }

    async fn find_by_source_file_id(&self, file_id: FileId) -> DocFlowResult<Vec<GxMaster>> {
        let rows = sqlx::query("SELECT * FROM gx_masters WHERE source_file_id = ?")
            .bind(file_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_gx).collect()
    }

    async fn find_by_job_ids(&self, job_ids: &[JobId]) -> DocFlowResult<Vec<GxMaster>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = job_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT g.* FROM gx_masters g
             JOIN file_masters f ON f.id = g.source_file_id
             WHERE f.processing_job_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql);
        for id in job_ids {
            query = query.bind(id.get());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_gx).collect()
    }

    async fn find_by_statuses(&self, statuses: &[GxStatus]) -> DocFlowResult<Vec<GxMaster>> {
        let placeholders = statuses.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM gx_masters WHERE gx_status IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for status in statuses {
            query = query.bind(status_str(*status));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_gx).collect()
    }

    async fn cas_status(
        &self,
        id: GxId,
        expected: &[GxStatus],
        new_status: GxStatus,
        gx_process_id: Option<&str>,
        error_message: Option<&str>,
    ) -> DocFlowResult<bool> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE gx_masters SET gx_status = ?, gx_process_id = COALESCE(?, gx_process_id),
                 error_message = ?, updated_at = ?
             WHERE id = ? AND gx_status IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql)
            .bind(status_str(new_status))
            .bind(gx_process_id)
            .bind(error_message)
            .bind(chrono::Utc::now())
            .bind(id.get());
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_after_upload(&self, gx: &GxMaster) -> DocFlowResult<bool> {
        let result = sqlx::query(
            "UPDATE gx_masters SET file_location = ?, gx_status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&gx.file_location)
        .bind(status_str(gx.gx_status))
        .bind(gx.updated_at)
        .bind(gx.id.get())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn bulk_cas_status_for_jobs(
        &self,
        job_ids: &[JobId],
        expected: &[GxStatus],
        new_status: GxStatus,
    ) -> DocFlowResult<u64> {
        if job_ids.is_empty() {
            return Ok(0);
        }
        let job_placeholders = job_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let status_placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE gx_masters SET gx_status = ?, updated_at = ?
             WHERE source_file_id IN (
                 SELECT id FROM file_masters WHERE processing_job_id IN ({job_placeholders})
             ) AND gx_status IN ({status_placeholders})"
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

    async fn bulk_cas_status(&self, expected: &[GxStatus], new_status: GxStatus) -> DocFlowResult<u64> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql =
            format!("UPDATE gx_masters SET gx_status = ?, updated_at = ? WHERE gx_status IN ({placeholders})");
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
    use crate::infrastructure::repositories::sqlite_file_repository::SqliteFileRepository;
    use crate::infrastructure::repositories::sqlite_job_repository::SqliteJobRepository;
    use chrono::Utc;
    use docflow_domain::entities::file::FileMaster;
    use docflow_domain::entities::job::ProcessingJob;
    use docflow_domain::repositories::file_repository::FileRepository;
    use docflow_domain::repositories::job_repository::JobRepository;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn cas_status_only_writes_process_id_when_provided() {
        let pool = pool().await;
        let jobs = SqliteJobRepository::new(pool.clone());
        let job = jobs
            .insert(ProcessingJob::new_pending(JobId::new(0), "a.pdf", "x", None, false, Utc::now()))
            .await
            .unwrap();
        let files = SqliteFileRepository::new(pool.clone());
        let file = files
            .attempt_to_create(FileMaster::new_uploaded(
                FileId::new(0),
                job.id,
                GxBucketId::new(7),
                "7/source/1/a.pdf",
                "a.pdf",
                100,
                Some("pdf".into()),
                Utc::now(),
            ))
            .await
            .unwrap();

        let gxs = SqliteGxRepository::new(pool);
        let gx = gxs
            .insert(GxMaster::new_queued_for_upload(
                GxId::new(0),
                file.id,
                GxBucketId::new(7),
                "7/files/1/a.pdf",
                "a.pdf",
                100,
                Some("pdf".into()),
                Utc::now(),
            ))
            .await
            .unwrap();

        let changed = gxs
            .cas_status(gx.id, &[GxStatus::QueuedForUpload], GxStatus::Queued, Some("proc-1"), None)
            .await
            .unwrap();
        assert!(changed);

        let found = gxs.find_by_id(gx.id).await.unwrap().unwrap();
        assert_eq!(found.gx_process_id, "proc-1");
        assert_eq!(found.gx_status, GxStatus::Queued);
    }
}
