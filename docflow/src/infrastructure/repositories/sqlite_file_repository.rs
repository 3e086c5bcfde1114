// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`FileRepository`].
//!
//! `attempt_to_create`/`find_winner` are C4's lock/atomic service: the
//! `(gx_bucket_id, file_hash)` partial unique index (see the init migration)
//! does the actual contention handling, this just turns the constraint
//! violation into [`UniqueHashViolation`].

use async_trait::async_trait;
use docflow_domain::entities::file::{FileMaster, FileProcessingStatus, FileSourceType};
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::value_objects::content_hash::ContentHash;
use docflow_domain::value_objects::ids::{FileId, GxBucketId, JobId, ZipId};
use sqlx::{Row, SqlitePool};

fn status_str(status: FileProcessingStatus) -> &'static str {
    status.as_str()
}

fn parse_status(raw: &str) -> DocFlowResult<FileProcessingStatus> {
    Ok(match raw {
        "QUEUED" => FileProcessingStatus::Queued,
        "IN_PROGRESS" => FileProcessingStatus::InProgress,
        "COMPLETED" => FileProcessingStatus::Completed,
        "FAILED" => FileProcessingStatus::Failed,
        "DUPLICATE" => FileProcessingStatus::Duplicate,
        "IGNORED" => FileProcessingStatus::Ignored,
        "TERMINATED" => FileProcessingStatus::Terminated,
        other => return Err(DocFlowError::Database(format!("unknown file status: {other}"))),
    })
}

fn source_type_str(source_type: FileSourceType) -> &'static str {
    match source_type {
        FileSourceType::Uploaded => "UPLOADED",
        FileSourceType::Extracted => "EXTRACTED",
        FileSourceType::Transformed => "TRANSFORMED",
    }
}

fn parse_source_type(raw: &str) -> DocFlowResult<FileSourceType> {
    Ok(match raw {
        "UPLOADED" => FileSourceType::Uploaded,
        "EXTRACTED" => FileSourceType::Extracted,
        "TRANSFORMED" => FileSourceType::Transformed,
        other => return Err(DocFlowError::Database(format!("unknown source type: {other}"))),
    })
}

fn db_err(err: sqlx::Error) -> DocFlowError {
    DocFlowError::Database(err.to_string())
}

fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> DocFlowResult<FileMaster> {
    let file_hash: Option<String> = row.try_get("file_hash").map_err(db_err)?;
    let original_content_hash: Option<String> = row.try_get("original_content_hash").map_err(db_err)?;
    Ok(FileMaster {
        id: FileId::new(row.try_get::<i64, _>("id").map_err(db_err)?),
        processing_job_id: JobId::new(row.try_get::<i64, _>("processing_job_id").map_err(db_err)?),
        zip_master_id: row.try_get::<Option<i64>, _>("zip_master_id").map_err(db_err)?.map(ZipId::new),
        gx_bucket_id: GxBucketId::new(row.try_get::<i64, _>("gx_bucket_id").map_err(db_err)?),
        file_location: row.try_get("file_location").map_err(db_err)?,
        file_name: row.try_get("file_name").map_err(db_err)?,
        file_size: row.try_get::<i64, _>("file_size").map_err(db_err)? as u64,
        extension: row.try_get("extension").map_err(db_err)?,
        file_hash: file_hash.map(ContentHash::parse).transpose().map_err(|e| DocFlowError::Database(e.to_string()))?,
        original_content_hash: original_content_hash
            .map(ContentHash::parse)
            .transpose()
            .map_err(|e| DocFlowError::Database(e.to_string()))?,
        source_type: parse_source_type(row.try_get::<String, _>("source_type").map_err(db_err)?.as_str())?,
        duplicate_of_file_id: row.try_get::<Option<i64>, _>("duplicate_of_file_id").map_err(db_err)?.map(FileId::new),
        file_processing_status: parse_status(row.try_get::<String, _>("file_processing_status").map_err(db_err)?.as_str())?,
        error_message: row.try_get("error_message").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

pub struct SqliteFileRepository {
    pool: SqlitePool,
}

impl SqliteFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for SqliteFileRepository {
    async fn acquire_lock(&self, id: FileId) -> DocFlowResult<bool> {
        let result = sqlx::query(
            "UPDATE file_masters SET file_processing_status = ?, updated_at = ?
             WHERE id = ? AND file_processing_status = ?",
        )
        .bind(status_str(FileProcessingStatus::InProgress))
        .bind(chrono::Utc::now())
        .bind(id.get())
        .bind(status_str(FileProcessingStatus::Queued))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_winner(&self, bucket: GxBucketId, hash: &ContentHash) -> DocFlowResult<Option<FileMaster>> {
        let row = sqlx::query(
            "SELECT * FROM file_masters
             WHERE gx_bucket_id = ? AND file_hash = ?
               AND file_processing_status NOT IN ('FAILED', 'IGNORED')
             ORDER BY id ASC
             LIMIT 1",
        )
        .bind(bucket.get())
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_file).transpose()
    }

    async fn attempt_to_create(&self, file: FileMaster) -> DocFlowResult<FileMaster> {
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO file_masters
                (processing_job_id, zip_master_id, gx_bucket_id, file_location, file_name, file_size,
                 extension, file_hash, original_content_hash, source_type, duplicate_of_file_id,
                 file_processing_status, error_message, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(file.processing_job_id.get())
        .bind(file.zip_master_id.map(|z| z.get()))
        .bind(file.gx_bucket_id.get())
        .bind(&file.file_location)
        .bind(&file.file_name)
        .bind(file.file_size as i64)
        .bind(&file.extension)
        .bind(file.file_hash.as_ref().map(|h| h.as_str().to_string()))
        .bind(file.original_content_hash.as_ref().map(|h| h.as_str().to_string()))
        .bind(source_type_str(file.source_type))
        .bind(file.duplicate_of_file_id.map(|f| f.get()))
        .bind(status_str(file.file_processing_status))
        .bind(&file.error_message)
        .bind(file.created_at)
        .bind(file.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(FileMaster { id: FileId::new(id), ..file }),
            // The partial unique index on (gx_bucket_id, file_hash) is the
            // only constraint this table can violate; recovered by the
            // caller via find_winner, see UniqueHashViolation's doc comment.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(DocFlowError::Duplicate),
            Err(other) => Err(db_err(other)),
        }
    }

    async fn find_by_id(&self, id: FileId) -> DocFlowResult<Option<FileMaster>> {
        let row = sqlx::query("SELECT * FROM file_masters WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_file).transpose()
    }

    async fn find_by_job_id(&self, job_id: JobId) -> DocFlowResult<Vec<FileMaster>> {
        let rows = sqlx::query("SELECT * FROM file_masters WHERE processing_job_id = ?")
            .bind(job_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_file).collect()
    }

    async fn find_by_job_ids(&self, job_ids: &[JobId]) -> DocFlowResult<Vec<FileMaster>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = job_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM file_masters WHERE processing_job_id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in job_ids {
            query = query.bind(id.get());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_file).collect()
    }

    async fn find_by_zip_id(&self, zip_id: ZipId) -> DocFlowResult<Vec<FileMaster>> {
        let rows = sqlx::query("SELECT * FROM file_masters WHERE zip_master_id = ?")
            .bind(zip_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_file).collect()
    }

    async fn update_after_hashing(&self, file: &FileMaster) -> DocFlowResult<bool> {
        let result = sqlx::query(
            "UPDATE file_masters
             SET file_hash = ?, original_content_hash = ?, file_size = ?, updated_at = ?
             WHERE id = ? AND file_processing_status = ?",
        )
        .bind(file.file_hash.as_ref().map(|h| h.as_str().to_string()))
        .bind(file.original_content_hash.as_ref().map(|h| h.as_str().to_string()))
        .bind(file.file_size as i64)
        .bind(file.updated_at)
        .bind(file.id.get())
        .bind(status_str(FileProcessingStatus::InProgress))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn cas_status(
        &self,
        id: FileId,
        expected: &[FileProcessingStatus],
        new_status: FileProcessingStatus,
        error_message: Option<&str>,
    ) -> DocFlowResult<bool> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE file_masters SET file_processing_status = ?, error_message = ?, updated_at = ?
             WHERE id = ? AND file_processing_status IN ({placeholders})"
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

    async fn update_status_for_ids(
        &self,
        ids: &[FileId],
        new_status: FileProcessingStatus,
        expected: &[FileProcessingStatus],
    ) -> DocFlowResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let id_placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let status_placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE file_masters SET file_processing_status = ?, updated_at = ?
             WHERE id IN ({id_placeholders}) AND file_processing_status IN ({status_placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(status_str(new_status)).bind(chrono::Utc::now());
        for id in ids {
            query = query.bind(id.get());
        }
        for status in expected {
            query = query.bind(status_str(*status));
        }
        let result = query.execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn bulk_cas_status_for_jobs(
        &self,
        job_ids: &[JobId],
        expected: &[FileProcessingStatus],
        new_status: FileProcessingStatus,
    ) -> DocFlowResult<u64> {
        if job_ids.is_empty() {
            return Ok(0);
        }
        let job_placeholders = job_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let status_placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE file_masters SET file_processing_status = ?, updated_at = ?
             WHERE processing_job_id IN ({job_placeholders}) AND file_processing_status IN ({status_placeholders})"
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
        expected: &[FileProcessingStatus],
        new_status: FileProcessingStatus,
    ) -> DocFlowResult<u64> {
        let placeholders = expected.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE file_masters SET file_processing_status = ?, updated_at = ? WHERE file_processing_status IN ({placeholders})"
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
    use crate::infrastructure::repositories::sqlite_job_repository::SqliteJobRepository;
    use chrono::Utc;
    use docflow_domain::entities::job::ProcessingJob;
    use docflow_domain::repositories::job_repository::JobRepository;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seeded_job(pool: &SqlitePool) -> JobId {
        let jobs = SqliteJobRepository::new(pool.clone());
        let job = jobs
            .insert(ProcessingJob::new_pending(JobId::new(0), "a.pdf", "x", None, false, Utc::now()))
            .await
            .unwrap();
        job.id
    }

    #[tokio::test]
    async fn second_attempt_at_same_bucket_hash_is_a_duplicate() {
        let pool = pool().await;
        let job_id = seeded_job(&pool).await;
        let files = SqliteFileRepository::new(pool);
        let hash = ContentHash::of_bytes(b"same content");
        let bucket = GxBucketId::new(7);

        let first = FileMaster::new_extracted(
            FileId::new(0),
            job_id,
            ZipId::new(1),
            bucket,
            "7/files/1/a.pdf",
            "a.pdf",
            10,
            Some("pdf".into()),
            hash.clone(),
            Utc::now(),
        );
        files.attempt_to_create(first).await.unwrap();

        let second = FileMaster::new_extracted(
            FileId::new(0),
            job_id,
            ZipId::new(1),
            bucket,
            "7/files/1/b.pdf",
            "b.pdf",
            10,
            Some("pdf".into()),
            hash,
            Utc::now(),
        );
        let err = files.attempt_to_create(second).await.unwrap_err();
        assert!(matches!(err, DocFlowError::Duplicate));
    }

    #[tokio::test]
    async fn find_winner_picks_lowest_id_among_active_rows() {
        let pool = pool().await;
        let job_id = seeded_job(&pool).await;
        let files = SqliteFileRepository::new(pool);
        let hash = ContentHash::of_bytes(b"race");
        let bucket = GxBucketId::new(7);

        let winner = files
            .attempt_to_create(FileMaster::new_extracted(
                FileId::new(0),
                job_id,
                ZipId::new(1),
                bucket,
                "7/files/1/a.pdf",
                "a.pdf",
                10,
                Some("pdf".into()),
                hash.clone(),
                Utc::now(),
            ))
            .await
            .unwrap();

        let found = files.find_winner(bucket, &hash).await.unwrap().unwrap();
        assert_eq!(found.id, winner.id);
    }
}
