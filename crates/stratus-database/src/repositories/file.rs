//! File record repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_entity::file::FileRecord;

use super::FileRecordRepository;

/// PostgreSQL-backed file record repository.
#[derive(Debug, Clone)]
pub struct PgFileRecordRepository {
    pool: PgPool,
}

impl PgFileRecordRepository {
    /// Create a new file record repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordRepository for PgFileRecordRepository {
    async fn insert_admitted(
        &self,
        record: &FileRecord,
        quota_bytes: i64,
    ) -> AppResult<Option<FileRecord>> {
        // The live-size aggregation, the quota comparison, and the insert
        // execute as one statement, so concurrent admissions for the same
        // owner cannot both slip past the check.
        sqlx::query_as::<_, FileRecord>(
            "INSERT INTO files \
             (id, owner_id, original_name, storage_path, size_bytes, category, uploaded_at, \
              last_download_at, comment, is_public, shared_link, is_deleted) \
             SELECT $1, $2, $3, $4, $5, $6, $7, NULL, $8, FALSE, NULL, FALSE \
             WHERE (SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM files \
                    WHERE owner_id = $2 AND is_deleted = FALSE) + $5 <= $9 \
             RETURNING *",
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.original_name)
        .bind(&record.storage_path)
        .bind(record.size_bytes)
        .bind(record.category)
        .bind(record.uploaded_at)
        .bind(&record.comment)
        .bind(quota_bytes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!(
                    "A live file already occupies path '{}'",
                    record.storage_path
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file record", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn list_live_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files WHERE owner_id = $1 AND is_deleted = FALSE \
             ORDER BY uploaded_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    async fn find_live_by_path(
        &self,
        owner_id: Uuid,
        storage_path: &str,
    ) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND storage_path = $2 AND is_deleted = FALSE",
        )
        .bind(owner_id)
        .bind(storage_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file by path", e))
    }

    async fn sum_live_sizes(&self, owner_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM files \
             WHERE owner_id = $1 AND is_deleted = FALSE",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to sum file sizes", e))
    }

    async fn update(&self, record: &FileRecord) -> AppResult<FileRecord> {
        sqlx::query_as::<_, FileRecord>(
            "UPDATE files SET original_name = $2, storage_path = $3, size_bytes = $4, \
             category = $5, last_download_at = $6, comment = $7, is_public = $8, \
             shared_link = $9, is_deleted = $10 \
             WHERE id = $1 RETURNING *",
        )
        .bind(record.id)
        .bind(&record.original_name)
        .bind(&record.storage_path)
        .bind(record.size_bytes)
        .bind(record.category)
        .bind(record.last_download_at)
        .bind(&record.comment)
        .bind(record.is_public)
        .bind(&record.shared_link)
        .bind(record.is_deleted)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", record.id)))
    }

    async fn remove(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_live_by_token(&self, token: &str) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files \
             WHERE shared_link = $1 AND is_public = TRUE AND is_deleted = FALSE",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve token", e))
    }

    async fn record_issued_token(&self, token: &str, file_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO issued_share_tokens (token, file_id, issued_at) \
             VALUES ($1, $2, NOW()) ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(file_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record token", e))?;
        Ok(result.rows_affected() > 0)
    }
}
