//! Account repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_entity::account::Account;

use super::AccountRepository;

/// PostgreSQL-backed account repository.
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert(&self, account: &Account) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, handle, storage_quota_bytes, storage_directory, is_admin, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(account.id)
        .bind(&account.handle)
        .bind(account.storage_quota_bytes)
        .bind(&account.storage_directory)
        .bind(account.is_admin)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!(
                    "An account with handle '{}' already exists",
                    account.handle
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create account", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find account", e))
    }

    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE handle = $1")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by handle", e)
            })
    }

    async fn set_quota(&self, id: Uuid, quota_bytes: i64) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "UPDATE accounts SET storage_quota_bytes = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(quota_bytes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update quota", e))?
        .ok_or_else(|| AppError::not_found(format!("Account {id} not found")))
    }
}
