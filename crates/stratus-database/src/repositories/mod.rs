//! Repository traits and their sqlx implementations.
//!
//! Services depend on the traits defined here; the sqlx implementations
//! in the sub-modules back them with PostgreSQL, and
//! [`crate::memory`] provides an in-memory implementation used by tests
//! and embedded single-node deployments.

pub mod account;
pub mod file;

use async_trait::async_trait;
use uuid::Uuid;

use stratus_core::result::AppResult;
use stratus_entity::account::Account;
use stratus_entity::file::FileRecord;

pub use account::PgAccountRepository;
pub use file::PgFileRecordRepository;

/// Metadata store operations for accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new account. Fails with Conflict when the handle or
    /// storage directory is already taken.
    async fn insert(&self, account: &Account) -> AppResult<Account>;

    /// Find an account by its primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    /// Find an account by its handle.
    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<Account>>;

    /// Set an account's storage quota and return the updated account.
    async fn set_quota(&self, id: Uuid, quota_bytes: i64) -> AppResult<Account>;
}

/// Metadata store operations for file records.
#[async_trait]
pub trait FileRecordRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a file record only if the owner's live-size sum plus the
    /// record's size still fits within `quota_bytes`.
    ///
    /// The sum, the comparison, and the insert are a single atomic
    /// operation against the store; `Ok(None)` means the record was
    /// rejected because it would overshoot the quota. A live record
    /// already occupying the same storage path fails with Conflict.
    async fn insert_admitted(
        &self,
        record: &FileRecord,
        quota_bytes: i64,
    ) -> AppResult<Option<FileRecord>>;

    /// Find a record by its primary key, deleted or not.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>>;

    /// List all live records owned by the given account.
    async fn list_live_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<FileRecord>>;

    /// Find the live record occupying the given storage path, if any.
    async fn find_live_by_path(
        &self,
        owner_id: Uuid,
        storage_path: &str,
    ) -> AppResult<Option<FileRecord>>;

    /// Sum of `size_bytes` over the owner's live records.
    async fn sum_live_sizes(&self, owner_id: Uuid) -> AppResult<i64>;

    /// Persist all mutable fields of an existing record.
    async fn update(&self, record: &FileRecord) -> AppResult<FileRecord>;

    /// Remove a record permanently. Returns `true` if a row was removed.
    async fn remove(&self, id: Uuid) -> AppResult<bool>;

    /// Find the live, public record carrying the given share token.
    async fn find_live_by_token(&self, token: &str) -> AppResult<Option<FileRecord>>;

    /// Record a newly issued share token in the permanent registry.
    ///
    /// Returns `false` when the token was ever issued before (collision);
    /// issued tokens are never reused, even after revocation.
    async fn record_issued_token(&self, token: &str, file_id: Uuid) -> AppResult<bool>;
}
