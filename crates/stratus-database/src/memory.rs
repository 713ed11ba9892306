//! In-memory repository implementations.
//!
//! Backs the repository traits with dashmap so the service layer can run
//! without PostgreSQL — used by the test suite and by embedded
//! single-node deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use uuid::Uuid;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_entity::account::Account;
use stratus_entity::file::FileRecord;

use crate::repositories::{AccountRepository, FileRecordRepository};

/// In-memory account repository.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    accounts: DashMap<Uuid, Account>,
}

impl MemoryAccountRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn insert(&self, account: &Account) -> AppResult<Account> {
        let taken = self.accounts.iter().any(|a| {
            a.handle == account.handle || a.storage_directory == account.storage_directory
        });
        if taken {
            return Err(AppError::conflict(format!(
                "An account with handle '{}' already exists",
                account.handle
            )));
        }
        self.accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.handle == handle)
            .map(|a| a.clone()))
    }

    async fn set_quota(&self, id: Uuid, quota_bytes: i64) -> AppResult<Account> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Account {id} not found")))?;
        account.storage_quota_bytes = quota_bytes;
        Ok(account.clone())
    }
}

/// In-memory file record repository.
#[derive(Debug, Default)]
pub struct MemoryFileRecordRepository {
    records: DashMap<Uuid, FileRecord>,
    /// Every token ever issued, kept forever so tokens are never reused.
    issued_tokens: DashMap<String, Uuid>,
    /// Serializes the sum-check-insert sequence of `insert_admitted`.
    admission: Mutex<()>,
}

impl MemoryFileRecordRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn live_sum(&self, owner_id: Uuid) -> i64 {
        self.records
            .iter()
            .filter(|r| r.owner_id == owner_id && !r.is_deleted)
            .map(|r| r.size_bytes)
            .sum()
    }
}

#[async_trait]
impl FileRecordRepository for MemoryFileRecordRepository {
    async fn insert_admitted(
        &self,
        record: &FileRecord,
        quota_bytes: i64,
    ) -> AppResult<Option<FileRecord>> {
        let _guard = self.admission.lock().await;

        let path_taken = self.records.iter().any(|r| {
            r.owner_id == record.owner_id
                && r.storage_path == record.storage_path
                && !r.is_deleted
        });
        if path_taken {
            return Err(AppError::conflict(format!(
                "A live file already occupies path '{}'",
                record.storage_path
            )));
        }

        if self.live_sum(record.owner_id) + record.size_bytes > quota_bytes {
            return Ok(None);
        }

        self.records.insert(record.id, record.clone());
        Ok(Some(record.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn list_live_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<FileRecord>> {
        let mut records: Vec<FileRecord> = self
            .records
            .iter()
            .filter(|r| r.owner_id == owner_id && !r.is_deleted)
            .map(|r| r.clone())
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn find_live_by_path(
        &self,
        owner_id: Uuid,
        storage_path: &str,
    ) -> AppResult<Option<FileRecord>> {
        Ok(self
            .records
            .iter()
            .find(|r| {
                r.owner_id == owner_id && r.storage_path == storage_path && !r.is_deleted
            })
            .map(|r| r.clone()))
    }

    async fn sum_live_sizes(&self, owner_id: Uuid) -> AppResult<i64> {
        Ok(self.live_sum(owner_id))
    }

    async fn update(&self, record: &FileRecord) -> AppResult<FileRecord> {
        let mut existing = self
            .records
            .get_mut(&record.id)
            .ok_or_else(|| AppError::not_found(format!("File {} not found", record.id)))?;
        *existing = record.clone();
        Ok(record.clone())
    }

    async fn remove(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    async fn find_live_by_token(&self, token: &str) -> AppResult<Option<FileRecord>> {
        Ok(self
            .records
            .iter()
            .find(|r| r.shared_link.as_deref() == Some(token) && r.is_public && !r.is_deleted)
            .map(|r| r.clone()))
    }

    async fn record_issued_token(&self, token: &str, file_id: Uuid) -> AppResult<bool> {
        match self.issued_tokens.entry(token.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(file_id);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stratus_entity::file::FileCategory;

    use super::*;

    fn record(owner_id: Uuid, name: &str, size: i64) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            owner_id,
            original_name: name.to_string(),
            storage_path: format!("user_test/{name}"),
            size_bytes: size,
            category: FileCategory::from_name(name),
            uploaded_at: Utc::now(),
            last_download_at: None,
            comment: String::new(),
            is_public: false,
            shared_link: None,
            is_deleted: false,
        }
    }

    #[tokio::test]
    async fn test_insert_admitted_enforces_quota() {
        let repo = MemoryFileRecordRepository::new();
        let owner = Uuid::new_v4();

        let admitted = repo
            .insert_admitted(&record(owner, "a.txt", 600), 1000)
            .await
            .unwrap();
        assert!(admitted.is_some());

        let rejected = repo
            .insert_admitted(&record(owner, "b.txt", 500), 1000)
            .await
            .unwrap();
        assert!(rejected.is_none());

        assert_eq!(repo.sum_live_sizes(owner).await.unwrap(), 600);
    }

    #[tokio::test]
    async fn test_insert_admitted_rejects_duplicate_live_path() {
        let repo = MemoryFileRecordRepository::new();
        let owner = Uuid::new_v4();

        repo.insert_admitted(&record(owner, "a.txt", 10), 1000)
            .await
            .unwrap();
        let err = repo
            .insert_admitted(&record(owner, "a.txt", 10), 1000)
            .await
            .unwrap_err();
        assert_eq!(err.kind, stratus_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_issued_tokens_are_permanent() {
        let repo = MemoryFileRecordRepository::new();
        let file_id = Uuid::new_v4();

        assert!(repo.record_issued_token("abc123", file_id).await.unwrap());
        assert!(!repo.record_issued_token("abc123", file_id).await.unwrap());
    }
}
