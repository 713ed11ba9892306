//! Storage quota accounting.

use std::sync::Arc;

use uuid::Uuid;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_database::repositories::{AccountRepository, FileRecordRepository};
use stratus_entity::account::{Account, StorageUsage};

/// Computes per-account storage accounting from live file records.
///
/// Usage is always derived by aggregating over the metadata store at
/// call time — there is no maintained running counter that could drift
/// from the records it summarizes.
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    /// File record repository.
    files: Arc<dyn FileRecordRepository>,
    /// Account repository.
    accounts: Arc<dyn AccountRepository>,
}

impl QuotaLedger {
    /// Creates a new quota ledger.
    pub fn new(
        files: Arc<dyn FileRecordRepository>,
        accounts: Arc<dyn AccountRepository>,
    ) -> Self {
        Self { files, accounts }
    }

    /// Load the account or fail with NotFound.
    async fn account(&self, account_id: Uuid) -> AppResult<Account> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))
    }

    /// Sum of `size_bytes` over the account's live file records.
    pub async fn bytes_used(&self, account_id: Uuid) -> AppResult<i64> {
        self.account(account_id).await?;
        self.files.sum_live_sizes(account_id).await
    }

    /// Remaining headroom in bytes, floored at zero.
    pub async fn bytes_left(&self, account_id: Uuid) -> AppResult<i64> {
        let account = self.account(account_id).await?;
        let used = self.files.sum_live_sizes(account_id).await?;
        Ok((account.storage_quota_bytes - used).max(0))
    }

    /// Whether a candidate upload of the given size fits the quota.
    pub async fn can_admit(&self, account_id: Uuid, candidate_bytes: i64) -> AppResult<bool> {
        Ok(candidate_bytes <= self.bytes_left(account_id).await?)
    }

    /// A full usage snapshot for the account.
    pub async fn usage(&self, account_id: Uuid) -> AppResult<StorageUsage> {
        let account = self.account(account_id).await?;
        let used = self.files.sum_live_sizes(account_id).await?;
        Ok(StorageUsage::new(account.storage_quota_bytes, used))
    }
}
