//! Upload admission control.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_database::repositories::AccountRepository;
use stratus_entity::file::FileRecord;

use crate::context::RequestContext;
use crate::quota::QuotaLedger;

use super::service::FileRecordService;

/// Admits or rejects incoming uploads against the owner's quota.
///
/// The quota check and the subsequent write are serialized per account:
/// two concurrent uploads for the same account cannot both observe
/// sufficient headroom and jointly overshoot the quota. The metadata
/// store's conditional insert re-validates the quota on commit, so the
/// guarantee holds across processes as well.
#[derive(Debug, Clone)]
pub struct UploadAdmissionService {
    /// Quota ledger.
    ledger: QuotaLedger,
    /// File record service performing the actual create.
    files: FileRecordService,
    /// Account repository.
    accounts: Arc<dyn AccountRepository>,
    /// Per-account admission locks.
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    /// Upper bound for a single upload, from storage configuration.
    max_upload_size_bytes: u64,
}

impl UploadAdmissionService {
    /// Creates a new admission service.
    pub fn new(
        ledger: QuotaLedger,
        files: FileRecordService,
        accounts: Arc<dyn AccountRepository>,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            ledger,
            files,
            accounts,
            locks: Arc::new(DashMap::new()),
            max_upload_size_bytes,
        }
    }

    /// Admits an upload, writing the bytes and the metadata record, or
    /// rejects it with QuotaExceeded before anything touches storage.
    pub async fn admit_upload(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        original_name: &str,
        data: Bytes,
    ) -> AppResult<FileRecord> {
        if !ctx.can_act_on(account_id) {
            return Err(AppError::forbidden(
                "You can only upload into your own account",
            ));
        }

        if data.len() as u64 > self.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.max_upload_size_bytes
            )));
        }

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

        // Serialize the check-then-write sequence per account.
        let lock = self
            .locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let available = self.ledger.bytes_left(account_id).await?;
        if data.len() as i64 > available {
            info!(
                account_id = %account_id,
                name = %original_name,
                size = data.len(),
                available,
                "Upload rejected by quota"
            );
            return Err(AppError::quota_exceeded(available));
        }

        self.files.create(&account, original_name, data).await
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use stratus_core::error::ErrorKind;
    use stratus_core::traits::storage::StorageProvider;

    use crate::context::RequestContext;
    use crate::testutil::TestHarness;

    #[tokio::test]
    async fn test_admit_then_reject_on_quota() {
        let h = TestHarness::new().await;
        let account = h.provision("mallory", 1000).await;
        let ctx = RequestContext::new(account.id);

        let record = h
            .admission()
            .admit_upload(&ctx, account.id, "a.bin", Bytes::from(vec![1u8; 600]))
            .await
            .unwrap();
        assert_eq!(record.size_bytes, 600);
        assert_eq!(h.ledger().bytes_used(account.id).await.unwrap(), 600);
        assert_eq!(h.ledger().bytes_left(account.id).await.unwrap(), 400);

        let err = h
            .admission()
            .admit_upload(&ctx, account.id, "b.bin", Bytes::from(vec![2u8; 500]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        assert!(err.message.contains("400"));
    }

    #[tokio::test]
    async fn test_rejected_upload_leaves_no_bytes() {
        let h = TestHarness::new().await;
        let account = h.provision("nancy", 100).await;
        let ctx = RequestContext::new(account.id);

        let err = h
            .admission()
            .admit_upload(&ctx, account.id, "big.bin", Bytes::from(vec![0u8; 500]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        assert!(!h.storage.exists("user_nancy/big.bin").await.unwrap());
        assert_eq!(h.ledger().bytes_used(account.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_fit_is_admitted() {
        let h = TestHarness::new().await;
        let account = h.provision("oscar", 1000).await;
        let ctx = RequestContext::new(account.id);

        h.admission()
            .admit_upload(&ctx, account.id, "fit.bin", Bytes::from(vec![0u8; 1000]))
            .await
            .unwrap();
        assert_eq!(h.ledger().bytes_left(account.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected_before_quota() {
        let h = TestHarness::with_max_upload(64).await;
        let account = h.provision("peggy", 10_000).await;
        let ctx = RequestContext::new(account.id);

        let err = h
            .admission()
            .admit_upload(&ctx, account.id, "big.bin", Bytes::from(vec![0u8; 65]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_never_overshoot_quota() {
        let h = TestHarness::new().await;
        let account = h.provision("quinn", 1000).await;
        let ctx = RequestContext::new(account.id);

        let mut handles = Vec::new();
        for i in 0..10 {
            let admission = h.admission();
            let account_id = account.id;
            handles.push(tokio::spawn(async move {
                admission
                    .admit_upload(
                        &ctx,
                        account_id,
                        &format!("part{i}.bin"),
                        Bytes::from(vec![0u8; 300]),
                    )
                    .await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 3);
        let used = h.ledger().bytes_used(account.id).await.unwrap();
        assert!(used <= 1000, "quota overshoot: {used} bytes used");
        assert_eq!(used, 900);
    }
}
