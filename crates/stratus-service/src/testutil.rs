//! Shared fixtures for service tests: in-memory repositories plus a
//! tempdir-backed local storage provider.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::storage::{ByteStream, StorageProvider};
use stratus_database::memory::{MemoryAccountRepository, MemoryFileRecordRepository};
use stratus_entity::account::{Account, CreateAccount};
use stratus_entity::file::FileRecord;
use stratus_storage::LocalStorageProvider;

use crate::account::AccountService;
use crate::context::RequestContext;
use crate::file::{FileRecordService, UploadAdmissionService};
use crate::quota::QuotaLedger;
use crate::share::{ShareLinkService, TokenGenerator};

/// A storage wrapper whose rename always fails, for atomicity tests.
#[derive(Debug)]
pub(crate) struct FailingRenameStorage {
    inner: LocalStorageProvider,
}

#[async_trait]
impl StorageProvider for FailingRenameStorage {
    fn provider_type(&self) -> &str {
        "failing-rename"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read(path).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.inner.read_bytes(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn rename(&self, _from: &str, _to: &str) -> AppResult<()> {
        Err(AppError::storage("Injected rename failure"))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn size_of(&self, path: &str) -> AppResult<u64> {
        self.inner.size_of(path).await
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        self.inner.create_dir(path).await
    }
}

/// Fully wired service stack over in-memory repositories.
pub(crate) struct TestHarness {
    pub files: Arc<MemoryFileRecordRepository>,
    pub accounts: Arc<MemoryAccountRepository>,
    pub storage: Arc<dyn StorageProvider>,
    ledger: QuotaLedger,
    file_service: FileRecordService,
    admission: UploadAdmissionService,
    shares: ShareLinkService,
    account_service: AccountService,
    _dir: tempfile::TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::build(false, u64::MAX).await
    }

    pub async fn with_failing_rename() -> Self {
        Self::build(true, u64::MAX).await
    }

    pub async fn with_max_upload(max_upload_size_bytes: u64) -> Self {
        Self::build(false, max_upload_size_bytes).await
    }

    async fn build(failing_rename: bool, max_upload_size_bytes: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        let storage: Arc<dyn StorageProvider> = if failing_rename {
            Arc::new(FailingRenameStorage { inner: local })
        } else {
            Arc::new(local)
        };

        let files = Arc::new(MemoryFileRecordRepository::new());
        let accounts = Arc::new(MemoryAccountRepository::new());

        let files_dyn: Arc<dyn stratus_database::FileRecordRepository> = files.clone();
        let accounts_dyn: Arc<dyn stratus_database::AccountRepository> = accounts.clone();

        let ledger = QuotaLedger::new(files_dyn.clone(), accounts_dyn.clone());
        let file_service =
            FileRecordService::new(files_dyn.clone(), accounts_dyn.clone(), storage.clone());
        let admission = UploadAdmissionService::new(
            ledger.clone(),
            file_service.clone(),
            accounts_dyn.clone(),
            max_upload_size_bytes,
        );
        let shares =
            ShareLinkService::new(files_dyn.clone(), storage.clone(), TokenGenerator::new());
        let account_service =
            AccountService::new(accounts_dyn, storage.clone(), 104_857_600);

        Self {
            files,
            accounts,
            storage,
            ledger,
            file_service,
            admission,
            shares,
            account_service,
            _dir: dir,
        }
    }

    pub fn ledger(&self) -> QuotaLedger {
        self.ledger.clone()
    }

    pub fn file_service(&self) -> FileRecordService {
        self.file_service.clone()
    }

    pub fn admission(&self) -> UploadAdmissionService {
        self.admission.clone()
    }

    pub fn shares(&self) -> ShareLinkService {
        self.shares.clone()
    }

    pub fn account_service(&self) -> AccountService {
        self.account_service.clone()
    }

    /// Provision an account with an explicit quota.
    pub async fn provision(&self, handle: &str, quota_bytes: i64) -> Account {
        self.account_service
            .provision(CreateAccount {
                handle: handle.to_string(),
                storage_quota_bytes: Some(quota_bytes),
                is_admin: false,
            })
            .await
            .unwrap()
    }

    /// Upload a file of the given size through the admission service.
    pub async fn upload(&self, account: &Account, name: &str, size: usize) -> FileRecord {
        let ctx = RequestContext::new(account.id);
        self.admission
            .admit_upload(&ctx, account.id, name, Bytes::from(vec![0u8; size]))
            .await
            .unwrap()
    }
}
