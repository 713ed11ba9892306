//! Account provisioning and quota administration.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::storage::StorageProvider;
use stratus_database::repositories::AccountRepository;
use stratus_entity::account::{Account, CreateAccount, is_valid_handle};

use crate::context::RequestContext;

/// Provisions accounts and administers their quotas.
#[derive(Debug, Clone)]
pub struct AccountService {
    /// Account repository.
    accounts: Arc<dyn AccountRepository>,
    /// Physical storage backend, for creating account directories.
    storage: Arc<dyn StorageProvider>,
    /// Quota assigned to accounts that do not override it.
    default_quota_bytes: i64,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        storage: Arc<dyn StorageProvider>,
        default_quota_bytes: i64,
    ) -> Self {
        Self {
            accounts,
            storage,
            default_quota_bytes,
        }
    }

    /// Provisions a new account.
    ///
    /// The storage directory token is derived from the handle once, at
    /// creation, and never changed afterwards. The physical directory is
    /// created here as an explicit provisioning step, so a failure
    /// surfaces to the caller instead of being swallowed by a
    /// persistence hook.
    pub async fn provision(&self, req: CreateAccount) -> AppResult<Account> {
        if !is_valid_handle(&req.handle) {
            return Err(AppError::validation(format!(
                "Invalid handle '{}': must start with a letter and contain 4-20 \
                 alphanumeric characters",
                req.handle
            )));
        }

        let quota = req.storage_quota_bytes.unwrap_or(self.default_quota_bytes);
        if quota < 0 {
            return Err(AppError::validation("Quota cannot be negative"));
        }

        let account = Account {
            id: Uuid::new_v4(),
            handle: req.handle.clone(),
            storage_quota_bytes: quota,
            storage_directory: Account::directory_for(&req.handle),
            is_admin: req.is_admin,
            created_at: Utc::now(),
        };

        let account = self.accounts.insert(&account).await?;
        self.storage.create_dir(&account.storage_directory).await?;

        info!(
            account_id = %account.id,
            handle = %account.handle,
            quota = account.storage_quota_bytes,
            "Account provisioned"
        );

        Ok(account)
    }

    /// Gets an account by ID.
    pub async fn get(&self, account_id: Uuid) -> AppResult<Account> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))
    }

    /// Sets an account's storage quota. Administrative action.
    pub async fn set_quota(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        quota_bytes: i64,
    ) -> AppResult<Account> {
        if !ctx.is_admin {
            return Err(AppError::forbidden("Only administrators can change quotas"));
        }
        if quota_bytes < 0 {
            return Err(AppError::validation("Quota cannot be negative"));
        }

        let account = self.accounts.set_quota(account_id, quota_bytes).await?;

        info!(
            account_id = %account_id,
            quota = quota_bytes,
            "Quota updated"
        );

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use stratus_core::error::ErrorKind;
    use stratus_core::traits::storage::StorageProvider;
    use stratus_entity::account::CreateAccount;
    use uuid::Uuid;

    use crate::context::RequestContext;
    use crate::testutil::TestHarness;

    fn request(handle: &str) -> CreateAccount {
        CreateAccount {
            handle: handle.to_string(),
            storage_quota_bytes: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_provision_creates_directory() {
        let h = TestHarness::new().await;
        let account = h.account_service().provision(request("alice")).await.unwrap();

        assert_eq!(account.storage_directory, "user_alice");
        assert_eq!(account.storage_quota_bytes, 104_857_600);
        assert!(h.storage.exists("user_alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_handle_conflicts() {
        let h = TestHarness::new().await;
        h.account_service().provision(request("alice")).await.unwrap();

        let err = h
            .account_service()
            .provision(request("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_invalid_handle_rejected() {
        let h = TestHarness::new().await;
        for handle in ["ab", "1abc", "has space", "under_score"] {
            let err = h
                .account_service()
                .provision(request(handle))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "handle: {handle}");
        }
    }

    #[tokio::test]
    async fn test_set_quota_requires_admin() {
        let h = TestHarness::new().await;
        let account = h.account_service().provision(request("alice")).await.unwrap();

        let user_ctx = RequestContext::new(account.id);
        let err = h
            .account_service()
            .set_quota(&user_ctx, account.id, 1000)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let admin_ctx = RequestContext::admin(Uuid::new_v4());
        let updated = h
            .account_service()
            .set_quota(&admin_ctx, account.id, 1000)
            .await
            .unwrap();
        assert_eq!(updated.storage_quota_bytes, 1000);
    }
}
