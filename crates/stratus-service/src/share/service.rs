//! Share link lifecycle: mint, revoke, resolve, and anonymous download.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::storage::{ByteStream, StorageProvider};
use stratus_database::repositories::FileRecordRepository;
use stratus_entity::file::FileRecord;

use crate::context::RequestContext;

use super::token::TokenGenerator;

/// Attempts at minting a unique token before giving up.
const MAX_TOKEN_ATTEMPTS: usize = 5;

/// Manages public share links for file records.
#[derive(Debug, Clone)]
pub struct ShareLinkService {
    /// File record repository.
    files: Arc<dyn FileRecordRepository>,
    /// Physical storage backend, for anonymous downloads.
    storage: Arc<dyn StorageProvider>,
    /// Token generator.
    generator: TokenGenerator,
}

impl ShareLinkService {
    /// Creates a new share link service.
    pub fn new(
        files: Arc<dyn FileRecordRepository>,
        storage: Arc<dyn StorageProvider>,
        generator: TokenGenerator,
    ) -> Self {
        Self {
            files,
            storage,
            generator,
        }
    }

    /// Load a live record, enforcing the owner/admin identity check.
    async fn get_owned(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<FileRecord> {
        let record = self
            .files
            .find_by_id(file_id)
            .await?
            .filter(|r| r.is_live())
            .ok_or_else(|| AppError::not_found("File not found"))?;

        if !ctx.can_act_on(record.owner_id) {
            return Err(AppError::not_found("File not found"));
        }

        Ok(record)
    }

    /// Mints a share link token for a file and marks it public.
    ///
    /// Every call issues a fresh token; re-linking an already shared
    /// file retires the previous token permanently. Tokens are recorded
    /// in a permanent registry and never reused, so the mint loop
    /// re-rolls on collision, bounded at [`MAX_TOKEN_ATTEMPTS`].
    pub async fn create_link(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<String> {
        let mut record = self.get_owned(ctx, file_id).await?;

        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = self.generator.next();
            if !self.files.record_issued_token(&token, file_id).await? {
                continue;
            }

            record.shared_link = Some(token.clone());
            record.is_public = true;
            self.files.update(&record).await?;

            info!(file_id = %file_id, "Share link created");
            return Ok(token);
        }

        Err(AppError::conflict(
            "Failed to generate a unique share token",
        ))
    }

    /// Revokes a file's share link and makes it private again.
    ///
    /// The retired token stays in the issued registry and will never
    /// resolve nor be handed out again.
    pub async fn revoke_link(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let mut record = self.get_owned(ctx, file_id).await?;

        record.shared_link = None;
        record.is_public = false;
        self.files.update(&record).await?;

        info!(file_id = %file_id, "Share link revoked");
        Ok(())
    }

    /// Resolves a token to the live, public record it grants access to.
    ///
    /// Tokens of soft-deleted, revoked, or re-linked records fail with
    /// NotFound even though the token value still exists in the issued
    /// registry.
    pub async fn resolve(&self, token: &str) -> AppResult<FileRecord> {
        self.files
            .find_live_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))
    }

    /// Opens an anonymous download through a share token and stamps the
    /// last-download timestamp.
    pub async fn open_shared(&self, token: &str) -> AppResult<(FileRecord, ByteStream)> {
        let mut record = self.resolve(token).await?;
        let stream = self.storage.read(&record.storage_path).await?;

        record.last_download_at = Some(Utc::now());
        let record = self.files.update(&record).await?;

        Ok((record, stream))
    }
}
