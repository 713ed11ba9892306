//! File record lifecycle: create, rename, delete, size correction,
//! downloads, and comment updates.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::storage::{ByteStream, StorageProvider};
use stratus_database::repositories::{AccountRepository, FileRecordRepository};
use stratus_entity::account::Account;
use stratus_entity::file::{FileCategory, FileRecord};

use crate::context::RequestContext;

/// Maximum length of a file display name.
const MAX_NAME_LEN: usize = 255;

/// Maximum length of a file comment.
const MAX_COMMENT_LEN: usize = 500;

/// Owns the file metadata entity and keeps it in lockstep with the
/// physical object behind it.
#[derive(Debug, Clone)]
pub struct FileRecordService {
    /// File record repository.
    files: Arc<dyn FileRecordRepository>,
    /// Account repository.
    accounts: Arc<dyn AccountRepository>,
    /// Physical storage backend.
    storage: Arc<dyn StorageProvider>,
}

impl FileRecordService {
    /// Creates a new file record service.
    pub fn new(
        files: Arc<dyn FileRecordRepository>,
        accounts: Arc<dyn AccountRepository>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            files,
            accounts,
            storage,
        }
    }

    /// Stores the bytes and creates the metadata record for a new file.
    ///
    /// Bytes are written to the storage backend before the record is
    /// inserted, so a crash mid-upload can leave at most an orphan
    /// object, never orphan metadata. The insert itself re-validates the
    /// owner's quota inside the store; a rejection rolls the written
    /// bytes back. Callers wanting the full admission check up front go
    /// through [`super::UploadAdmissionService`], which also serializes
    /// concurrent uploads per account.
    pub async fn create(
        &self,
        owner: &Account,
        original_name: &str,
        data: Bytes,
    ) -> AppResult<FileRecord> {
        validate_file_name(original_name)?;

        let storage_path = format!("{}/{}", owner.storage_directory, original_name);

        if self
            .files
            .find_live_by_path(owner.id, &storage_path)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file named '{original_name}' already exists"
            )));
        }

        let size_bytes = data.len() as i64;
        self.storage.write(&storage_path, data).await?;

        let record = FileRecord {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            original_name: original_name.to_string(),
            storage_path: storage_path.clone(),
            size_bytes,
            category: FileCategory::from_name(original_name),
            uploaded_at: Utc::now(),
            last_download_at: None,
            comment: String::new(),
            is_public: false,
            shared_link: None,
            is_deleted: false,
        };

        match self
            .files
            .insert_admitted(&record, owner.storage_quota_bytes)
            .await
        {
            Ok(Some(record)) => {
                info!(
                    owner_id = %owner.id,
                    file_id = %record.id,
                    name = %record.original_name,
                    size = record.size_bytes,
                    "File created"
                );
                Ok(record)
            }
            Ok(None) => {
                // Rejected at commit time; remove the bytes we just wrote.
                self.storage.delete(&storage_path).await?;
                let used = self.files.sum_live_sizes(owner.id).await?;
                let available = (owner.storage_quota_bytes - used).max(0);
                warn!(
                    owner_id = %owner.id,
                    name = %original_name,
                    size = size_bytes,
                    available,
                    "Upload rejected by quota at commit"
                );
                Err(AppError::quota_exceeded(available))
            }
            Err(e) => {
                self.storage.delete(&storage_path).await?;
                Err(e)
            }
        }
    }

    /// Gets a live file, enforcing the owner/admin identity check.
    ///
    /// A non-admin actor asking for another owner's file gets NotFound;
    /// record existence is not revealed.
    pub async fn get(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<FileRecord> {
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

    /// Lists an account's live files, newest first.
    pub async fn list(&self, ctx: &RequestContext, owner_id: Uuid) -> AppResult<Vec<FileRecord>> {
        if !ctx.can_act_on(owner_id) {
            return Err(AppError::forbidden("You can only list your own files"));
        }
        self.files.list_live_by_owner(owner_id).await
    }

    /// Renames a file, moving the physical object along with it.
    ///
    /// When the new name has no extension and the old one does, the old
    /// extension is carried over to both the display name and the
    /// storage path. The physical rename happens first; if it fails, the
    /// metadata is left untouched.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<FileRecord> {
        let mut record = self.get(ctx, file_id).await?;
        validate_file_name(new_name)?;

        let effective_name = preserve_extension(new_name, &record.original_name);
        let owner = self
            .accounts
            .find_by_id(record.owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Owner account not found"))?;
        let new_path = format!("{}/{}", owner.storage_directory, effective_name);

        if new_path != record.storage_path {
            if self
                .files
                .find_live_by_path(owner.id, &new_path)
                .await?
                .is_some()
            {
                return Err(AppError::conflict(format!(
                    "A file named '{effective_name}' already exists"
                )));
            }

            if self.storage.exists(&record.storage_path).await? {
                self.storage.rename(&record.storage_path, &new_path).await?;
            }
        }

        let old_name = record.original_name.clone();
        record.original_name = effective_name;
        record.storage_path = new_path;
        let record = self.files.update(&record).await?;

        info!(
            file_id = %file_id,
            from = %old_name,
            to = %record.original_name,
            "File renamed"
        );

        Ok(record)
    }

    /// Updates the free-text comment on a file.
    pub async fn update_comment(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        comment: &str,
    ) -> AppResult<FileRecord> {
        let mut record = self.get(ctx, file_id).await?;
        validate_comment(comment)?;
        record.comment = comment.to_string();
        self.files.update(&record).await
    }

    /// Marks a file deleted, removing it from quota accounting and
    /// listings. The record and the physical bytes are retained until
    /// hard-deleted.
    pub async fn soft_delete(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let mut record = self.get(ctx, file_id).await?;
        record.is_deleted = true;
        self.files.update(&record).await?;

        info!(file_id = %file_id, "File soft-deleted");
        Ok(())
    }

    /// Removes the physical object and the metadata record.
    ///
    /// The only operation that frees space. Idempotent: a record that is
    /// already gone, or an object already removed from storage, is
    /// success. Any other storage failure propagates and the record is
    /// retained, so bytes are never orphaned silently.
    pub async fn hard_delete(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let Some(record) = self.files.find_by_id(file_id).await? else {
            return Ok(());
        };

        if !ctx.can_act_on(record.owner_id) {
            return Err(AppError::not_found("File not found"));
        }

        // Physical object first; the record only goes once the bytes are
        // confirmed gone.
        self.storage.delete(&record.storage_path).await?;
        self.files.remove(file_id).await?;

        info!(file_id = %file_id, path = %record.storage_path, "File hard-deleted");
        Ok(())
    }

    /// Re-derives `size_bytes` from the physical object and persists the
    /// correction when the stored value has drifted.
    pub async fn recompute_size(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<i64> {
        let mut record = self.get(ctx, file_id).await?;
        let actual = self.storage.size_of(&record.storage_path).await? as i64;

        if actual != record.size_bytes {
            warn!(
                file_id = %file_id,
                stored = record.size_bytes,
                actual,
                "Correcting stale file size"
            );
            record.size_bytes = actual;
            self.files.update(&record).await?;
        }

        Ok(actual)
    }

    /// Opens a download stream and stamps the last-download timestamp.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<(FileRecord, ByteStream)> {
        let mut record = self.get(ctx, file_id).await?;
        let stream = self.storage.read(&record.storage_path).await?;

        record.last_download_at = Some(Utc::now());
        let record = self.files.update(&record).await?;

        Ok((record, stream))
    }
}

/// Validate a display name against the safe character set: letters,
/// digits, spaces, and `. _ - ( )`.
fn validate_file_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("File name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "File name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("File name is reserved"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == ' ' || matches!(c, '.' | '_' | '-' | '(' | ')')))
    {
        return Err(AppError::validation(format!(
            "File name contains forbidden character '{bad}'"
        )));
    }
    Ok(())
}

/// Validate a comment: bounded length, no control characters.
fn validate_comment(comment: &str) -> AppResult<()> {
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::validation(format!(
            "Comment exceeds {MAX_COMMENT_LEN} characters"
        )));
    }
    if comment.chars().any(|c| c.is_control()) {
        return Err(AppError::validation(
            "Comment contains control characters",
        ));
    }
    Ok(())
}

/// Apply the extension-preserving rename convention: when the new name
/// has no extension and the old name does, the old extension is
/// appended.
fn preserve_extension(new_name: &str, old_name: &str) -> String {
    let has_ext = |n: &str| n.rsplit('.').next().filter(|e| *e != n).is_some();

    if has_ext(new_name) {
        return new_name.to_string();
    }
    match old_name.rsplit('.').next().filter(|e| *e != old_name) {
        Some(old_ext) => format!("{new_name}.{old_ext}"),
        None => new_name.to_string(),
    }
}
