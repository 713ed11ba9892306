//! File record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::category::FileCategory;

/// Metadata record describing one stored object.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    /// Unique file identifier.
    pub id: Uuid,
    /// The account that owns this file.
    pub owner_id: Uuid,
    /// The display name (including extension, when present).
    pub original_name: String,
    /// The location key within the storage provider.
    pub storage_path: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Content category derived from the extension.
    pub category: FileCategory,
    /// When the file was uploaded. Set once, immutable.
    pub uploaded_at: DateTime<Utc>,
    /// When the file was last downloaded.
    pub last_download_at: Option<DateTime<Utc>>,
    /// Free-text comment attached by the owner.
    pub comment: String,
    /// Whether the file is reachable through a public share link.
    pub is_public: bool,
    /// The current share link token. Present iff `is_public`.
    pub shared_link: Option<String>,
    /// Soft-delete marker. Deleted records are excluded from quota
    /// accounting and listings but retained until hard-deleted.
    pub is_deleted: bool,
}

impl FileRecord {
    /// Whether the record counts toward quota and appears in listings.
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.original_name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.original_name)
            .map(|ext| ext.to_lowercase())
    }

    /// Format the size for display (1024-based units).
    pub fn human_readable_size(&self) -> String {
        human_readable_bytes(self.size_bytes)
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRecord {
    /// The file owner.
    pub owner_id: Uuid,
    /// The display name.
    pub original_name: String,
    /// The location key within the storage provider.
    pub storage_path: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Content category.
    pub category: FileCategory,
    /// Free-text comment.
    pub comment: String,
}

/// Format a byte count as a human-readable string (1024-based units).
pub fn human_readable_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
