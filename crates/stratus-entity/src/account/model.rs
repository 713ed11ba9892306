//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant account with a storage quota.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// The account handle (starts with a letter, 4-20 alphanumeric chars).
    pub handle: String,
    /// Maximum live bytes this account may store.
    pub storage_quota_bytes: i64,
    /// Unique directory token under which this account's files live.
    /// Derived from the handle at provisioning, never changed afterwards.
    pub storage_directory: String,
    /// Whether the account has administrative privileges.
    pub is_admin: bool,
    /// When the account was provisioned.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Derive the storage directory token for a handle.
    pub fn directory_for(handle: &str) -> String {
        format!("user_{handle}")
    }
}

/// Data required to provision a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// The account handle.
    pub handle: String,
    /// Quota override in bytes (None = configured default).
    pub storage_quota_bytes: Option<i64>,
    /// Whether the account has administrative privileges.
    pub is_admin: bool,
}

/// Check whether a handle is valid: starts with a letter, then 3-19
/// further alphanumeric characters (4-20 total).
pub fn is_valid_handle(handle: &str) -> bool {
    let mut chars = handle.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    let len = handle.chars().count();
    if !(4..=20).contains(&len) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric())
}
