//! Storage usage value object.

use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of an account's storage accounting.
///
/// Always computed from a fresh aggregation over live file records;
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Total quota in bytes.
    pub quota_bytes: i64,
    /// Currently used bytes (sum over live records).
    pub used_bytes: i64,
    /// Available bytes, floored at zero.
    pub available_bytes: i64,
    /// Usage percentage (0.0 - 100.0).
    pub usage_percent: f64,
}

impl StorageUsage {
    /// Create a usage snapshot from quota and used values.
    pub fn new(quota_bytes: i64, used_bytes: i64) -> Self {
        let available_bytes = (quota_bytes - used_bytes).max(0);
        let usage_percent = if quota_bytes == 0 {
            0.0
        } else {
            (used_bytes as f64 / quota_bytes as f64) * 100.0
        };

        Self {
            quota_bytes,
            used_bytes,
            available_bytes,
            usage_percent,
        }
    }

    /// Check if adding the given number of bytes would exceed the quota.
    pub fn would_exceed(&self, additional_bytes: i64) -> bool {
        (self.used_bytes + additional_bytes) > self.quota_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_floored_at_zero() {
        let usage = StorageUsage::new(1000, 1200);
        assert_eq!(usage.available_bytes, 0);
    }

    #[test]
    fn test_would_exceed() {
        let usage = StorageUsage::new(1000, 600);
        assert!(!usage.would_exceed(400));
        assert!(usage.would_exceed(401));
    }

    #[test]
    fn test_zero_quota_percent() {
        let usage = StorageUsage::new(0, 0);
        assert_eq!(usage.usage_percent, 0.0);
    }
}
