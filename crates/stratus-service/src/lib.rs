//! # stratus-service
//!
//! Business logic service layer for Stratus. Each service orchestrates
//! the metadata repositories and the storage provider to implement one
//! slice of the file-storage core: quota accounting, upload admission,
//! file lifecycle, share links, and account provisioning.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod account;
pub mod context;
pub mod file;
pub mod quota;
pub mod share;

#[cfg(test)]
pub(crate) mod testutil;

pub use account::AccountService;
pub use context::RequestContext;
pub use file::{FileRecordService, UploadAdmissionService};
pub use quota::QuotaLedger;
pub use share::{ShareLinkService, TokenGenerator};
