//! File lifecycle services.

pub mod admission;
pub mod service;

pub use admission::UploadAdmissionService;
pub use service::FileRecordService;
