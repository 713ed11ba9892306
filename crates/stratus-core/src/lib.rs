//! # stratus-core
//!
//! Core crate for Stratus, a multi-tenant cloud file-storage backend.
//! Contains the storage and repository traits, configuration schemas,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Stratus crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
