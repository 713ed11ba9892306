//! # stratus-storage
//!
//! Physical storage providers for Stratus. The [`LocalStorageProvider`]
//! implements the `StorageProvider` trait from `stratus-core` on top of
//! the local filesystem.

pub mod local;

pub use local::LocalStorageProvider;
