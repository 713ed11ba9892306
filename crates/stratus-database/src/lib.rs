//! # stratus-database
//!
//! PostgreSQL connection management, the repository traits that abstract
//! the metadata store, their concrete sqlx implementations, and an
//! in-memory implementation for tests and embedded single-node use.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{AccountRepository, FileRecordRepository};
