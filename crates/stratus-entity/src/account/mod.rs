//! Account entity and quota usage value object.

pub mod model;
pub mod usage;

pub use model::{Account, CreateAccount, is_valid_handle};
pub use usage::StorageUsage;
