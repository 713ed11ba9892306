//! Request context carrying the acting account.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current request.
///
/// Built by the embedding request layer after authentication and passed
/// into service methods so that every operation knows *who* is acting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting account's ID.
    pub actor_id: Uuid,
    /// Whether the acting account has administrative privileges.
    pub is_admin: bool,
}

impl RequestContext {
    /// Creates a context for a regular account.
    pub fn new(actor_id: Uuid) -> Self {
        Self {
            actor_id,
            is_admin: false,
        }
    }

    /// Creates a context for an administrator.
    pub fn admin(actor_id: Uuid) -> Self {
        Self {
            actor_id,
            is_admin: true,
        }
    }

    /// Whether the actor may operate on resources owned by `owner_id`.
    pub fn can_act_on(&self, owner_id: Uuid) -> bool {
        self.is_admin || self.actor_id == owner_id
    }
}
