//! Role lookup rows.

use salesdesk_core::roles;
use salesdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `roles` table (seeded: admin, manager, employee).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.name)
    }
}
