//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_EMPLOYEE: &str = "employee";

/// Role id assigned to self-registered accounts.
pub const DEFAULT_ROLE_ID: i64 = 3;

/// Whether the role bypasses visibility and publish filters.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN
}
