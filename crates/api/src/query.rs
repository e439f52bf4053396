//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size for notification listings.
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a client may request.
pub const MAX_LIMIT: i64 = 100;

/// Pagination parameters (`?limit=&offset=`), plus the notification
/// `unread_only` filter.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationListParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Clamp a user-provided limit into `1..=max`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
