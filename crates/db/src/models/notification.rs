//! In-app notification model.

use salesdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Sent when every step of a user's onboarding track is completed.
pub const KIND_TRACK_COMPLETED: &str = "onboarding.track_completed";
/// Sent when a user completes a training module.
pub const KIND_MODULE_COMPLETED: &str = "training.module_completed";

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert DTO for a notification.
#[derive(Debug)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub kind: &'static str,
    pub title: String,
    pub body: Option<String>,
}
