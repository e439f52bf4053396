//! Per-user progress rows for onboarding steps and training sections.
//!
//! Both tables share one shape; the item column (`step_id` or `section_id`)
//! is aliased to `item_id` when selected.

use salesdesk_core::error::CoreError;
use salesdesk_core::progress::ProgressStatus;
use salesdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `onboarding_progress` or `training_section_progress`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgressRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub item_id: DbId,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProgressRecord {
    pub fn parsed_status(&self) -> Result<ProgressStatus, CoreError> {
        ProgressStatus::from_str_value(&self.status)
    }
}

/// Request body for a `complete` transition.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteProgress {
    pub notes: Option<String>,
}
