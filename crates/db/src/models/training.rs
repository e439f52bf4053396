//! Training module, section, and module-progress models and DTOs.

use salesdesk_core::error::CoreError;
use salesdesk_core::positions::{parse_positions, Position};
use salesdesk_core::progress::ProgressStatus;
use salesdesk_core::stats::StepEstimate;
use salesdesk_core::types::{DbId, Minutes, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `training_modules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrainingModule {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Empty means visible to every position.
    pub visible_to_positions: Vec<String>,
    pub is_published: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrainingModule {
    pub fn positions(&self) -> Result<Vec<Position>, CoreError> {
        parse_positions(&self.visible_to_positions)
    }
}

/// A row from the `training_sections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrainingSection {
    pub id: DbId,
    pub module_id: DbId,
    pub title: String,
    pub content: Option<String>,
    pub section_order: i32,
    pub estimated_duration: Option<Minutes>,
    pub is_optional: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrainingSection {
    pub fn estimate(&self) -> StepEstimate {
        StepEstimate {
            id: self.id,
            estimated_duration: self.estimated_duration,
        }
    }
}

/// A row from the `training_progress` table (one per user and module).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrainingProgress {
    pub id: DbId,
    pub user_id: DbId,
    pub module_id: DbId,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub percent_complete: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrainingProgress {
    pub fn parsed_status(&self) -> Result<ProgressStatus, CoreError> {
        ProgressStatus::from_str_value(&self.status)
    }
}

/// A row from `training_module_prerequisites`.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct PrerequisiteEdge {
    pub module_id: DbId,
    pub prerequisite_id: DbId,
}

/// Section payload used by module create and update.
///
/// On update, entries with an `id` overwrite that section, entries without
/// one are inserted, and existing sections not listed are deleted.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
    pub id: Option<DbId>,
    pub title: String,
    pub content: Option<String>,
    pub section_order: i32,
    pub estimated_duration: Option<Minutes>,
    pub is_optional: Option<bool>,
    #[serde(default)]
    pub resource_ids: Vec<DbId>,
}

/// DTO for creating a module together with its sections and prerequisites.
#[derive(Debug, Deserialize)]
pub struct CreateModule {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub visible_to_positions: Vec<Position>,
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
    #[serde(default)]
    pub prerequisite_ids: Vec<DbId>,
}

/// DTO for updating a module. `sections` and `prerequisite_ids`, when
/// present, replace the existing sets.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateModule {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visible_to_positions: Option<Vec<Position>>,
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
    pub sections: Option<Vec<SectionInput>>,
    pub prerequisite_ids: Option<Vec<DbId>>,
}
