//! Onboarding track and step models and DTOs.

use salesdesk_core::error::CoreError;
use salesdesk_core::positions::{parse_positions, Position};
use salesdesk_core::stats::StepEstimate;
use salesdesk_core::types::{DbId, Minutes, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `onboarding_tracks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnboardingTrack {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Empty means the track applies to every position.
    pub for_positions: Vec<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OnboardingTrack {
    pub fn positions(&self) -> Result<Vec<Position>, CoreError> {
        parse_positions(&self.for_positions)
    }
}

/// A row from the `onboarding_steps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnboardingStep {
    pub id: DbId,
    pub track_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub step_order: i32,
    /// Minutes.
    pub estimated_duration: Option<Minutes>,
    pub is_required: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OnboardingStep {
    pub fn estimate(&self) -> StepEstimate {
        StepEstimate {
            id: self.id,
            estimated_duration: self.estimated_duration,
        }
    }
}

/// DTO for creating a track.
#[derive(Debug, Deserialize)]
pub struct CreateTrack {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub for_positions: Vec<Position>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// DTO for updating a track. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTrack {
    pub name: Option<String>,
    pub description: Option<String>,
    pub for_positions: Option<Vec<Position>>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// DTO for creating a step inside a track (the track id comes from the path).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStep {
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    #[validate(range(min = 0))]
    pub step_order: i32,
    pub estimated_duration: Option<Minutes>,
    pub is_required: Option<bool>,
    #[serde(default)]
    pub resource_ids: Vec<DbId>,
}

/// DTO for updating a step.
///
/// `resource_ids`, when present, replaces the step's resource set.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStep {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    #[validate(range(min = 0))]
    pub step_order: Option<i32>,
    pub estimated_duration: Option<Minutes>,
    pub is_required: Option<bool>,
    pub resource_ids: Option<Vec<DbId>>,
}
