//! Learning resources attached to onboarding steps and training sections.

use salesdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `resources` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: DbId,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A resource joined through a step or section junction table.
///
/// `owner_id` is the step or section id the resource is attached to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LinkedResource {
    #[serde(skip)]
    pub owner_id: DbId,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub resource: Resource,
}

/// DTO for creating a resource.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateResource {
    pub title: String,
    #[validate(url)]
    pub url: String,
    /// One of `document`, `video`, `link`. Defaults to `link`.
    pub resource_type: Option<String>,
}
