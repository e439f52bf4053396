//! Repositories for `onboarding_tracks` and `onboarding_steps`.

use salesdesk_core::positions::to_storage;
use salesdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::onboarding::{
    CreateStep, CreateTrack, OnboardingStep, OnboardingTrack, UpdateStep, UpdateTrack,
};
use crate::repositories::resource_repo::{ResourceLink, ResourceRepo};

const TRACK_COLUMNS: &str =
    "id, name, description, for_positions, is_active, sort_order, created_at, updated_at";

const STEP_COLUMNS: &str = "id, track_id, title, description, instructions, step_order, \
                            estimated_duration, is_required, created_at, updated_at";

/// Provides CRUD operations for onboarding tracks.
///
/// Listing returns every track; position and activity filtering happens in
/// `salesdesk_core::selector`.
pub struct OnboardingTrackRepo;

impl OnboardingTrackRepo {
    pub async fn create(pool: &PgPool, input: &CreateTrack) -> Result<OnboardingTrack, sqlx::Error> {
        let query = format!(
            "INSERT INTO onboarding_tracks (name, description, for_positions, is_active, sort_order)
             VALUES ($1, $2, $3, COALESCE($4, true), COALESCE($5, 0))
             RETURNING {TRACK_COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingTrack>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(to_storage(&input.for_positions))
            .bind(input.is_active)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OnboardingTrack>, sqlx::Error> {
        let query = format!("SELECT {TRACK_COLUMNS} FROM onboarding_tracks WHERE id = $1");
        sqlx::query_as::<_, OnboardingTrack>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All tracks ordered by `(sort_order, id)`.
    pub async fn list(pool: &PgPool) -> Result<Vec<OnboardingTrack>, sqlx::Error> {
        let query =
            format!("SELECT {TRACK_COLUMNS} FROM onboarding_tracks ORDER BY sort_order, id");
        sqlx::query_as::<_, OnboardingTrack>(&query)
            .fetch_all(pool)
            .await
    }

    /// Partial update. `for_positions`, when present, replaces the set.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTrack,
    ) -> Result<Option<OnboardingTrack>, sqlx::Error> {
        let query = format!(
            "UPDATE onboarding_tracks SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                for_positions = COALESCE($4, for_positions),
                is_active = COALESCE($5, is_active),
                sort_order = COALESCE($6, sort_order)
             WHERE id = $1
             RETURNING {TRACK_COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingTrack>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.for_positions.as_deref().map(to_storage))
            .bind(input.is_active)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Delete a track. Steps and their progress cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM onboarding_tracks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Provides CRUD operations for onboarding steps.
pub struct OnboardingStepRepo;

impl OnboardingStepRepo {
    /// Insert a step and its resource links in one transaction.
    pub async fn create(
        pool: &PgPool,
        track_id: DbId,
        input: &CreateStep,
    ) -> Result<OnboardingStep, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO onboarding_steps
                (track_id, title, description, instructions, step_order, estimated_duration, is_required)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, true))
             RETURNING {STEP_COLUMNS}"
        );
        let step = sqlx::query_as::<_, OnboardingStep>(&query)
            .bind(track_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.instructions)
            .bind(input.step_order)
            .bind(input.estimated_duration)
            .bind(input.is_required)
            .fetch_one(&mut *tx)
            .await?;

        if !input.resource_ids.is_empty() {
            ResourceRepo::replace_links(
                &mut tx,
                ResourceLink::OnboardingStep,
                step.id,
                &input.resource_ids,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(step)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OnboardingStep>, sqlx::Error> {
        let query = format!("SELECT {STEP_COLUMNS} FROM onboarding_steps WHERE id = $1");
        sqlx::query_as::<_, OnboardingStep>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Steps of a track in display order.
    pub async fn list_for_track(
        pool: &PgPool,
        track_id: DbId,
    ) -> Result<Vec<OnboardingStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM onboarding_steps
             WHERE track_id = $1
             ORDER BY step_order, id"
        );
        sqlx::query_as::<_, OnboardingStep>(&query)
            .bind(track_id)
            .fetch_all(pool)
            .await
    }

    /// Partial update. `resource_ids`, when present, replaces the step's
    /// resources in the same transaction.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStep,
    ) -> Result<Option<OnboardingStep>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE onboarding_steps SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                instructions = COALESCE($4, instructions),
                step_order = COALESCE($5, step_order),
                estimated_duration = COALESCE($6, estimated_duration),
                is_required = COALESCE($7, is_required)
             WHERE id = $1
             RETURNING {STEP_COLUMNS}"
        );
        let step = sqlx::query_as::<_, OnboardingStep>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.instructions)
            .bind(input.step_order)
            .bind(input.estimated_duration)
            .bind(input.is_required)
            .fetch_optional(&mut *tx)
            .await?;

        if let (Some(step), Some(resource_ids)) = (&step, &input.resource_ids) {
            ResourceRepo::replace_links(&mut tx, ResourceLink::OnboardingStep, step.id, resource_ids)
                .await?;
        }

        tx.commit().await?;
        Ok(step)
    }

    /// Delete a step. Its progress rows and resource links cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM onboarding_steps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
