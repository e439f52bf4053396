//! Repository for per-item progress rows (`onboarding_progress` and
//! `training_section_progress`).
//!
//! Every write is a single statement keyed on the `(user, item)` unique
//! constraint, so concurrent transitions resolve last-write-wins.

use salesdesk_core::progress::{STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_NOT_STARTED};
use salesdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::progress::ProgressRecord;

/// Which progress table a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressScope {
    OnboardingStep,
    TrainingSection,
}

impl ProgressScope {
    pub fn table(self) -> &'static str {
        match self {
            Self::OnboardingStep => "onboarding_progress",
            Self::TrainingSection => "training_section_progress",
        }
    }

    fn item_column(self) -> &'static str {
        match self {
            Self::OnboardingStep => "step_id",
            Self::TrainingSection => "section_id",
        }
    }

    fn columns(self) -> String {
        format!(
            "id, user_id, {} AS item_id, status, started_at, completed_at, notes, \
             created_at, updated_at",
            self.item_column()
        )
    }
}

/// Provides the state-machine writes for step and section progress.
pub struct ProgressRepo;

impl ProgressRepo {
    /// The stored record for `(user_id, item_id)`, if any.
    pub async fn find(
        pool: &PgPool,
        scope: ProgressScope,
        user_id: DbId,
        item_id: DbId,
    ) -> Result<Option<ProgressRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND {} = $2",
            scope.columns(),
            scope.table(),
            scope.item_column()
        );
        sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// A user's records for any of `item_ids`. Items without a record are
    /// simply absent from the result.
    pub async fn list_for_user_items(
        pool: &PgPool,
        scope: ProgressScope,
        user_id: DbId,
        item_ids: &[DbId],
    ) -> Result<Vec<ProgressRecord>, sqlx::Error> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND {} = ANY($2)",
            scope.columns(),
            scope.table(),
            scope.item_column()
        );
        sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(user_id)
            .bind(item_ids)
            .fetch_all(pool)
            .await
    }

    /// Every user's records for any of `item_ids`.
    pub async fn list_for_items(
        pool: &PgPool,
        scope: ProgressScope,
        item_ids: &[DbId],
    ) -> Result<Vec<ProgressRecord>, sqlx::Error> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM {} WHERE {} = ANY($1) ORDER BY user_id",
            scope.columns(),
            scope.table(),
            scope.item_column()
        );
        sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(item_ids)
            .fetch_all(pool)
            .await
    }

    /// Create an `IN_PROGRESS` record, or promote an explicit `NOT_STARTED`
    /// one.
    ///
    /// Returns `None` when a record already exists past `NOT_STARTED`; the
    /// stored row is left untouched in that case.
    pub async fn mark_started(
        pool: &PgPool,
        scope: ProgressScope,
        user_id: DbId,
        item_id: DbId,
    ) -> Result<Option<ProgressRecord>, sqlx::Error> {
        let table = scope.table();
        let item = scope.item_column();
        let query = format!(
            "INSERT INTO {table} (user_id, {item}, status, started_at)
             VALUES ($1, $2, '{STATUS_IN_PROGRESS}', NOW())
             ON CONFLICT (user_id, {item}) DO UPDATE SET
                status = '{STATUS_IN_PROGRESS}',
                started_at = COALESCE({table}.started_at, NOW())
             WHERE {table}.status = '{STATUS_NOT_STARTED}'
             RETURNING {}",
            scope.columns()
        );
        sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert a `COMPLETED` record, stamping `completed_at` and replacing
    /// `notes`. A missing record is created directly as completed.
    pub async fn mark_completed(
        pool: &PgPool,
        scope: ProgressScope,
        user_id: DbId,
        item_id: DbId,
        notes: Option<&str>,
    ) -> Result<ProgressRecord, sqlx::Error> {
        let table = scope.table();
        let item = scope.item_column();
        let query = format!(
            "INSERT INTO {table} (user_id, {item}, status, started_at, completed_at, notes)
             VALUES ($1, $2, '{STATUS_COMPLETED}', NOW(), NOW(), $3)
             ON CONFLICT (user_id, {item}) DO UPDATE SET
                status = '{STATUS_COMPLETED}',
                started_at = COALESCE({table}.started_at, NOW()),
                completed_at = NOW(),
                notes = EXCLUDED.notes
             RETURNING {}",
            scope.columns()
        );
        sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(user_id)
            .bind(item_id)
            .bind(notes)
            .fetch_one(pool)
            .await
    }

    /// Delete the record. Returns `true` if one existed.
    pub async fn delete(
        pool: &PgPool,
        scope: ProgressScope,
        user_id: DbId,
        item_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            scope.table(),
            scope.item_column()
        );
        let result = sqlx::query(&query)
            .bind(user_id)
            .bind(item_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
