//! Repository for module-level `training_progress` rows.

use salesdesk_core::progress::{
    ProgressStatus, STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_NOT_STARTED,
};
use salesdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::training::TrainingProgress;

const COLUMNS: &str = "id, user_id, module_id, status, started_at, completed_at, notes, \
                       percent_complete, created_at, updated_at";

/// Provides the state-machine writes for training modules.
pub struct TrainingProgressRepo;

impl TrainingProgressRepo {
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        module_id: DbId,
    ) -> Result<Option<TrainingProgress>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM training_progress WHERE user_id = $1 AND module_id = $2");
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(user_id)
            .bind(module_id)
            .fetch_optional(pool)
            .await
    }

    /// Every module record of a user.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<TrainingProgress>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM training_progress WHERE user_id = $1");
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every user's record for one module.
    pub async fn list_for_module(
        pool: &PgPool,
        module_id: DbId,
    ) -> Result<Vec<TrainingProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM training_progress WHERE module_id = $1 ORDER BY user_id"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(module_id)
            .fetch_all(pool)
            .await
    }

    /// Create an `IN_PROGRESS` record or promote a `NOT_STARTED` one.
    /// Returns `None` when the module was already started or completed.
    pub async fn start(
        pool: &PgPool,
        user_id: DbId,
        module_id: DbId,
    ) -> Result<Option<TrainingProgress>, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_progress (user_id, module_id, status, started_at)
             VALUES ($1, $2, '{STATUS_IN_PROGRESS}', NOW())
             ON CONFLICT (user_id, module_id) DO UPDATE SET
                status = '{STATUS_IN_PROGRESS}',
                started_at = COALESCE(training_progress.started_at, NOW())
             WHERE training_progress.status = '{STATUS_NOT_STARTED}'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(user_id)
            .bind(module_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert a `COMPLETED` record at 100 percent, replacing `notes`.
    pub async fn complete(
        pool: &PgPool,
        user_id: DbId,
        module_id: DbId,
        notes: Option<&str>,
    ) -> Result<TrainingProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_progress
                (user_id, module_id, status, started_at, completed_at, notes, percent_complete)
             VALUES ($1, $2, '{STATUS_COMPLETED}', NOW(), NOW(), $3, 100)
             ON CONFLICT (user_id, module_id) DO UPDATE SET
                status = '{STATUS_COMPLETED}',
                started_at = COALESCE(training_progress.started_at, NOW()),
                completed_at = NOW(),
                notes = EXCLUDED.notes,
                percent_complete = 100
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(user_id)
            .bind(module_id)
            .bind(notes)
            .fetch_one(pool)
            .await
    }

    /// Write the rolled-up status and percent after a section transition.
    ///
    /// `completed_at` is kept while the module stays completed and cleared
    /// when it is reopened.
    pub async fn sync_rollup(
        pool: &PgPool,
        user_id: DbId,
        module_id: DbId,
        status: ProgressStatus,
        percent_complete: i32,
    ) -> Result<TrainingProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_progress
                (user_id, module_id, status, started_at, completed_at, percent_complete)
             VALUES ($1, $2, $3::TEXT, NOW(),
                     CASE WHEN $3::TEXT = '{STATUS_COMPLETED}' THEN NOW() END, $4)
             ON CONFLICT (user_id, module_id) DO UPDATE SET
                status = EXCLUDED.status,
                started_at = COALESCE(training_progress.started_at, NOW()),
                completed_at = CASE WHEN EXCLUDED.status = '{STATUS_COMPLETED}'
                                    THEN COALESCE(training_progress.completed_at, NOW())
                               END,
                percent_complete = EXCLUDED.percent_complete
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(user_id)
            .bind(module_id)
            .bind(status.as_str())
            .bind(percent_complete)
            .fetch_one(pool)
            .await
    }

    /// Delete the module record together with the user's section progress
    /// for that module. Returns `true` if anything was removed.
    pub async fn reset(pool: &PgPool, user_id: DbId, module_id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sections = sqlx::query(
            "DELETE FROM training_section_progress
             WHERE user_id = $1
               AND section_id IN (SELECT id FROM training_sections WHERE module_id = $2)",
        )
        .bind(user_id)
        .bind(module_id)
        .execute(&mut *tx)
        .await?;

        let module = sqlx::query(
            "DELETE FROM training_progress WHERE user_id = $1 AND module_id = $2",
        )
        .bind(user_id)
        .bind(module_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(sections.rows_affected() + module.rows_affected() > 0)
    }
}
