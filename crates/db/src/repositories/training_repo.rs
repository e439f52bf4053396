//! Repository for `training_modules`, their sections and prerequisites.
//!
//! Module create and update write the module row, its sections, section
//! resources and prerequisite edges in one transaction.

use std::collections::HashSet;

use salesdesk_core::positions::to_storage;
use salesdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::training::{
    CreateModule, PrerequisiteEdge, SectionInput, TrainingModule, TrainingSection, UpdateModule,
};
use crate::repositories::resource_repo::{ResourceLink, ResourceRepo};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

const MODULE_COLUMNS: &str = "id, title, description, category, visible_to_positions, \
                              is_published, sort_order, created_at, updated_at";

const SECTION_COLUMNS: &str = "id, module_id, title, content, section_order, \
                               estimated_duration, is_optional, created_at, updated_at";

/// Provides CRUD operations for training modules.
pub struct TrainingModuleRepo;

impl TrainingModuleRepo {
    /// Insert a module with its sections and prerequisites.
    ///
    /// Prerequisite ids must already be validated (existence, no cycles).
    pub async fn create(pool: &PgPool, input: &CreateModule) -> Result<TrainingModule, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO training_modules
                (title, description, category, visible_to_positions, is_published, sort_order)
             VALUES ($1, $2, $3, $4, COALESCE($5, false), COALESCE($6, 0))
             RETURNING {MODULE_COLUMNS}"
        );
        let module = sqlx::query_as::<_, TrainingModule>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(to_storage(&input.visible_to_positions))
            .bind(input.is_published)
            .bind(input.sort_order)
            .fetch_one(&mut *tx)
            .await?;

        for section in &input.sections {
            Self::insert_section(&mut tx, module.id, section).await?;
        }
        Self::replace_prerequisites(&mut tx, module.id, &input.prerequisite_ids).await?;

        tx.commit().await?;
        Ok(module)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TrainingModule>, sqlx::Error> {
        let query = format!("SELECT {MODULE_COLUMNS} FROM training_modules WHERE id = $1");
        sqlx::query_as::<_, TrainingModule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All modules ordered by `(sort_order, id)`. Publish and position
    /// filtering happens in `salesdesk_core::selector`.
    pub async fn list(pool: &PgPool) -> Result<Vec<TrainingModule>, sqlx::Error> {
        let query =
            format!("SELECT {MODULE_COLUMNS} FROM training_modules ORDER BY sort_order, id");
        sqlx::query_as::<_, TrainingModule>(&query)
            .fetch_all(pool)
            .await
    }

    /// Partial update. `sections` and `prerequisite_ids`, when present,
    /// replace the existing sets.
    ///
    /// A listed section id that belongs to another module fails the whole
    /// update with `RowNotFound`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateModule,
    ) -> Result<Option<TrainingModule>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE training_modules SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                visible_to_positions = COALESCE($5, visible_to_positions),
                is_published = COALESCE($6, is_published),
                sort_order = COALESCE($7, sort_order)
             WHERE id = $1
             RETURNING {MODULE_COLUMNS}"
        );
        let Some(module) = sqlx::query_as::<_, TrainingModule>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.visible_to_positions.as_deref().map(to_storage))
            .bind(input.is_published)
            .bind(input.sort_order)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(sections) = &input.sections {
            Self::replace_sections(&mut tx, module.id, sections).await?;
        }
        if let Some(prerequisite_ids) = &input.prerequisite_ids {
            Self::replace_prerequisites(&mut tx, module.id, prerequisite_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(module))
    }

    /// Set `is_published`. Returns `None` if the module does not exist.
    pub async fn set_published(
        pool: &PgPool,
        id: DbId,
        published: bool,
    ) -> Result<Option<TrainingModule>, sqlx::Error> {
        let query = format!(
            "UPDATE training_modules SET is_published = $2 WHERE id = $1 RETURNING {MODULE_COLUMNS}"
        );
        sqlx::query_as::<_, TrainingModule>(&query)
            .bind(id)
            .bind(published)
            .fetch_optional(pool)
            .await
    }

    /// Delete a module. Sections, progress and prerequisite edges cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM training_modules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    pub async fn find_section(
        pool: &PgPool,
        section_id: DbId,
    ) -> Result<Option<TrainingSection>, sqlx::Error> {
        let query = format!("SELECT {SECTION_COLUMNS} FROM training_sections WHERE id = $1");
        sqlx::query_as::<_, TrainingSection>(&query)
            .bind(section_id)
            .fetch_optional(pool)
            .await
    }

    /// Sections of a module in display order.
    pub async fn sections_for_module(
        pool: &PgPool,
        module_id: DbId,
    ) -> Result<Vec<TrainingSection>, sqlx::Error> {
        let query = format!(
            "SELECT {SECTION_COLUMNS} FROM training_sections
             WHERE module_id = $1
             ORDER BY section_order, id"
        );
        sqlx::query_as::<_, TrainingSection>(&query)
            .bind(module_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Prerequisites
    // -----------------------------------------------------------------------

    /// Every prerequisite edge in the catalogue.
    pub async fn prerequisite_edges(pool: &PgPool) -> Result<Vec<PrerequisiteEdge>, sqlx::Error> {
        sqlx::query_as::<_, PrerequisiteEdge>(
            "SELECT module_id, prerequisite_id FROM training_module_prerequisites
             ORDER BY module_id, prerequisite_id",
        )
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn insert_section(
        tx: &mut Tx<'_>,
        module_id: DbId,
        input: &SectionInput,
    ) -> Result<TrainingSection, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_sections
                (module_id, title, content, section_order, estimated_duration, is_optional)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, false))
             RETURNING {SECTION_COLUMNS}"
        );
        let section = sqlx::query_as::<_, TrainingSection>(&query)
            .bind(module_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.section_order)
            .bind(input.estimated_duration)
            .bind(input.is_optional)
            .fetch_one(&mut **tx)
            .await?;

        if !input.resource_ids.is_empty() {
            ResourceRepo::replace_links(
                tx,
                ResourceLink::TrainingSection,
                section.id,
                &input.resource_ids,
            )
            .await?;
        }
        Ok(section)
    }

    /// Make the module's sections match `inputs`: listed ids are
    /// overwritten, new entries inserted, unlisted sections deleted.
    ///
    /// `uq_training_sections_module_order` is deferred, so orders may be
    /// swapped within one call.
    async fn replace_sections(
        tx: &mut Tx<'_>,
        module_id: DbId,
        inputs: &[SectionInput],
    ) -> Result<(), sqlx::Error> {
        let existing: HashSet<DbId> =
            sqlx::query_scalar::<_, DbId>("SELECT id FROM training_sections WHERE module_id = $1")
                .bind(module_id)
                .fetch_all(&mut **tx)
                .await?
                .into_iter()
                .collect();

        let kept: Vec<DbId> = inputs.iter().filter_map(|s| s.id).collect();
        if kept.iter().any(|id| !existing.contains(id)) {
            return Err(sqlx::Error::RowNotFound);
        }

        let removed = sqlx::query(
            "DELETE FROM training_sections WHERE module_id = $1 AND NOT (id = ANY($2))",
        )
        .bind(module_id)
        .bind(&kept)
        .execute(&mut **tx)
        .await?
        .rows_affected();
        if removed > 0 {
            tracing::debug!(module_id, removed, "Dropped sections missing from module update");
        }

        let update_query = "UPDATE training_sections SET
                title = $2,
                content = $3,
                section_order = $4,
                estimated_duration = $5,
                is_optional = COALESCE($6, is_optional)
             WHERE id = $1";

        for input in inputs {
            match input.id {
                Some(section_id) => {
                    sqlx::query(update_query)
                        .bind(section_id)
                        .bind(&input.title)
                        .bind(&input.content)
                        .bind(input.section_order)
                        .bind(input.estimated_duration)
                        .bind(input.is_optional)
                        .execute(&mut **tx)
                        .await?;
                    ResourceRepo::replace_links(
                        tx,
                        ResourceLink::TrainingSection,
                        section_id,
                        &input.resource_ids,
                    )
                    .await?;
                }
                None => {
                    Self::insert_section(tx, module_id, input).await?;
                }
            }
        }

        Ok(())
    }

    async fn replace_prerequisites(
        tx: &mut Tx<'_>,
        module_id: DbId,
        prerequisite_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM training_module_prerequisites WHERE module_id = $1")
            .bind(module_id)
            .execute(&mut **tx)
            .await?;

        for &prerequisite_id in prerequisite_ids {
            sqlx::query(
                "INSERT INTO training_module_prerequisites (module_id, prerequisite_id)
                 VALUES ($1, $2)",
            )
            .bind(module_id)
            .bind(prerequisite_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
