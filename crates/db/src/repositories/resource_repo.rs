//! Repository for the `resources` table and its step/section junctions.

use salesdesk_core::types::DbId;
use salesdesk_core::validation::RESOURCE_LINK;
use sqlx::PgPool;

use crate::models::resource::{CreateResource, LinkedResource, Resource};

/// Column list for `resources` queries.
const COLUMNS: &str = "id, title, url, resource_type, created_at, updated_at";

/// Same columns qualified with the `r` alias used in junction joins.
const JOINED_COLUMNS: &str =
    "r.id, r.title, r.url, r.resource_type, r.created_at, r.updated_at";

/// Junction table linking resources to an owner (a step or a section).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLink {
    OnboardingStep,
    TrainingSection,
}

impl ResourceLink {
    fn table(self) -> &'static str {
        match self {
            Self::OnboardingStep => "onboarding_step_resources",
            Self::TrainingSection => "training_section_resources",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::OnboardingStep => "step_id",
            Self::TrainingSection => "section_id",
        }
    }
}

/// Provides CRUD operations for learning resources.
pub struct ResourceRepo;

impl ResourceRepo {
    /// Insert a new resource. `resource_type` defaults to `link`.
    pub async fn create(pool: &PgPool, input: &CreateResource) -> Result<Resource, sqlx::Error> {
        let query = format!(
            "INSERT INTO resources (title, url, resource_type)
             VALUES ($1, $2, COALESCE($3, '{RESOURCE_LINK}'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.resource_type)
            .fetch_one(pool)
            .await
    }

    /// List every resource ordered by title.
    pub async fn list(pool: &PgPool) -> Result<Vec<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources ORDER BY title, id");
        sqlx::query_as::<_, Resource>(&query).fetch_all(pool).await
    }

    /// Resources attached to any of `owner_ids`, each tagged with its owner.
    pub async fn linked_to(
        pool: &PgPool,
        link: ResourceLink,
        owner_ids: &[DbId],
    ) -> Result<Vec<LinkedResource>, sqlx::Error> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }
        let table = link.table();
        let owner = link.owner_column();
        let query = format!(
            "SELECT j.{owner} AS owner_id, {JOINED_COLUMNS}
             FROM resources r
             JOIN {table} j ON j.resource_id = r.id
             WHERE j.{owner} = ANY($1)
             ORDER BY r.title, r.id"
        );
        sqlx::query_as::<_, LinkedResource>(&query)
            .bind(owner_ids)
            .fetch_all(pool)
            .await
    }

    /// Replace the resource set of one owner within an existing transaction.
    ///
    /// Unknown resource ids fail on the junction's foreign key.
    pub(crate) async fn replace_links(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        link: ResourceLink,
        owner_id: DbId,
        resource_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let table = link.table();
        let owner = link.owner_column();

        sqlx::query(&format!("DELETE FROM {table} WHERE {owner} = $1"))
            .bind(owner_id)
            .execute(&mut **tx)
            .await?;

        for &resource_id in resource_ids {
            sqlx::query(&format!(
                "INSERT INTO {table} ({owner}, resource_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING"
            ))
            .bind(owner_id)
            .bind(resource_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
