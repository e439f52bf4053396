//! Handlers for training modules, their sections and module/section progress.
//!
//! Prerequisite gating is advisory: listings report `is_unlocked`, but a
//! locked module can still be started or completed.

use std::collections::{HashMap, HashSet};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use salesdesk_core::error::CoreError;
use salesdesk_core::progress::{plan, ProgressAction, ProgressStatus, Transition};
use salesdesk_core::selector::{can_view_module, prerequisites_met, validate_prerequisites};
use salesdesk_core::stats::{
    compute_stats, module_percent, module_rollup, next_step, rollup_after_content_change,
    ProgressStats, StepEstimate,
};
use salesdesk_core::types::{DbId, Timestamp};
use salesdesk_core::validation::{validate_duration, validate_orders, validate_title};
use salesdesk_db::models::notification::{CreateNotification, KIND_MODULE_COMPLETED};
use salesdesk_db::models::progress::CompleteProgress;
use salesdesk_db::models::resource::Resource;
use salesdesk_db::models::training::{
    CreateModule, SectionInput, TrainingModule, TrainingProgress, TrainingSection, UpdateModule,
};
use salesdesk_db::repositories::{
    ProgressRepo, ProgressScope, ResourceLink, ResourceRepo, TrainingModuleRepo,
    TrainingProgressRepo,
};
use salesdesk_db::DbPool;
use serde::Serialize;

use super::notification::notify;
use super::progress::{apply_transition, completion_notes, group_resources, status_map, ItemProgress};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The caller's module-level record, or the implicit `NOT_STARTED` state.
#[derive(Debug, Serialize)]
pub struct ModuleProgress {
    pub status: ProgressStatus,
    pub percent_complete: i32,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
}

impl ModuleProgress {
    fn from_record(record: Option<&TrainingProgress>) -> AppResult<Self> {
        Ok(match record {
            Some(r) => Self {
                status: r.parsed_status()?,
                percent_complete: r.percent_complete,
                started_at: r.started_at,
                completed_at: r.completed_at,
                notes: r.notes.clone(),
            },
            None => Self {
                status: ProgressStatus::NotStarted,
                percent_complete: 0,
                started_at: None,
                completed_at: None,
                notes: None,
            },
        })
    }
}

/// One entry of the module listing.
#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    #[serde(flatten)]
    pub module: TrainingModule,
    pub prerequisite_ids: Vec<DbId>,
    pub is_unlocked: bool,
    pub progress: ModuleProgress,
}

/// A section together with the caller's progress and its resources.
#[derive(Debug, Serialize)]
pub struct SectionView {
    #[serde(flatten)]
    pub section: TrainingSection,
    pub progress: ItemProgress,
    pub resources: Vec<Resource>,
}

/// A module with its ordered sections and the caller's statistics.
#[derive(Debug, Serialize)]
pub struct ModuleDetail {
    #[serde(flatten)]
    pub module: TrainingModule,
    pub prerequisite_ids: Vec<DbId>,
    pub is_unlocked: bool,
    pub progress: ModuleProgress,
    pub sections: Vec<SectionView>,
    pub stats: ProgressStats,
    pub next_section_id: Option<DbId>,
}

/// Result of a section transition.
#[derive(Debug, Serialize)]
pub struct SectionTransition {
    pub section_id: DbId,
    #[serde(flatten)]
    pub progress: ItemProgress,
    pub module: ModuleProgress,
}

// ---------------------------------------------------------------------------
// Listing and detail
// ---------------------------------------------------------------------------

/// GET /api/v1/training/modules
pub async fn list_modules(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ModuleSummary>>>> {
    let summaries = module_summaries(&state.pool, &auth).await?;
    Ok(Json(DataResponse { data: summaries }))
}

/// GET /api/v1/training/modules/available
///
/// Visible modules whose prerequisites the caller has completed.
pub async fn list_available_modules(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ModuleSummary>>>> {
    let summaries = module_summaries(&state.pool, &auth)
        .await?
        .into_iter()
        .filter(|m| m.is_unlocked)
        .collect();
    Ok(Json(DataResponse { data: summaries }))
}

/// GET /api/v1/training/modules/{id}
pub async fn get_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ModuleDetail>>> {
    let module = find_visible_module(&state.pool, &auth, id).await?;

    let sections = TrainingModuleRepo::sections_for_module(&state.pool, id).await?;
    let ids: Vec<DbId> = sections.iter().map(|s| s.id).collect();
    let records = ProgressRepo::list_for_user_items(
        &state.pool,
        ProgressScope::TrainingSection,
        auth.user_id,
        &ids,
    )
    .await?;
    let statuses = status_map(&records)?;
    let mut resources = group_resources(
        ResourceRepo::linked_to(&state.pool, ResourceLink::TrainingSection, &ids).await?,
    );

    let estimates: Vec<StepEstimate> = sections.iter().map(TrainingSection::estimate).collect();
    let stats = compute_stats(&estimates, &statuses);
    let next_section_id = next_step(&estimates, &statuses);

    let prerequisites = prerequisite_graph(&state.pool).await?;
    let prerequisite_ids = prerequisites.get(&id).cloned().unwrap_or_default();
    let completed = completed_modules(&state.pool, auth.user_id).await?;
    let own = TrainingProgressRepo::find(&state.pool, auth.user_id, id).await?;

    let sections = sections
        .into_iter()
        .map(|section| {
            let record = records.iter().find(|r| r.item_id == section.id);
            Ok(SectionView {
                progress: ItemProgress::from_record(record)?,
                resources: resources.remove(&section.id).unwrap_or_default(),
                section,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(DataResponse {
        data: ModuleDetail {
            module,
            is_unlocked: prerequisites_met(&prerequisite_ids, &completed),
            prerequisite_ids,
            progress: ModuleProgress::from_record(own.as_ref())?,
            sections,
            stats,
            next_section_id,
        },
    }))
}

// ---------------------------------------------------------------------------
// Content administration
// ---------------------------------------------------------------------------

/// POST /api/v1/training/modules
///
/// Creates the module, its sections and prerequisite edges together.
pub async fn create_module(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateModule>,
) -> AppResult<impl IntoResponse> {
    validate_title("Title", &input.title)?;
    validate_sections(&input.sections)?;

    let graph = prerequisite_graph(&state.pool).await?;
    validate_prerequisites(None, &input.prerequisite_ids, &graph)?;

    let module = TrainingModuleRepo::create(&state.pool, &input).await?;
    tracing::info!(
        admin_id = admin.user_id,
        module_id = module.id,
        sections = input.sections.len(),
        "Training module created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: module })))
}

/// PUT /api/v1/training/modules/{id}
///
/// `sections` and `prerequisite_ids`, when present, replace the existing
/// sets. Any failure leaves the module as it was.
pub async fn update_module(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateModule>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_title("Title", title)?;
    }
    if let Some(sections) = &input.sections {
        validate_sections(sections)?;
    }

    let graph = prerequisite_graph(&state.pool).await?;
    if !graph.contains_key(&id) {
        return Err(module_not_found(id));
    }
    if let Some(prerequisite_ids) = &input.prerequisite_ids {
        validate_prerequisites(Some(id), prerequisite_ids, &graph)?;
    }

    let module = TrainingModuleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| module_not_found(id))?;
    if let Some(sections) = &input.sections {
        let sections_added = sections.iter().any(|s| s.id.is_none());
        refresh_module_rollups(&state.pool, id, sections_added).await?;
    }
    tracing::info!(admin_id = admin.user_id, module_id = id, "Training module updated");
    Ok(Json(DataResponse { data: module }))
}

/// POST /api/v1/training/modules/{id}/publish
pub async fn publish_module(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    set_published(&state.pool, admin.user_id, id, true).await
}

/// POST /api/v1/training/modules/{id}/unpublish
pub async fn unpublish_module(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    set_published(&state.pool, admin.user_id, id, false).await
}

/// DELETE /api/v1/training/modules/{id}
///
/// Sections, prerequisite edges and all progress on the module go with it.
pub async fn delete_module(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if TrainingModuleRepo::delete(&state.pool, id).await? {
        tracing::info!(admin_id = admin.user_id, module_id = id, "Training module deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(module_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Module progress
// ---------------------------------------------------------------------------

/// POST /api/v1/training/modules/{id}/start
pub async fn start_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ModuleProgress>>> {
    find_visible_module(&state.pool, &auth, id).await?;

    let existing = TrainingProgressRepo::find(&state.pool, auth.user_id, id).await?;
    let previous = existing
        .as_ref()
        .map(TrainingProgress::parsed_status)
        .transpose()?;

    let record = match plan(previous, Transition::Start) {
        ProgressAction::Create(_) | ProgressAction::Update(_) => {
            match TrainingProgressRepo::start(&state.pool, auth.user_id, id).await? {
                Some(record) => Some(record),
                None => TrainingProgressRepo::find(&state.pool, auth.user_id, id).await?,
            }
        }
        ProgressAction::Delete | ProgressAction::NoOp => existing,
    };

    tracing::info!(user_id = auth.user_id, module_id = id, "Training module started");
    Ok(Json(DataResponse {
        data: ModuleProgress::from_record(record.as_ref())?,
    }))
}

/// POST /api/v1/training/modules/{id}/complete
///
/// Accepted from any state. Sets the module to 100 percent regardless of its
/// sections and notifies the user on the first completion.
pub async fn complete_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<CompleteProgress>>,
) -> AppResult<Json<DataResponse<ModuleProgress>>> {
    let notes = completion_notes(body.map(|Json(b)| b))?;
    let module = find_visible_module(&state.pool, &auth, id).await?;

    let previous = TrainingProgressRepo::find(&state.pool, auth.user_id, id)
        .await?
        .map(|r| r.parsed_status())
        .transpose()?;

    let record =
        TrainingProgressRepo::complete(&state.pool, auth.user_id, id, notes.as_deref()).await?;
    tracing::info!(user_id = auth.user_id, module_id = id, "Training module completed");

    if previous != Some(ProgressStatus::Completed) {
        notify_module_completed(&state.pool, auth.user_id, &module).await;
    }

    Ok(Json(DataResponse {
        data: ModuleProgress::from_record(Some(&record))?,
    }))
}

/// POST /api/v1/training/modules/{id}/reset
///
/// Clears the module record and the caller's section progress in it.
/// Idempotent.
pub async fn reset_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_visible_module(&state.pool, &auth, id).await?;
    let removed = TrainingProgressRepo::reset(&state.pool, auth.user_id, id).await?;
    tracing::info!(user_id = auth.user_id, module_id = id, removed, "Training module reset");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Section progress
// ---------------------------------------------------------------------------

/// POST /api/v1/training/sections/{id}/start
pub async fn start_section(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SectionTransition>>> {
    section_transition(&state.pool, &auth, id, Transition::Start, None)
        .await
        .map(|data| Json(DataResponse { data }))
}

/// POST /api/v1/training/sections/{id}/complete
pub async fn complete_section(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<CompleteProgress>>,
) -> AppResult<Json<DataResponse<SectionTransition>>> {
    let notes = completion_notes(body.map(|Json(b)| b))?;
    section_transition(&state.pool, &auth, id, Transition::Complete, notes.as_deref())
        .await
        .map(|data| Json(DataResponse { data }))
}

/// POST /api/v1/training/sections/{id}/reset
pub async fn reset_section(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    section_transition(&state.pool, &auth, id, Transition::Reset, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn module_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "TrainingModule",
        id,
    })
}

/// Re-derive every stored module record after the module's sections were
/// replaced.
async fn refresh_module_rollups(
    pool: &DbPool,
    module_id: DbId,
    sections_added: bool,
) -> AppResult<()> {
    let records = TrainingProgressRepo::list_for_module(pool, module_id).await?;
    if records.is_empty() {
        return Ok(());
    }

    let sections = TrainingModuleRepo::sections_for_module(pool, module_id).await?;
    let estimates: Vec<StepEstimate> = sections.iter().map(TrainingSection::estimate).collect();
    let ids: Vec<DbId> = sections.iter().map(|s| s.id).collect();
    let section_records =
        ProgressRepo::list_for_items(pool, ProgressScope::TrainingSection, &ids).await?;

    let mut changed = 0_usize;
    for record in &records {
        let own: Vec<_> = section_records
            .iter()
            .filter(|r| r.user_id == record.user_id)
            .cloned()
            .collect();
        let stats = compute_stats(&estimates, &status_map(&own)?);
        let current = record.parsed_status()?;
        let status = rollup_after_content_change(current, &stats, sections_added);
        let percent = module_percent(status, &stats);
        if status == current && percent == record.percent_complete {
            continue;
        }
        TrainingProgressRepo::sync_rollup(pool, record.user_id, module_id, status, percent).await?;
        changed += 1;
    }

    if changed > 0 {
        tracing::info!(module_id, changed, "Module progress re-derived after section change");
    }
    Ok(())
}

fn validate_sections(sections: &[SectionInput]) -> Result<(), CoreError> {
    for section in sections {
        validate_title("Section title", &section.title)?;
        validate_duration(section.estimated_duration)?;
    }
    let orders: Vec<i32> = sections.iter().map(|s| s.section_order).collect();
    validate_orders(&orders)
}

async fn find_visible_module(pool: &DbPool, auth: &AuthUser, id: DbId) -> AppResult<TrainingModule> {
    let module = TrainingModuleRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| module_not_found(id))?;
    if !can_view_module(&auth.viewer(), module.is_published, &module.positions()?) {
        return Err(module_not_found(id));
    }
    Ok(module)
}

/// Every module id mapped to its prerequisite ids.
async fn prerequisite_graph(pool: &DbPool) -> AppResult<HashMap<DbId, Vec<DbId>>> {
    let mut graph: HashMap<DbId, Vec<DbId>> = TrainingModuleRepo::list(pool)
        .await?
        .into_iter()
        .map(|m| (m.id, Vec::new()))
        .collect();
    for edge in TrainingModuleRepo::prerequisite_edges(pool).await? {
        graph
            .entry(edge.module_id)
            .or_default()
            .push(edge.prerequisite_id);
    }
    Ok(graph)
}

async fn completed_modules(pool: &DbPool, user_id: DbId) -> AppResult<HashSet<DbId>> {
    let mut completed = HashSet::new();
    for record in TrainingProgressRepo::list_for_user(pool, user_id).await? {
        if record.parsed_status()?.is_completed() {
            completed.insert(record.module_id);
        }
    }
    Ok(completed)
}

async fn module_summaries(pool: &DbPool, auth: &AuthUser) -> AppResult<Vec<ModuleSummary>> {
    let viewer = auth.viewer();
    let graph = prerequisite_graph(pool).await?;
    let own: HashMap<DbId, TrainingProgress> = TrainingProgressRepo::list_for_user(pool, auth.user_id)
        .await?
        .into_iter()
        .map(|r| (r.module_id, r))
        .collect();
    let mut completed = HashSet::new();
    for record in own.values() {
        if record.parsed_status()?.is_completed() {
            completed.insert(record.module_id);
        }
    }

    let mut summaries = Vec::new();
    for module in TrainingModuleRepo::list(pool).await? {
        if !can_view_module(&viewer, module.is_published, &module.positions()?) {
            continue;
        }
        let prerequisite_ids = graph.get(&module.id).cloned().unwrap_or_default();
        summaries.push(ModuleSummary {
            is_unlocked: prerequisites_met(&prerequisite_ids, &completed),
            progress: ModuleProgress::from_record(own.get(&module.id))?,
            prerequisite_ids,
            module,
        });
    }
    Ok(summaries)
}

async fn set_published(
    pool: &DbPool,
    admin_id: DbId,
    id: DbId,
    published: bool,
) -> AppResult<Json<DataResponse<TrainingModule>>> {
    let module = TrainingModuleRepo::set_published(pool, id, published)
        .await?
        .ok_or_else(|| module_not_found(id))?;
    tracing::info!(admin_id, module_id = id, published, "Training module publish state changed");
    Ok(Json(DataResponse { data: module }))
}

/// Apply a section transition, then roll the module record up from the
/// module's recomputed section statistics.
async fn section_transition(
    pool: &DbPool,
    auth: &AuthUser,
    section_id: DbId,
    transition: Transition,
    notes: Option<&str>,
) -> AppResult<SectionTransition> {
    let section = TrainingModuleRepo::find_section(pool, section_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TrainingSection",
            id: section_id,
        }))?;
    let module = find_visible_module(pool, auth, section.module_id).await?;

    let applied = apply_transition(
        pool,
        ProgressScope::TrainingSection,
        auth.user_id,
        section_id,
        transition,
        notes,
    )
    .await?;

    let sections = TrainingModuleRepo::sections_for_module(pool, module.id).await?;
    let ids: Vec<DbId> = sections.iter().map(|s| s.id).collect();
    let records =
        ProgressRepo::list_for_user_items(pool, ProgressScope::TrainingSection, auth.user_id, &ids)
            .await?;
    let estimates: Vec<StepEstimate> = sections.iter().map(TrainingSection::estimate).collect();
    let stats = compute_stats(&estimates, &status_map(&records)?);

    let current = TrainingProgressRepo::find(pool, auth.user_id, module.id).await?;
    let current_status = current
        .as_ref()
        .map(TrainingProgress::parsed_status)
        .transpose()?;

    let module_record = match module_rollup(current_status, &stats, transition) {
        Some(status) => {
            let percent = module_percent(status, &stats);
            let record =
                TrainingProgressRepo::sync_rollup(pool, auth.user_id, module.id, status, percent)
                    .await?;
            if status.is_completed() && current_status != Some(ProgressStatus::Completed) {
                tracing::info!(
                    user_id = auth.user_id,
                    module_id = module.id,
                    "Training module completed through its sections"
                );
                notify_module_completed(pool, auth.user_id, &module).await;
            }
            Some(record)
        }
        None => current,
    };

    Ok(SectionTransition {
        section_id,
        progress: ItemProgress::from_record(applied.record.as_ref())?,
        module: ModuleProgress::from_record(module_record.as_ref())?,
    })
}

async fn notify_module_completed(pool: &DbPool, user_id: DbId, module: &TrainingModule) {
    notify(
        pool,
        CreateNotification {
            user_id,
            kind: KIND_MODULE_COMPLETED,
            title: format!("Training complete: {}", module.title),
            body: None,
        },
    )
    .await;
}
