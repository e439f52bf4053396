//! Handlers for onboarding tracks, steps, step progress and the resource
//! library.
//!
//! Viewers only ever see tracks that pass
//! [`salesdesk_core::selector::can_view_track`]; content mutations require
//! [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use salesdesk_core::error::CoreError;
use salesdesk_core::progress::{ProgressStatus, Transition};
use salesdesk_core::selector::{can_view_track, select_track, TrackCandidate};
use salesdesk_core::stats::{compute_stats, next_step, ProgressStats, StepEstimate};
use salesdesk_core::types::DbId;
use salesdesk_core::validation::{validate_duration, validate_resource_type, validate_title};
use salesdesk_db::models::notification::{CreateNotification, KIND_TRACK_COMPLETED};
use salesdesk_db::models::onboarding::{
    CreateStep, CreateTrack, OnboardingStep, OnboardingTrack, UpdateStep, UpdateTrack,
};
use salesdesk_db::models::progress::CompleteProgress;
use salesdesk_db::models::resource::{CreateResource, Resource};
use salesdesk_db::repositories::{
    OnboardingStepRepo, OnboardingTrackRepo, ProgressRepo, ProgressScope, ResourceLink,
    ResourceRepo,
};
use salesdesk_db::DbPool;
use serde::Serialize;
use validator::Validate;

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

/// A step together with the caller's progress and its resources.
#[derive(Debug, Serialize)]
pub struct StepView {
    #[serde(flatten)]
    pub step: OnboardingStep,
    pub progress: ItemProgress,
    pub resources: Vec<Resource>,
}

/// A track with its ordered steps and the caller's statistics.
#[derive(Debug, Serialize)]
pub struct TrackDetail {
    #[serde(flatten)]
    pub track: OnboardingTrack,
    pub steps: Vec<StepView>,
    pub stats: ProgressStats,
    /// First step not yet completed. Advisory only.
    pub next_step_id: Option<DbId>,
}

/// Result of a step transition.
#[derive(Debug, Serialize)]
pub struct StepTransition {
    pub step_id: DbId,
    #[serde(flatten)]
    pub progress: ItemProgress,
    pub track_stats: ProgressStats,
}

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

/// GET /api/v1/onboarding/tracks
pub async fn list_tracks(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let viewer = auth.viewer();
    let mut visible = Vec::new();
    for track in OnboardingTrackRepo::list(&state.pool).await? {
        if can_view_track(&viewer, track.is_active, &track.positions()?) {
            visible.push(track);
        }
    }
    Ok(Json(DataResponse { data: visible }))
}

/// GET /api/v1/onboarding/tracks/mine
///
/// The track assigned to the caller's position, or `null` when none applies.
pub async fn my_track(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<TrackDetail>>>> {
    let tracks = OnboardingTrackRepo::list(&state.pool).await?;
    let candidates = tracks
        .iter()
        .map(|t| {
            Ok(TrackCandidate {
                id: t.id,
                sort_order: t.sort_order,
                is_active: t.is_active,
                for_positions: t.positions()?,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let Some(track_id) = select_track(&candidates, auth.position) else {
        tracing::debug!(user_id = auth.user_id, "No onboarding track applies");
        return Ok(Json(DataResponse { data: None }));
    };

    let track = tracks
        .into_iter()
        .find(|t| t.id == track_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "OnboardingTrack",
            id: track_id,
        }))?;

    let detail = track_detail(&state.pool, track, auth.user_id).await?;
    Ok(Json(DataResponse { data: Some(detail) }))
}

/// GET /api/v1/onboarding/tracks/{id}
///
/// Responds 404 to non-admins for tracks they cannot see.
pub async fn get_track(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrackDetail>>> {
    let track = find_visible_track(&state.pool, &auth, id).await?;
    let detail = track_detail(&state.pool, track, auth.user_id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/onboarding/tracks
pub async fn create_track(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateTrack>,
) -> AppResult<impl IntoResponse> {
    validate_title("Name", &input.name)?;

    let track = OnboardingTrackRepo::create(&state.pool, &input).await?;
    tracing::info!(admin_id = admin.user_id, track_id = track.id, "Onboarding track created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: track })))
}

/// PUT /api/v1/onboarding/tracks/{id}
pub async fn update_track(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTrack>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_title("Name", name)?;
    }

    let track = OnboardingTrackRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "OnboardingTrack",
            id,
        }))?;
    tracing::info!(admin_id = admin.user_id, track_id = id, "Onboarding track updated");
    Ok(Json(DataResponse { data: track }))
}

/// DELETE /api/v1/onboarding/tracks/{id}
///
/// Steps and every user's progress on them go with the track.
pub async fn delete_track(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if OnboardingTrackRepo::delete(&state.pool, id).await? {
        tracing::info!(admin_id = admin.user_id, track_id = id, "Onboarding track deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "OnboardingTrack",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// POST /api/v1/onboarding/tracks/{id}/steps
///
/// A `step_order` already used in the track is a 409.
pub async fn create_step(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(track_id): Path<DbId>,
    Json(input): Json<CreateStep>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_title("Title", &input.title)?;
    validate_duration(input.estimated_duration)?;

    if OnboardingTrackRepo::find_by_id(&state.pool, track_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "OnboardingTrack",
            id: track_id,
        }));
    }

    let step = OnboardingStepRepo::create(&state.pool, track_id, &input).await?;
    tracing::info!(
        admin_id = admin.user_id,
        track_id,
        step_id = step.id,
        "Onboarding step created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: step })))
}

/// PUT /api/v1/onboarding/steps/{id}
pub async fn update_step(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStep>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(title) = &input.title {
        validate_title("Title", title)?;
    }
    validate_duration(input.estimated_duration)?;

    let step = OnboardingStepRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "OnboardingStep",
            id,
        }))?;
    tracing::info!(admin_id = admin.user_id, step_id = id, "Onboarding step updated");
    Ok(Json(DataResponse { data: step }))
}

/// DELETE /api/v1/onboarding/steps/{id}
pub async fn delete_step(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if OnboardingStepRepo::delete(&state.pool, id).await? {
        tracing::info!(admin_id = admin.user_id, step_id = id, "Onboarding step deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "OnboardingStep",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Step progress
// ---------------------------------------------------------------------------

/// POST /api/v1/onboarding/steps/{id}/start
pub async fn start_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StepTransition>>> {
    let (step, _) = find_visible_step(&state.pool, &auth, id).await?;
    let applied = apply_transition(
        &state.pool,
        ProgressScope::OnboardingStep,
        auth.user_id,
        id,
        Transition::Start,
        None,
    )
    .await?;

    let track_stats = track_stats(&state.pool, step.track_id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: StepTransition {
            step_id: id,
            progress: ItemProgress::from_record(applied.record.as_ref())?,
            track_stats,
        },
    }))
}

/// POST /api/v1/onboarding/steps/{id}/complete
///
/// Accepted from any state. The body is optional; its `notes` replace any
/// earlier ones. Finishing the last open step of a track notifies the user.
pub async fn complete_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<CompleteProgress>>,
) -> AppResult<Json<DataResponse<StepTransition>>> {
    let notes = completion_notes(body.map(|Json(b)| b))?;
    let (step, track) = find_visible_step(&state.pool, &auth, id).await?;
    let applied = apply_transition(
        &state.pool,
        ProgressScope::OnboardingStep,
        auth.user_id,
        id,
        Transition::Complete,
        notes.as_deref(),
    )
    .await?;

    let track_stats = track_stats(&state.pool, step.track_id, auth.user_id).await?;

    if track_stats.is_complete() && applied.previous != Some(ProgressStatus::Completed) {
        notify(
            &state.pool,
            CreateNotification {
                user_id: auth.user_id,
                kind: KIND_TRACK_COMPLETED,
                title: format!("Onboarding complete: {}", track.name),
                body: Some(format!(
                    "You finished all {} steps of this track.",
                    track_stats.total_steps
                )),
            },
        )
        .await;
    }

    Ok(Json(DataResponse {
        data: StepTransition {
            step_id: id,
            progress: ItemProgress::from_record(applied.record.as_ref())?,
            track_stats,
        },
    }))
}

/// POST /api/v1/onboarding/steps/{id}/reset
///
/// Idempotent: 204 whether or not a record existed.
pub async fn reset_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_visible_step(&state.pool, &auth, id).await?;
    apply_transition(
        &state.pool,
        ProgressScope::OnboardingStep,
        auth.user_id,
        id,
        Transition::Reset,
        None,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// GET /api/v1/onboarding/resources
pub async fn list_resources(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let resources = ResourceRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: resources }))
}

/// POST /api/v1/onboarding/resources
pub async fn create_resource(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateResource>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_title("Title", &input.title)?;
    if let Some(kind) = &input.resource_type {
        validate_resource_type(kind)?;
    }

    let resource = ResourceRepo::create(&state.pool, &input).await?;
    tracing::info!(admin_id = admin.user_id, resource_id = resource.id, "Resource created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: resource })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_step(pool: &DbPool, id: DbId) -> AppResult<OnboardingStep> {
    OnboardingStepRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "OnboardingStep",
            id,
        }))
}

/// A step whose track the caller cannot see is reported as a missing step.
async fn find_visible_step(
    pool: &DbPool,
    auth: &AuthUser,
    id: DbId,
) -> AppResult<(OnboardingStep, OnboardingTrack)> {
    let step = find_step(pool, id).await?;
    let track = find_visible_track(pool, auth, step.track_id)
        .await
        .map_err(|err| match err {
            AppError::Core(CoreError::NotFound { .. }) => AppError::Core(CoreError::NotFound {
                entity: "OnboardingStep",
                id,
            }),
            other => other,
        })?;
    Ok((step, track))
}

async fn find_visible_track(pool: &DbPool, auth: &AuthUser, id: DbId) -> AppResult<OnboardingTrack> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "OnboardingTrack",
            id,
        })
    };
    let track = OnboardingTrackRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(not_found)?;
    if !can_view_track(&auth.viewer(), track.is_active, &track.positions()?) {
        return Err(not_found());
    }
    Ok(track)
}

async fn track_stats(pool: &DbPool, track_id: DbId, user_id: DbId) -> AppResult<ProgressStats> {
    let steps = OnboardingStepRepo::list_for_track(pool, track_id).await?;
    let estimates: Vec<StepEstimate> = steps.iter().map(OnboardingStep::estimate).collect();
    let ids: Vec<DbId> = steps.iter().map(|s| s.id).collect();
    let records =
        ProgressRepo::list_for_user_items(pool, ProgressScope::OnboardingStep, user_id, &ids)
            .await?;
    Ok(compute_stats(&estimates, &status_map(&records)?))
}

async fn track_detail(
    pool: &DbPool,
    track: OnboardingTrack,
    user_id: DbId,
) -> AppResult<TrackDetail> {
    let steps = OnboardingStepRepo::list_for_track(pool, track.id).await?;
    let ids: Vec<DbId> = steps.iter().map(|s| s.id).collect();

    let records =
        ProgressRepo::list_for_user_items(pool, ProgressScope::OnboardingStep, user_id, &ids)
            .await?;
    let statuses = status_map(&records)?;
    let mut resources =
        group_resources(ResourceRepo::linked_to(pool, ResourceLink::OnboardingStep, &ids).await?);

    let estimates: Vec<StepEstimate> = steps.iter().map(OnboardingStep::estimate).collect();
    let stats = compute_stats(&estimates, &statuses);
    let next_step_id = next_step(&estimates, &statuses);

    let steps = steps
        .into_iter()
        .map(|step| {
            let record = records.iter().find(|r| r.item_id == step.id);
            Ok(StepView {
                progress: ItemProgress::from_record(record)?,
                resources: resources.remove(&step.id).unwrap_or_default(),
                step,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(TrackDetail {
        track,
        steps,
        stats,
        next_step_id,
    })
}
