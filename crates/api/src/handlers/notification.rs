//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use salesdesk_core::error::CoreError;
use salesdesk_core::types::DbId;
use salesdesk_db::models::notification::{CreateNotification, Notification};
use salesdesk_db::repositories::NotificationRepo;
use salesdesk_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{clamp_limit, clamp_offset, NotificationListParams, DEFAULT_LIMIT, MAX_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

/// GET /api/v1/notifications
///
/// The caller's notifications, newest first. `?unread_only=true` filters,
/// `limit` defaults to 50 and is capped at 100.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationListParams>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let notifications = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        params.unread_only,
        limit,
        offset,
    )
    .await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let unread_count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { unread_count },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// 404 when the notification does not exist or belongs to someone else.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if NotificationRepo::mark_read(&state.pool, id, auth.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))
    }
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let marked_read = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = auth.user_id, marked_read, "Marked notifications read");
    Ok(Json(DataResponse {
        data: MarkedRead { marked_read },
    }))
}

/// Record a notification for a progress milestone.
///
/// The triggering transition is already stored, so a failure here is logged
/// and swallowed.
pub(crate) async fn notify(pool: &DbPool, input: CreateNotification) {
    match NotificationRepo::create(pool, &input).await {
        Ok(n) => {
            tracing::info!(user_id = n.user_id, kind = %n.kind, notification_id = n.id, "Notification created");
        }
        Err(e) => {
            tracing::warn!(user_id = input.user_id, kind = input.kind, error = %e, "Failed to create notification");
        }
    }
}
