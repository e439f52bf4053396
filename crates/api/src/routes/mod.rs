pub mod admin;
pub mod auth;
pub mod health;
pub mod notification;
pub mod onboarding;
pub mod training;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
/// /auth/me                                         current user
///
/// /admin/users                                     list, create (admin only)
/// /admin/users/{id}                                get, update, deactivate
/// /admin/users/{id}/reset-password                 reset password
///
/// /onboarding/tracks                               list visible, create (admin)
/// /onboarding/tracks/mine                          caller's track with progress
/// /onboarding/tracks/{id}                          get, update, delete (admin)
/// /onboarding/tracks/{id}/steps                    create step (admin)
/// /onboarding/steps/{id}                           update, delete (admin)
/// /onboarding/steps/{id}/start|complete|reset      step progress
/// /onboarding/resources                            list, create (admin)
///
/// /training/modules                                list visible, create (admin)
/// /training/modules/available                      unlocked modules
/// /training/modules/{id}                           get, update, delete (admin)
/// /training/modules/{id}/publish|unpublish         publish state (admin)
/// /training/modules/{id}/start|complete|reset      module progress
/// /training/sections/{id}/start|complete|reset     section progress
///
/// /notifications                                   list
/// /notifications/unread-count                      unread count
/// /notifications/read-all                          mark all read
/// /notifications/{id}/read                         mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (register, login, refresh, logout, me).
        .nest("/auth", auth::router())
        // Admin user management.
        .nest("/admin", admin::router())
        // Onboarding tracks, steps, step progress and resources.
        .nest("/onboarding", onboarding::router())
        // Training modules, sections and their progress.
        .nest("/training", training::router())
        // In-app notifications.
        .nest("/notifications", notification::router())
}
