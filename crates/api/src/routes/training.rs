//! Route definitions for the `/training` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::training;
use crate::state::AppState;

/// Routes mounted at `/training`.
///
/// ```text
/// GET    /modules                    -> list_modules
/// POST   /modules                    -> create_module (admin)
/// GET    /modules/available          -> list_available_modules
/// GET    /modules/{id}               -> get_module
/// PUT    /modules/{id}               -> update_module (admin)
/// DELETE /modules/{id}               -> delete_module (admin)
/// POST   /modules/{id}/publish       -> publish_module (admin)
/// POST   /modules/{id}/unpublish     -> unpublish_module (admin)
/// POST   /modules/{id}/start         -> start_module
/// POST   /modules/{id}/complete      -> complete_module
/// POST   /modules/{id}/reset         -> reset_module
/// POST   /sections/{id}/start        -> start_section
/// POST   /sections/{id}/complete     -> complete_section
/// POST   /sections/{id}/reset        -> reset_section
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/modules",
            get(training::list_modules).post(training::create_module),
        )
        .route("/modules/available", get(training::list_available_modules))
        .route(
            "/modules/{id}",
            get(training::get_module)
                .put(training::update_module)
                .delete(training::delete_module),
        )
        .route("/modules/{id}/publish", post(training::publish_module))
        .route("/modules/{id}/unpublish", post(training::unpublish_module))
        .route("/modules/{id}/start", post(training::start_module))
        .route("/modules/{id}/complete", post(training::complete_module))
        .route("/modules/{id}/reset", post(training::reset_module))
        .route("/sections/{id}/start", post(training::start_section))
        .route("/sections/{id}/complete", post(training::complete_section))
        .route("/sections/{id}/reset", post(training::reset_section))
}
