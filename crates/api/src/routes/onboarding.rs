//! Route definitions for the `/onboarding` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

/// Routes mounted at `/onboarding`.
///
/// ```text
/// GET    /tracks                 -> list_tracks
/// POST   /tracks                 -> create_track (admin)
/// GET    /tracks/mine            -> my_track
/// GET    /tracks/{id}            -> get_track
/// PUT    /tracks/{id}            -> update_track (admin)
/// DELETE /tracks/{id}            -> delete_track (admin)
/// POST   /tracks/{id}/steps      -> create_step (admin)
/// PUT    /steps/{id}             -> update_step (admin)
/// DELETE /steps/{id}             -> delete_step (admin)
/// POST   /steps/{id}/start       -> start_step
/// POST   /steps/{id}/complete    -> complete_step
/// POST   /steps/{id}/reset       -> reset_step
/// GET    /resources              -> list_resources
/// POST   /resources              -> create_resource (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tracks",
            get(onboarding::list_tracks).post(onboarding::create_track),
        )
        .route("/tracks/mine", get(onboarding::my_track))
        .route(
            "/tracks/{id}",
            get(onboarding::get_track)
                .put(onboarding::update_track)
                .delete(onboarding::delete_track),
        )
        .route("/tracks/{id}/steps", post(onboarding::create_step))
        .route(
            "/steps/{id}",
            put(onboarding::update_step).delete(onboarding::delete_step),
        )
        .route("/steps/{id}/start", post(onboarding::start_step))
        .route("/steps/{id}/complete", post(onboarding::complete_step))
        .route("/steps/{id}/reset", post(onboarding::reset_step))
        .route(
            "/resources",
            get(onboarding::list_resources).post(onboarding::create_resource),
        )
}
