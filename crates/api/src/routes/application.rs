//! Route definitions for the `/applications` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// POST /        -> create (proponent)
/// GET  /        -> list
/// GET  /{id}    -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(application::list).post(application::create))
        .route("/{id}", get(application::get_by_id))
}
