//! Route definitions for the `/tna` resource.
//!
//! All endpoints require authentication. Static segments are registered
//! alongside `/{id}`; axum prefers the static match.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::tna;
use crate::state::AppState;

/// Routes mounted at `/tna`.
///
/// ```text
/// POST /schedule                        -> schedule
/// GET  /list                            -> list
/// GET  /dost-mimaropa/reports           -> dost_mimaropa_reports
/// POST /upload-report                   -> upload_report (multipart)
/// GET  /{id}                            -> get_by_id
/// PUT  /{id}/mark-in-progress           -> mark_in_progress
/// PUT  /{id}/mark-completed             -> mark_completed
/// POST /{id}/forward-to-dost-mimaropa   -> forward_to_dost_mimaropa
/// POST /{id}/review                     -> review
/// POST /{id}/signed-report              -> upload_signed_report (multipart)
/// GET  /{id}/download-report            -> download_report
/// GET  /{id}/view-report                -> view_report
/// GET  /{id}/download-signed-report     -> download_signed_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schedule", post(tna::schedule))
        .route("/list", get(tna::list))
        .route("/dost-mimaropa/reports", get(tna::dost_mimaropa_reports))
        .route("/upload-report", post(tna::upload_report))
        .route("/{id}", get(tna::get_by_id))
        .route("/{id}/mark-in-progress", put(tna::mark_in_progress))
        .route("/{id}/mark-completed", put(tna::mark_completed))
        .route(
            "/{id}/forward-to-dost-mimaropa",
            post(tna::forward_to_dost_mimaropa),
        )
        .route("/{id}/review", post(tna::review))
        .route("/{id}/signed-report", post(tna::upload_signed_report))
        .route("/{id}/download-report", get(tna::download_report))
        .route("/{id}/view-report", get(tna::view_report))
        .route(
            "/{id}/download-signed-report",
            get(tna::download_signed_report),
        )
}
