//! Route definitions for the `/funding-requests` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::funding;
use crate::state::AppState;

/// Routes mounted at `/funding-requests`.
///
/// ```text
/// POST /                                 -> request_documents
/// GET  /                                 -> list
/// GET  /{id}                             -> get_by_id
/// PUT  /{id}/status                      -> update_status
/// POST /{id}/documents                   -> submit_document (multipart)
/// PUT  /{id}/documents/{index}/review    -> review_document
/// GET  /{id}/documents/{index}/download  -> download_document
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(funding::list).post(funding::request_documents),
        )
        .route("/{id}", get(funding::get_by_id))
        .route("/{id}/status", put(funding::update_status))
        .route("/{id}/documents", post(funding::submit_document))
        .route(
            "/{id}/documents/{index}/review",
            put(funding::review_document),
        )
        .route(
            "/{id}/documents/{index}/download",
            get(funding::download_document),
        )
}
