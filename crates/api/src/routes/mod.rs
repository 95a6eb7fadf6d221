pub mod application;
pub mod auth;
pub mod funding;
pub mod health;
pub mod notification;
pub mod tna;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                       login (public)
/// /auth/me                                          current user
///
/// /applications                                     submit (proponent), scoped list
/// /applications/{id}                                scoped get
///
/// /tna/schedule                                     schedule (psto/admin)
/// /tna/list                                         scoped list, ?status=
/// /tna/dost-mimaropa/reports                        central-office queue
/// /tna/upload-report                                multipart report upload (psto/admin)
/// /tna/{id}                                         scoped get
/// /tna/{id}/mark-in-progress                        PUT (psto/admin)
/// /tna/{id}/mark-completed                          PUT (psto/admin)
/// /tna/{id}/forward-to-dost-mimaropa                POST (psto)
/// /tna/{id}/review                                  POST (dost_mimaropa)
/// /tna/{id}/signed-report                           multipart signed report (dost_mimaropa)
/// /tna/{id}/download-report                         attachment download
/// /tna/{id}/view-report                             inline view
/// /tna/{id}/download-signed-report                  attachment download
///
/// /funding-requests                                 request documents, scoped list
/// /funding-requests/{id}                            scoped get
/// /funding-requests/{id}/status                     PUT request-level action
/// /funding-requests/{id}/documents                  multipart submit (proponent owner)
/// /funding-requests/{id}/documents/{index}/review   PUT (dost_mimaropa)
/// /funding-requests/{id}/documents/{index}/download scoped download
///
/// /notifications                                    own list, ?unread_only=
/// /notifications/unread-count                       own unread count
/// /notifications/read-all                           POST
/// /notifications/{id}/read                          POST
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/applications", application::router())
        .nest("/tna", tna::router())
        .nest("/funding-requests", funding::router())
        .nest("/notifications", notification::router())
}
