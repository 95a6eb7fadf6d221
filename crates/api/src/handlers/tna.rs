//! Handlers for the `/tna` resource.
//!
//! Every mutation follows the same shape: load the record, run role and
//! province guards, resolve the next status from the transition table, then
//! perform one guarded update. A guarded update that matches no row means the
//! TNA moved on concurrently and is reported with the table's rejection
//! message. Notifications are emitted only after the update succeeds.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use mimaropa_core::access::{ensure_province_scope, require_role};
use mimaropa_core::attachment::{FileAttachment, PREFIX_SIGNED_TNA_REPORT, PREFIX_TNA_REPORT};
use mimaropa_core::error::CoreError;
use mimaropa_core::roles::{ROLE_DOST_MIMAROPA, ROLE_PROPONENT, ROLE_PSTO};
use mimaropa_core::tna::{
    ensure_report_present, normalize_location, resolve_program_name, validate_assessment_team,
    validate_review_comments, validate_scheduled_time, ReviewOutcome, TnaAction, TnaStatus,
    DOST_MIMAROPA_REPORT_STATUSES,
};
use mimaropa_core::types::DbId;
use mimaropa_core::workflow::{next_status, StatusMachine};
use mimaropa_db::models::tna::{NewTna, ReviewTna, ScheduleTna, Tna, TnaFilter};
use mimaropa_db::models::user::User;
use mimaropa_db::repositories::{ApplicationRepo, TnaRepo, UserRepo};
use mimaropa_events::emitter::tna_event;
use validator::Validate;

use crate::attachments::{read_upload_form, Disposition};
use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, ListScope};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::{RequireCentralOffice, RequireDostMimaropa, RequirePstoOrAdmin};
use crate::query::{PaginationParams, TnaListParams};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Error for a guarded update that found the TNA in a different status.
fn stale(action: TnaAction) -> AppError {
    AppError::Core(CoreError::InvalidState(TnaStatus::rejection(action)))
}

/// Load a TNA for a PSTO/admin mutation and apply province scoping.
async fn load_scoped(state: &AppState, user: &User, id: DbId) -> AppResult<(Tna, TnaStatus)> {
    let tna = scope::load_tna(&state.pool, id).await?;
    scope::ensure_scope(&state.pool, &user.actor(), tna.proponent_id).await?;
    let status = tna.parsed_status()?;
    Ok((tna, status))
}

/// Guarded update outcome for an operation that already wrote a file.
async fn finish_upload(
    state: &AppState,
    attachment: &FileAttachment,
    result: Result<Option<Tna>, sqlx::Error>,
    action: TnaAction,
) -> AppResult<Tna> {
    match result {
        Ok(Some(tna)) => Ok(tna),
        Ok(None) => {
            state.attachments.discard(attachment).await;
            Err(stale(action))
        }
        Err(e) => {
            state.attachments.discard(attachment).await;
            Err(e.into())
        }
    }
}

fn parse_id_field(value: Option<&str>, field: &str) -> AppResult<DbId> {
    let raw = value.ok_or_else(|| CoreError::Validation(format!("{field} is required")))?;
    raw.parse()
        .map_err(|_| AppError::Core(CoreError::Validation(format!("{field} must be an integer"))))
}

// ---------------------------------------------------------------------------
// Scheduling and listing
// ---------------------------------------------------------------------------

/// POST /api/v1/tna/schedule
pub async fn schedule(
    State(state): State<AppState>,
    RequirePstoOrAdmin(user): RequirePstoOrAdmin,
    Json(input): Json<ScheduleTna>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tna>>)> {
    input.validate()?;
    validate_scheduled_time(&input.scheduled_time)?;
    let location = normalize_location(&input.location)?;
    validate_assessment_team(&input.assessment_team)?;

    let application = ApplicationRepo::find_by_id(&state.pool, input.application_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Application",
            id: input.application_id,
        }))?;
    if application.proponent_id != input.proponent_id {
        return Err(AppError::Core(CoreError::Validation(
            "Application does not belong to the given proponent".into(),
        )));
    }

    let proponent = UserRepo::find_by_id(&state.pool, input.proponent_id)
        .await?
        .filter(|u| u.role == ROLE_PROPONENT)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Proponent",
            id: input.proponent_id,
        }))?;
    ensure_province_scope(&user.actor(), proponent.province.as_deref())?;

    let program_name = resolve_program_name(
        input.program_name.as_deref(),
        None,
        Some(&application.program_name),
    );

    let new_tna = NewTna {
        application_id: input.application_id,
        proponent_id: input.proponent_id,
        scheduled_by: user.id,
        program_name,
        scheduled_date: input.scheduled_date,
        scheduled_time: input.scheduled_time,
        location,
        contact_person: input.contact_person,
        contact_phone: input.contact_phone,
        email: input.email,
        assessment_team: input.assessment_team,
        notes: input.notes,
    };
    let tna = TnaRepo::schedule(&state.pool, &new_tna).await?;

    tracing::info!(
        tna_id = tna.id,
        application_id = tna.application_id,
        scheduled_by = user.id,
        "TNA scheduled",
    );

    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, TnaStatus::Scheduled)
            .to_user(tna.proponent_id)
            .with_actor(user.id),
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("TNA scheduled successfully", tna)),
    ))
}

/// GET /api/v1/tna/list?status=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<TnaListParams>,
) -> AppResult<Json<ApiResponse<Vec<Tna>>>> {
    let scope = ListScope::for_actor(&user.actor());
    if scope.is_empty() {
        return Ok(Json(ApiResponse::ok(Vec::new())));
    }

    let statuses = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(vec![s.parse::<TnaStatus>()?.as_str().to_string()]),
        None => None,
    };

    let page = params.pagination();
    let filter = TnaFilter {
        statuses,
        proponent_id: scope.proponent_id(),
        province: scope.province(),
        limit: page.limit(),
        offset: page.offset(),
    };
    let tnas = TnaRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::ok(tnas)))
}

/// GET /api/v1/tna/dost-mimaropa/reports
///
/// TNAs that have reached the central office, newest first.
pub async fn dost_mimaropa_reports(
    State(state): State<AppState>,
    RequireCentralOffice(_user): RequireCentralOffice,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<Tna>>>> {
    let filter = TnaFilter {
        statuses: Some(
            DOST_MIMAROPA_REPORT_STATUSES
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        limit: page.limit(),
        offset: page.offset(),
        ..Default::default()
    };
    let tnas = TnaRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::ok(tnas)))
}

/// GET /api/v1/tna/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Tna>>> {
    let tna = scope::load_tna(&state.pool, id).await?;
    scope::ensure_view(&state.pool, &user.actor(), tna.proponent_id).await?;
    Ok(Json(ApiResponse::ok(tna)))
}

// ---------------------------------------------------------------------------
// PSTO transitions
// ---------------------------------------------------------------------------

/// PUT /api/v1/tna/{id}/mark-in-progress
pub async fn mark_in_progress(
    State(state): State<AppState>,
    RequirePstoOrAdmin(user): RequirePstoOrAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Tna>>> {
    let (_, current) = load_scoped(&state, &user, id).await?;
    let next = next_status(current, TnaAction::MarkInProgress)?;

    let tna = TnaRepo::transition(&state.pool, id, current.as_str(), next.as_str(), user.id)
        .await?
        .ok_or_else(|| stale(TnaAction::MarkInProgress))?;

    tracing::info!(tna_id = id, user_id = user.id, "TNA marked in progress");
    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, next)
            .to_user(tna.proponent_id)
            .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message("TNA marked as in progress", tna)))
}

/// PUT /api/v1/tna/{id}/mark-completed
pub async fn mark_completed(
    State(state): State<AppState>,
    RequirePstoOrAdmin(user): RequirePstoOrAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Tna>>> {
    let (_, current) = load_scoped(&state, &user, id).await?;
    let next = next_status(current, TnaAction::MarkCompleted)?;

    let tna = TnaRepo::mark_completed(&state.pool, id, current.as_str(), next.as_str(), user.id)
        .await?
        .ok_or_else(|| stale(TnaAction::MarkCompleted))?;

    tracing::info!(tna_id = id, user_id = user.id, "TNA marked completed");
    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, next)
            .to_user(tna.proponent_id)
            .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message("TNA marked as completed", tna)))
}

/// POST /api/v1/tna/upload-report
///
/// Multipart form: `tna_id`, `file`, and optional `report_summary` and
/// `report_recommendations`. Also accepted from `returned_to_psto` to replace
/// a returned report.
pub async fn upload_report(
    State(state): State<AppState>,
    RequirePstoOrAdmin(user): RequirePstoOrAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Tna>>> {
    let mut form = read_upload_form(multipart).await?;
    let id = parse_id_field(form.text("tna_id"), "tna_id")?;
    let file = form.require_file()?;

    let (_, current) = load_scoped(&state, &user, id).await?;
    let attachment = state.attachments.prepare(PREFIX_TNA_REPORT, &file, user.id)?;
    let next = next_status(current, TnaAction::UploadReport)?;

    state.attachments.store(&attachment, &file.bytes).await?;
    let result = TnaRepo::attach_report(
        &state.pool,
        id,
        current.as_str(),
        next.as_str(),
        &attachment,
        form.text("report_summary"),
        form.text("report_recommendations"),
        user.id,
    )
    .await;
    let tna = finish_upload(&state, &attachment, result, TnaAction::UploadReport).await?;

    tracing::info!(
        tna_id = id,
        filename = %attachment.filename,
        user_id = user.id,
        "TNA report uploaded",
    );
    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, next)
            .to_user(tna.proponent_id)
            .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message(
        "TNA report uploaded successfully",
        tna,
    )))
}

/// POST /api/v1/tna/{id}/forward-to-dost-mimaropa
pub async fn forward_to_dost_mimaropa(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Tna>>> {
    let tna = scope::load_tna(&state.pool, id).await?;
    ensure_report_present(tna.report().map(|r| r.filename.as_str()))?;

    let actor = user.actor();
    require_role(&actor, &[ROLE_PSTO], "forward TNA reports to DOST-MIMAROPA")?;
    scope::ensure_scope(&state.pool, &actor, tna.proponent_id).await?;

    let current = tna.parsed_status()?;
    let next = next_status(current, TnaAction::ForwardToDostMimaropa)?;

    let tna = TnaRepo::forward(&state.pool, id, current.as_str(), next.as_str(), user.id)
        .await?
        .ok_or_else(|| stale(TnaAction::ForwardToDostMimaropa))?;

    tracing::info!(tna_id = id, forwarded_by = user.id, "TNA forwarded to DOST-MIMAROPA");
    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, next)
            .to_role(ROLE_DOST_MIMAROPA)
            .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message(
        "TNA report forwarded to DOST-MIMAROPA",
        tna,
    )))
}

// ---------------------------------------------------------------------------
// Central-office review
// ---------------------------------------------------------------------------

/// POST /api/v1/tna/{id}/review
pub async fn review(
    State(state): State<AppState>,
    RequireDostMimaropa(user): RequireDostMimaropa,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewTna>,
) -> AppResult<Json<ApiResponse<Tna>>> {
    input.validate()?;
    let outcome = input.action.parse::<ReviewOutcome>()?;
    let comments = input
        .comments
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    validate_review_comments(comments)?;

    let tna = scope::load_tna(&state.pool, id).await?;
    let current = tna.parsed_status()?;
    let action = outcome.action();
    let next = next_status(current, action)?;

    let tna = TnaRepo::record_review(
        &state.pool,
        id,
        current.as_str(),
        next.as_str(),
        comments,
        user.id,
    )
    .await?
    .ok_or_else(|| stale(action))?;

    tracing::info!(tna_id = id, outcome = %outcome, reviewed_by = user.id, "TNA report reviewed");
    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, next)
            .to_user(tna.scheduled_by)
            .with_actor(user.id),
    );

    let message = match outcome {
        ReviewOutcome::Approved => "TNA report approved",
        ReviewOutcome::Rejected => "TNA report rejected",
        ReviewOutcome::Returned => "TNA report returned to PSTO",
    };
    Ok(Json(ApiResponse::with_message(message, tna)))
}

/// POST /api/v1/tna/{id}/signed-report
///
/// Multipart form with a single `file` part holding the RD-signed report.
pub async fn upload_signed_report(
    State(state): State<AppState>,
    RequireDostMimaropa(user): RequireDostMimaropa,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Tna>>> {
    let mut form = read_upload_form(multipart).await?;
    let file = form.require_file()?;

    let tna = scope::load_tna(&state.pool, id).await?;
    let current = tna.parsed_status()?;
    let attachment = state
        .attachments
        .prepare(PREFIX_SIGNED_TNA_REPORT, &file, user.id)?;
    let next = next_status(current, TnaAction::UploadSignedReport)?;

    state.attachments.store(&attachment, &file.bytes).await?;
    let result = TnaRepo::attach_signed_report(
        &state.pool,
        id,
        current.as_str(),
        next.as_str(),
        &attachment,
        user.id,
    )
    .await;
    let tna = finish_upload(&state, &attachment, result, TnaAction::UploadSignedReport).await?;

    tracing::info!(tna_id = id, user_id = user.id, "Signed TNA report uploaded");
    state.notifier.emit(
        tna_event(tna.id, &tna.program_name, next)
            .to_user(tna.scheduled_by)
            .to_user(tna.proponent_id)
            .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message(
        "Signed TNA report uploaded successfully",
        tna,
    )))
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

async fn serve_report(
    state: &AppState,
    user: &User,
    id: DbId,
    signed: bool,
    disposition: Disposition,
) -> AppResult<Response> {
    let tna = scope::load_tna(&state.pool, id).await?;
    let (report, entity) = if signed {
        (tna.signed_report(), "Signed TNA report")
    } else {
        (tna.report(), "TNA report")
    };
    let report = report.ok_or(AppError::Core(CoreError::NotFound { entity, id }))?;

    scope::ensure_view(&state.pool, &user.actor(), tna.proponent_id).await?;
    state.attachments.serve(report, disposition, entity, id).await
}

/// GET /api/v1/tna/{id}/download-report
pub async fn download_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    serve_report(&state, &user, id, false, Disposition::Attachment).await
}

/// GET /api/v1/tna/{id}/view-report
pub async fn view_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    serve_report(&state, &user, id, false, Disposition::Inline).await
}

/// GET /api/v1/tna/{id}/download-signed-report
pub async fn download_signed_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    serve_report(&state, &user, id, true, Disposition::Attachment).await
}
