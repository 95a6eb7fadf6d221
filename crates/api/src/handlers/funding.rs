//! Handlers for the `/funding-requests` resource.
//!
//! Request-level status changes go through [`FundingRequestStatus`]'s table
//! and only move on explicit actions. Document submissions and reviews
//! rewrite the JSONB document list and never touch the request status.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use mimaropa_core::access::{ensure_province_scope, require_role};
use mimaropa_core::attachment::PREFIX_FUNDING_DOCUMENT;
use mimaropa_core::error::CoreError;
use mimaropa_core::funding::{
    apply_review, apply_submission, seed_documents, DocumentDecision, FundingRequestAction,
    FundingRequestStatus,
};
use mimaropa_core::notification::NotificationKind;
use mimaropa_core::tna::ensure_funding_eligible;
use mimaropa_core::types::DbId;
use mimaropa_core::workflow::{next_status, StatusMachine};
use mimaropa_db::models::funding_request::{
    FundingRequest, FundingRequestFilter, NewFundingRequest, RequestDocuments, ReviewDocument,
    UpdateRequestStatus,
};
use mimaropa_db::repositories::FundingRequestRepo;
use mimaropa_events::emitter::funding_status_event;
use mimaropa_events::NotificationEvent;
use validator::Validate;

use crate::attachments::{read_upload_form, Disposition};
use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, ListScope};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::{RequireDostMimaropa, RequireProponent};
use crate::query::FundingListParams;
use crate::response::ApiResponse;
use crate::state::AppState;

fn stale(action: FundingRequestAction) -> AppError {
    AppError::Core(CoreError::InvalidState(FundingRequestStatus::rejection(
        action,
    )))
}

fn status_strings(statuses: &[FundingRequestStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Statuses in which the proponent may attach documents.
const ACCEPTING_STATUSES: &[FundingRequestStatus] = &[
    FundingRequestStatus::DocumentsRequested,
    FundingRequestStatus::DocumentsRevisionRequested,
];

/// POST /api/v1/funding-requests
///
/// Request funding documents for a TNA whose assessment is done. At most one
/// request exists per TNA.
pub async fn request_documents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RequestDocuments>,
) -> AppResult<(StatusCode, Json<ApiResponse<FundingRequest>>)> {
    input.validate()?;

    let actor = user.actor();
    require_role(
        &actor,
        FundingRequestAction::RequestDocuments.allowed_roles(),
        "request funding documents",
    )?;

    let tna = scope::load_tna(&state.pool, input.tna_id).await?;
    if actor.is_psto() {
        let province = scope::proponent_province(&state.pool, tna.proponent_id).await?;
        ensure_province_scope(&actor, province.as_deref())?;
    }
    ensure_funding_eligible(tna.parsed_status()?, tna.report().is_some())?;

    if FundingRequestRepo::find_by_tna_id(&state.pool, tna.id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A funding document request already exists for TNA {}",
            tna.id
        ))));
    }

    let documents = seed_documents(&input.documents)?;
    let status = next_status(
        FundingRequestStatus::ReadyForFunding,
        FundingRequestAction::RequestDocuments,
    )?;

    let new_request = NewFundingRequest {
        tna_id: tna.id,
        application_id: tna.application_id,
        proponent_id: tna.proponent_id,
        requested_by: user.id,
        status: status.as_str().to_string(),
        due_date: input.due_date,
        notes: input.notes,
        funding_documents: documents,
    };
    let request = FundingRequestRepo::create(&state.pool, &new_request).await?;

    tracing::info!(
        request_id = request.id,
        tna_id = tna.id,
        requested_by = user.id,
        documents = request.funding_documents.0.len(),
        "Funding documents requested",
    );
    state.notifier.emit(
        funding_status_event(request.id, status)
            .to_user(request.proponent_id)
            .with_actor(user.id),
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Funding documents requested successfully",
            request,
        )),
    ))
}

/// GET /api/v1/funding-requests?status=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<FundingListParams>,
) -> AppResult<Json<ApiResponse<Vec<FundingRequest>>>> {
    let scope = ListScope::for_actor(&user.actor());
    if scope.is_empty() {
        return Ok(Json(ApiResponse::ok(Vec::new())));
    }

    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<FundingRequestStatus>()?.as_str().to_string()),
        None => None,
    };

    let page = params.pagination();
    let filter = FundingRequestFilter {
        status,
        proponent_id: scope.proponent_id(),
        province: scope.province(),
        limit: page.limit(),
        offset: page.offset(),
    };
    let requests = FundingRequestRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// GET /api/v1/funding-requests/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<FundingRequest>>> {
    let request = scope::load_funding_request(&state.pool, id).await?;
    scope::ensure_view(&state.pool, &user.actor(), request.proponent_id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// PUT /api/v1/funding-requests/{id}/status
///
/// Apply an explicit request-level action. `mark_submitted` is reserved for
/// the request's own proponent; review actions for the central office.
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRequestStatus>,
) -> AppResult<Json<ApiResponse<FundingRequest>>> {
    let action = input.action.parse::<FundingRequestAction>()?;
    let request = scope::load_funding_request(&state.pool, id).await?;

    let actor = user.actor();
    require_role(&actor, action.allowed_roles(), &format!("{action} funding requests"))?;
    if action == FundingRequestAction::MarkSubmitted && request.proponent_id != user.id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the request's proponent can mark documents as submitted".into(),
        )));
    }

    let current = request.parsed_status()?;
    let next = next_status(current, action)?;
    let updated = FundingRequestRepo::update_status(&state.pool, id, current.as_str(), next.as_str())
        .await?
        .ok_or_else(|| stale(action))?;

    tracing::info!(
        request_id = id,
        action = %action,
        from = %current,
        to = %next,
        user_id = user.id,
        "Funding request status updated",
    );

    let recipient = if action == FundingRequestAction::MarkSubmitted {
        updated.requested_by
    } else {
        updated.proponent_id
    };
    state.notifier.emit(
        funding_status_event(updated.id, next)
            .to_user(recipient)
            .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message(
        "Funding request status updated",
        updated,
    )))
}

/// POST /api/v1/funding-requests/{id}/documents
///
/// Multipart form: `type` (or `document_type`), optional `name`, and `file`.
/// Replaces the file of an already listed document or appends a new entry.
pub async fn submit_document(
    State(state): State<AppState>,
    RequireProponent(user): RequireProponent,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<FundingRequest>>> {
    let mut form = read_upload_form(multipart).await?;
    let doc_type = form
        .text("type")
        .or_else(|| form.text("document_type"))
        .ok_or_else(|| CoreError::Validation("Document type is required".into()))?
        .to_string();
    let name = form.text("name").map(str::to_string);
    let file = form.require_file()?;

    let request = scope::load_funding_request(&state.pool, id).await?;
    if request.proponent_id != user.id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Access denied: you do not have access to this record".into(),
        )));
    }
    let current = request.parsed_status()?;
    if !current.accepts_submissions() {
        return Err(stale(FundingRequestAction::MarkSubmitted));
    }

    let attachment = state
        .attachments
        .prepare(PREFIX_FUNDING_DOCUMENT, &file, user.id)?;
    let mut documents = request.funding_documents.0.clone();
    let index = apply_submission(&mut documents, &doc_type, name.as_deref(), attachment.clone())?;

    state.attachments.store(&attachment, &file.bytes).await?;
    let result = FundingRequestRepo::update_documents(
        &state.pool,
        id,
        &documents,
        &status_strings(ACCEPTING_STATUSES),
    )
    .await;
    let updated = match result {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            state.attachments.discard(&attachment).await;
            return Err(stale(FundingRequestAction::MarkSubmitted));
        }
        Err(e) => {
            state.attachments.discard(&attachment).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        request_id = id,
        document_type = %doc_type,
        index,
        filename = %attachment.filename,
        "Funding document submitted",
    );
    state.notifier.emit(
        NotificationEvent::new(
            NotificationKind::DocumentSubmitted,
            format!(
                "{} was submitted for funding document request #{id}",
                documents[index].name
            ),
        )
        .about(id)
        .to_user(updated.requested_by)
        .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message(
        "Document submitted successfully",
        updated,
    )))
}

/// PUT /api/v1/funding-requests/{id}/documents/{index}/review
pub async fn review_document(
    State(state): State<AppState>,
    RequireDostMimaropa(user): RequireDostMimaropa,
    Path((id, index)): Path<(DbId, usize)>,
    Json(input): Json<ReviewDocument>,
) -> AppResult<Json<ApiResponse<FundingRequest>>> {
    input.validate()?;
    let decision = input.status.parse::<DocumentDecision>()?;
    let comments = input
        .comments
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let request = scope::load_funding_request(&state.pool, id).await?;
    let mut documents = request.funding_documents.0.clone();
    apply_review(&mut documents, index, decision, comments, user.id, Utc::now())?;

    let updated = FundingRequestRepo::update_documents(
        &state.pool,
        id,
        &documents,
        &status_strings(FundingRequestStatus::ALL),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "FundingDocumentRequest",
        id,
    }))?;

    tracing::info!(
        request_id = id,
        index,
        decision = %decision,
        reviewed_by = user.id,
        "Funding document reviewed",
    );
    let readable = decision.as_str().replace('_', " ");
    state.notifier.emit(
        NotificationEvent::new(
            NotificationKind::DocumentReviewed,
            format!("{} was marked {readable}", documents[index].name),
        )
        .about(id)
        .to_user(updated.proponent_id)
        .with_actor(user.id),
    );

    Ok(Json(ApiResponse::with_message("Document reviewed", updated)))
}

/// GET /api/v1/funding-requests/{id}/documents/{index}/download
pub async fn download_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, index)): Path<(DbId, usize)>,
) -> AppResult<Response> {
    let request = scope::load_funding_request(&state.pool, id).await?;
    scope::ensure_view(&state.pool, &user.actor(), request.proponent_id).await?;

    let file = request
        .funding_documents
        .0
        .get(index)
        .and_then(|d| d.file.as_ref())
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FundingDocument",
            id,
        }))?;

    state
        .attachments
        .serve(file, Disposition::Attachment, "FundingDocument", id)
        .await
}
