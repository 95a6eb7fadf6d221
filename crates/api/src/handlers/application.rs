//! Handlers for the `/applications` resource.
//!
//! Applications are the proponent-owned records a TNA is scheduled against.
//! Only creation and scoped reads are exposed here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mimaropa_core::application::{validate_enterprise_name, validate_program_name};
use mimaropa_core::error::CoreError;
use mimaropa_core::types::DbId;
use mimaropa_db::models::application::{Application, ApplicationFilter, CreateApplication};
use mimaropa_db::repositories::ApplicationRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, ListScope};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireProponent;
use crate::query::PaginationParams;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/applications
pub async fn create(
    State(state): State<AppState>,
    RequireProponent(user): RequireProponent,
    Json(input): Json<CreateApplication>,
) -> AppResult<(StatusCode, Json<ApiResponse<Application>>)> {
    input.validate()?;
    validate_program_name(&input.program_name)?;
    validate_enterprise_name(&input.enterprise_name)?;

    let application = ApplicationRepo::create(&state.pool, user.id, &input).await?;
    tracing::info!(
        application_id = application.id,
        proponent_id = user.id,
        program = %application.program_name,
        "Application submitted",
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Application submitted successfully",
            application,
        )),
    ))
}

/// GET /api/v1/applications
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<Application>>>> {
    let scope = ListScope::for_actor(&user.actor());
    if scope.is_empty() {
        return Ok(Json(ApiResponse::ok(Vec::new())));
    }

    let filter = ApplicationFilter {
        proponent_id: scope.proponent_id(),
        province: scope.province(),
        limit: page.limit(),
        offset: page.offset(),
    };
    let applications = ApplicationRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::ok(applications)))
}

/// GET /api/v1/applications/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Application>>> {
    let application = ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Application",
            id,
        }))?;
    scope::ensure_view(&state.pool, &user.actor(), application.proponent_id).await?;
    Ok(Json(ApiResponse::ok(application)))
}
