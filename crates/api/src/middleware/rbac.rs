//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`CurrentUser`] and rejects requests whose role is not
//! allowed with 403 Forbidden. Province and ownership checks stay in the
//! handlers because they depend on the record being touched.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mimaropa_core::access::require_role;
use mimaropa_core::roles::{ROLE_ADMIN, ROLE_DOST_MIMAROPA, ROLE_PROPONENT, ROLE_PSTO};
use mimaropa_db::models::user::User;

use super::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

async fn current_with_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    action: &str,
) -> Result<User, AppError> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    require_role(&user.actor(), allowed, action)?;
    Ok(user)
}

/// Requires `psto` or `admin`.
///
/// ```ignore
/// async fn schedule(RequirePstoOrAdmin(user): RequirePstoOrAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequirePstoOrAdmin(pub User);

impl FromRequestParts<AppState> for RequirePstoOrAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user =
            current_with_role(parts, state, &[ROLE_PSTO, ROLE_ADMIN], "manage TNAs").await?;
        Ok(RequirePstoOrAdmin(user))
    }
}

/// Requires `dost_mimaropa`. Admins are deliberately excluded from review
/// decisions.
pub struct RequireDostMimaropa(pub User);

impl FromRequestParts<AppState> for RequireDostMimaropa {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_with_role(
            parts,
            state,
            &[ROLE_DOST_MIMAROPA],
            "review as DOST-MIMAROPA",
        )
        .await?;
        Ok(RequireDostMimaropa(user))
    }
}

/// Requires `dost_mimaropa` or `admin`.
pub struct RequireCentralOffice(pub User);

impl FromRequestParts<AppState> for RequireCentralOffice {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_with_role(
            parts,
            state,
            &[ROLE_DOST_MIMAROPA, ROLE_ADMIN],
            "view DOST-MIMAROPA reports",
        )
        .await?;
        Ok(RequireCentralOffice(user))
    }
}

/// Requires `proponent`.
pub struct RequireProponent(pub User);

impl FromRequestParts<AppState> for RequireProponent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_with_role(parts, state, &[ROLE_PROPONENT], "act as a proponent").await?;
        Ok(RequireProponent(user))
    }
}
