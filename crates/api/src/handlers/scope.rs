//! Record loading and visibility scoping shared by the workflow handlers.

use mimaropa_core::access::{ensure_can_view, ensure_province_scope, Actor};
use mimaropa_core::error::CoreError;
use mimaropa_core::types::DbId;
use mimaropa_db::models::funding_request::FundingRequest;
use mimaropa_db::models::tna::Tna;
use mimaropa_db::repositories::{FundingRequestRepo, TnaRepo, UserRepo};
use mimaropa_db::DbPool;

use crate::error::{AppError, AppResult};

/// Which proponent-owned rows a list request may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Province(String),
    Proponent(DbId),
    /// A province-scoped actor with no province on file.
    Nothing,
}

impl ListScope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.is_psto() {
            match actor.province.as_deref().map(str::trim) {
                Some(p) if !p.is_empty() => ListScope::Province(p.to_string()),
                _ => ListScope::Nothing,
            }
        } else if actor.is_proponent() {
            ListScope::Proponent(actor.user_id)
        } else {
            ListScope::All
        }
    }

    pub fn proponent_id(&self) -> Option<DbId> {
        match self {
            ListScope::Proponent(id) => Some(*id),
            _ => None,
        }
    }

    pub fn province(&self) -> Option<String> {
        match self {
            ListScope::Province(p) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ListScope::Nothing
    }
}

/// Province of a proponent, or `None` if the user is missing or has none.
pub async fn proponent_province(pool: &DbPool, proponent_id: DbId) -> AppResult<Option<String>> {
    Ok(UserRepo::find_by_id(pool, proponent_id)
        .await?
        .and_then(|u| u.province))
}

/// Province check for mutations. Only PSTO actors pay for the lookup.
pub async fn ensure_scope(pool: &DbPool, actor: &Actor, proponent_id: DbId) -> AppResult<()> {
    if actor.is_psto() {
        let province = proponent_province(pool, proponent_id).await?;
        ensure_province_scope(actor, province.as_deref())?;
    }
    Ok(())
}

/// Read access to a proponent-owned record.
pub async fn ensure_view(pool: &DbPool, actor: &Actor, proponent_id: DbId) -> AppResult<()> {
    let province = if actor.is_psto() {
        proponent_province(pool, proponent_id).await?
    } else {
        None
    };
    ensure_can_view(actor, proponent_id, province.as_deref())?;
    Ok(())
}

pub async fn load_tna(pool: &DbPool, id: DbId) -> AppResult<Tna> {
    TnaRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "TNA", id }))
}

pub async fn load_funding_request(pool: &DbPool, id: DbId) -> AppResult<FundingRequest> {
    FundingRequestRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FundingDocumentRequest",
            id,
        }))
}
