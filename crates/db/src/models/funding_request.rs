//! Funding document request model and DTOs.

use chrono::NaiveDate;
use mimaropa_core::error::CoreError;
use mimaropa_core::funding::{FundingDocument, FundingRequestStatus, RequiredDocument};
use mimaropa_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `funding_document_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FundingRequest {
    pub id: DbId,
    pub tna_id: DbId,
    pub application_id: DbId,
    pub proponent_id: DbId,
    pub requested_by: DbId,
    pub status: String,
    pub requested_at: Timestamp,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub funding_documents: Json<Vec<FundingDocument>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FundingRequest {
    pub fn parsed_status(&self) -> Result<FundingRequestStatus, CoreError> {
        FundingRequestStatus::from_str_db(&self.status)
    }
}

/// Request body for `POST /funding-requests`.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestDocuments {
    pub tna_id: DbId,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    /// Document types to request; the default set when omitted or empty.
    #[serde(default)]
    pub documents: Vec<RequiredDocument>,
}

/// Insert input for a new funding request.
#[derive(Debug, Clone)]
pub struct NewFundingRequest {
    pub tna_id: DbId,
    pub application_id: DbId,
    pub proponent_id: DbId,
    pub requested_by: DbId,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub funding_documents: Vec<FundingDocument>,
}

/// Request body for `PUT /funding-requests/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequestStatus {
    /// A request-level action such as `start_review` or `complete_funding`.
    pub action: String,
}

/// Request body for `PUT /funding-requests/{id}/documents/{index}/review`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewDocument {
    /// One of `approved`, `rejected`, `needs_revision`.
    pub status: String,
    #[validate(length(max = 5000))]
    pub comments: Option<String>,
}

/// Filters for listing funding requests.
#[derive(Debug, Default, Clone)]
pub struct FundingRequestFilter {
    pub status: Option<String>,
    pub proponent_id: Option<DbId>,
    pub province: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
