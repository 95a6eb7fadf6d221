//! Program application model and DTOs.

use mimaropa_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub proponent_id: DbId,
    pub program_name: String,
    pub enterprise_name: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a new application.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplication {
    #[validate(length(min = 1, max = 16))]
    pub program_name: String,
    #[validate(length(min = 1, max = 255))]
    pub enterprise_name: String,
}

/// Filters for listing applications.
#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub proponent_id: Option<DbId>,
    pub province: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
