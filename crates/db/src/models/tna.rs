//! TNA entity model and DTOs.

use chrono::NaiveDate;
use mimaropa_core::attachment::FileAttachment;
use mimaropa_core::error::CoreError;
use mimaropa_core::tna::{AssessmentTeamMember, TnaStatus};
use mimaropa_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `tnas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tna {
    pub id: DbId,
    pub application_id: DbId,
    pub proponent_id: DbId,
    pub scheduled_by: DbId,
    pub completed_by: Option<DbId>,
    pub updated_by: Option<DbId>,
    pub forwarded_by: Option<DbId>,
    pub reviewed_by: Option<DbId>,
    pub program_name: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub location: String,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub email: Option<String>,
    pub assessment_team: Json<Vec<AssessmentTeamMember>>,
    pub notes: Option<String>,
    pub status: String,
    pub tna_report: Option<Json<FileAttachment>>,
    pub report_summary: Option<String>,
    pub report_recommendations: Option<String>,
    pub signed_tna_report: Option<Json<FileAttachment>>,
    pub forwarded_to_dost_mimaropa_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub reviewed_at: Option<Timestamp>,
    pub signed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tna {
    /// Parse the stored status string.
    pub fn parsed_status(&self) -> Result<TnaStatus, CoreError> {
        TnaStatus::from_str_db(&self.status)
    }

    pub fn report(&self) -> Option<&FileAttachment> {
        self.tna_report.as_ref().map(|r| &r.0)
    }

    pub fn signed_report(&self) -> Option<&FileAttachment> {
        self.signed_tna_report.as_ref().map(|r| &r.0)
    }
}

/// Request body for `POST /tna/schedule`.
#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleTna {
    pub application_id: DbId,
    pub proponent_id: DbId,
    pub program_name: Option<String>,
    pub scheduled_date: NaiveDate,
    #[validate(length(equal = 5, message = "Scheduled time must be HH:MM"))]
    pub scheduled_time: String,
    #[validate(length(min = 1, max = 500, message = "Location is required"))]
    pub location: String,
    #[validate(length(max = 255))]
    pub contact_person: Option<String>,
    #[validate(length(max = 50))]
    pub contact_phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub assessment_team: Vec<AssessmentTeamMember>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Validated insert input for a new TNA.
#[derive(Debug, Clone)]
pub struct NewTna {
    pub application_id: DbId,
    pub proponent_id: DbId,
    pub scheduled_by: DbId,
    pub program_name: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub location: String,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub email: Option<String>,
    pub assessment_team: Vec<AssessmentTeamMember>,
    pub notes: Option<String>,
}

/// Request body for `POST /tna/{id}/review`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewTna {
    /// One of `approved`, `rejected`, `returned`.
    pub action: String,
    #[validate(length(max = 5000))]
    pub comments: Option<String>,
}

/// Filters for listing TNAs.
#[derive(Debug, Default, Clone)]
pub struct TnaFilter {
    /// Only TNAs in one of these statuses.
    pub statuses: Option<Vec<String>>,
    /// Only TNAs owned by this proponent.
    pub proponent_id: Option<DbId>,
    /// Only TNAs whose proponent lives in this province.
    pub province: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
