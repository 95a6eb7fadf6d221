//! Technology Needs Assessment status workflow.
//!
//! A TNA is created `scheduled` by a PSTO and advances linearly through the
//! assessment, report upload, and central-office review. Every legal move is
//! a row in [`TnaStatus::TRANSITIONS`]; anything else is an
//! [`InvalidState`](CoreError::InvalidState) error.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::application::PROGRAM_SETUP;
use crate::error::CoreError;
use crate::workflow::StatusMachine;

/// Program name used when neither the TNA nor its application carries one.
pub const DEFAULT_PROGRAM_NAME: &str = PROGRAM_SETUP;

/// Maximum length of review comments stored into `notes`.
pub const MAX_REVIEW_COMMENTS_LENGTH: usize = 5_000;

/// Maximum number of assessment team members on a single TNA.
pub const MAX_ASSESSMENT_TEAM_SIZE: usize = 20;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

define_string_enum! {
    /// TNA lifecycle status.
    TnaStatus("TNA status") {
        Scheduled = "scheduled",
        InProgress = "in_progress",
        Completed = "completed",
        ReportUploaded = "report_uploaded",
        ForwardedToDostMimaropa = "forwarded_to_dost_mimaropa",
        DostMimaropaApproved = "dost_mimaropa_approved",
        DostMimaropaRejected = "dost_mimaropa_rejected",
        ReturnedToPsto = "returned_to_psto",
        SignedByRd = "signed_by_rd",
        /// Declared for display; no operation transitions into it.
        Cancelled = "cancelled",
    }
}

impl TnaStatus {
    /// Human-readable label for dashboards and notification text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::ReportUploaded => "Report Uploaded",
            Self::ForwardedToDostMimaropa => "Forwarded to DOST-MIMAROPA",
            Self::DostMimaropaApproved => "Approved by DOST-MIMAROPA",
            Self::DostMimaropaRejected => "Rejected by DOST-MIMAROPA",
            Self::ReturnedToPsto => "Returned to PSTO",
            Self::SignedByRd => "Signed by RD",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Statuses listed on the central-office report queue.
pub const DOST_MIMAROPA_REPORT_STATUSES: &[TnaStatus] = &[
    TnaStatus::ForwardedToDostMimaropa,
    TnaStatus::DostMimaropaApproved,
    TnaStatus::DostMimaropaRejected,
    TnaStatus::ReturnedToPsto,
    TnaStatus::SignedByRd,
];

/// Statuses from which funding documents may be requested (the assessment is
/// done and a report exists).
pub const FUNDING_ELIGIBLE_STATUSES: &[TnaStatus] = &[
    TnaStatus::ReportUploaded,
    TnaStatus::ForwardedToDostMimaropa,
    TnaStatus::DostMimaropaApproved,
    TnaStatus::SignedByRd,
];

// ---------------------------------------------------------------------------
// Actions and transition table
// ---------------------------------------------------------------------------

/// Operations that move a TNA between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TnaAction {
    MarkInProgress,
    MarkCompleted,
    UploadReport,
    ForwardToDostMimaropa,
    ReviewApprove,
    ReviewReject,
    ReviewReturn,
    UploadSignedReport,
}

impl StatusMachine for TnaStatus {
    type Action = TnaAction;

    const ENTITY: &'static str = "TNA";

    const TRANSITIONS: &'static [(Self, Self::Action, Self)] = &[
        (TnaStatus::Scheduled, TnaAction::MarkInProgress, TnaStatus::InProgress),
        (TnaStatus::InProgress, TnaAction::MarkCompleted, TnaStatus::Completed),
        (TnaStatus::Completed, TnaAction::UploadReport, TnaStatus::ReportUploaded),
        (TnaStatus::ReturnedToPsto, TnaAction::UploadReport, TnaStatus::ReportUploaded),
        (
            TnaStatus::ReportUploaded,
            TnaAction::ForwardToDostMimaropa,
            TnaStatus::ForwardedToDostMimaropa,
        ),
        (
            TnaStatus::ReturnedToPsto,
            TnaAction::ForwardToDostMimaropa,
            TnaStatus::ForwardedToDostMimaropa,
        ),
        (
            TnaStatus::ForwardedToDostMimaropa,
            TnaAction::ReviewApprove,
            TnaStatus::DostMimaropaApproved,
        ),
        (
            TnaStatus::ForwardedToDostMimaropa,
            TnaAction::ReviewReject,
            TnaStatus::DostMimaropaRejected,
        ),
        (
            TnaStatus::ForwardedToDostMimaropa,
            TnaAction::ReviewReturn,
            TnaStatus::ReturnedToPsto,
        ),
        (
            TnaStatus::DostMimaropaApproved,
            TnaAction::UploadSignedReport,
            TnaStatus::SignedByRd,
        ),
    ];

    fn rejection(action: TnaAction) -> String {
        match action {
            TnaAction::MarkInProgress => "TNA must be scheduled to be marked as in progress",
            TnaAction::MarkCompleted => "TNA must be in progress to be marked as completed",
            TnaAction::UploadReport => "TNA must be completed before uploading a report",
            TnaAction::ForwardToDostMimaropa => {
                "TNA report must be uploaded before forwarding to DOST-MIMAROPA"
            }
            TnaAction::ReviewApprove | TnaAction::ReviewReject | TnaAction::ReviewReturn => {
                "TNA must be forwarded to DOST-MIMAROPA before review"
            }
            TnaAction::UploadSignedReport => {
                "TNA must be approved by DOST-MIMAROPA before the signed report is uploaded"
            }
        }
        .to_string()
    }
}

define_string_enum! {
    /// Central-office review decision on a forwarded TNA report.
    ReviewOutcome("review action") {
        Approved = "approved",
        Rejected = "rejected",
        Returned = "returned",
    }
}

impl ReviewOutcome {
    /// The transition-table action for this decision.
    pub fn action(self) -> TnaAction {
        match self {
            Self::Approved => TnaAction::ReviewApprove,
            Self::Rejected => TnaAction::ReviewReject,
            Self::Returned => TnaAction::ReviewReturn,
        }
    }
}

// ---------------------------------------------------------------------------
// Assessment details
// ---------------------------------------------------------------------------

/// One member of the assessment team, stored in order as JSONB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentTeamMember {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Pick the program name for a TNA.
///
/// Fallback chain: explicit request value, then the TNA's existing value,
/// then the parent application's program, then [`DEFAULT_PROGRAM_NAME`].
/// Blank strings are skipped, so the result is never empty.
pub fn resolve_program_name(
    requested: Option<&str>,
    existing: Option<&str>,
    application: Option<&str>,
) -> String {
    [requested, existing, application]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PROGRAM_NAME)
        .to_string()
}

/// The location as stored: trimmed, and never blank.
pub fn normalize_location(location: &str) -> Result<String, CoreError> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Location is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Validate a `HH:MM` 24-hour schedule time.
pub fn validate_scheduled_time(time: &str) -> Result<(), CoreError> {
    let invalid = || {
        CoreError::Validation(format!(
            "Invalid scheduled time '{time}'. Expected HH:MM (24-hour)"
        ))
    };

    let (hh, mm) = time.split_once(':').ok_or_else(invalid)?;
    if hh.len() != 2 || mm.len() != 2 {
        return Err(invalid());
    }
    let hours: u8 = hh.parse().map_err(|_| invalid())?;
    let minutes: u8 = mm.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(())
}

/// Validate the ordered assessment team.
pub fn validate_assessment_team(team: &[AssessmentTeamMember]) -> Result<(), CoreError> {
    if team.len() > MAX_ASSESSMENT_TEAM_SIZE {
        return Err(CoreError::Validation(format!(
            "Assessment team cannot exceed {MAX_ASSESSMENT_TEAM_SIZE} members"
        )));
    }
    for (i, member) in team.iter().enumerate() {
        if member.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Assessment team member {} must have a name",
                i + 1
            )));
        }
        if let Some(email) = member.email.as_ref().filter(|e| !e.is_empty()) {
            if !email.validate_email() {
                return Err(CoreError::Validation(format!(
                    "Assessment team member {} has an invalid email '{email}'",
                    i + 1
                )));
            }
        }
    }
    Ok(())
}

/// Validate optional review comments.
pub fn validate_review_comments(comments: Option<&str>) -> Result<(), CoreError> {
    match comments {
        Some(c) if c.len() > MAX_REVIEW_COMMENTS_LENGTH => Err(CoreError::Validation(format!(
            "Review comments exceed maximum length of {MAX_REVIEW_COMMENTS_LENGTH} characters"
        ))),
        _ => Ok(()),
    }
}

/// Forwarding needs an uploaded report file, regardless of status.
pub fn ensure_report_present(report_filename: Option<&str>) -> Result<(), CoreError> {
    match report_filename {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(CoreError::Validation(
            "TNA report must be uploaded before forwarding to DOST-MIMAROPA".into(),
        )),
    }
}

/// Check whether funding documents may be requested for a TNA.
pub fn ensure_funding_eligible(status: TnaStatus, has_report: bool) -> Result<(), CoreError> {
    if FUNDING_ELIGIBLE_STATUSES.contains(&status) && has_report {
        Ok(())
    } else {
        Err(CoreError::InvalidState(
            "TNA must be completed and have an uploaded report before funding documents can be requested"
                .into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
