//! Program application constants and validation.
//!
//! Applications are owned by proponents and only touched by the TNA workflow
//! when a TNA is scheduled (status becomes `tna_scheduled`).

use crate::error::CoreError;

pub const PROGRAM_SETUP: &str = "SETUP";
pub const PROGRAM_GIA: &str = "GIA";
pub const PROGRAM_CEST: &str = "CEST";
pub const PROGRAM_SSCP: &str = "SSCP";

/// All funding programs an application may target.
pub const VALID_PROGRAMS: &[&str] = &[PROGRAM_SETUP, PROGRAM_GIA, PROGRAM_CEST, PROGRAM_SSCP];

/// Maximum length for an enterprise name.
pub const MAX_ENTERPRISE_NAME_LENGTH: usize = 255;

define_string_enum! {
    /// Application lifecycle status, as far as this backend observes it.
    ApplicationStatus("application status") {
        Submitted = "submitted",
        UnderReview = "under_review",
        PstoApproved = "psto_approved",
        PstoRejected = "psto_rejected",
        TnaScheduled = "tna_scheduled",
        TnaCompleted = "tna_completed",
        Funded = "funded",
    }
}

/// Validate that `program` names a known funding program.
pub fn validate_program_name(program: &str) -> Result<(), CoreError> {
    if VALID_PROGRAMS.contains(&program) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid program '{program}'. Must be one of: {}",
            VALID_PROGRAMS.join(", ")
        )))
    }
}

/// Validate the enterprise name of a new application.
pub fn validate_enterprise_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Enterprise name is required".into()));
    }
    if trimmed.len() > MAX_ENTERPRISE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Enterprise name exceeds maximum length of {MAX_ENTERPRISE_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
