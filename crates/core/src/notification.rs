//! Notification kinds and related-entity tags.
//!
//! Notifications are written by the background writer in `mimaropa-events`
//! and only read back by their recipient.

/// Related entity type for TNA notifications.
pub const ENTITY_TNA: &str = "tna";

/// Related entity type for funding request notifications.
pub const ENTITY_FUNDING_REQUEST: &str = "funding_document_request";

define_string_enum! {
    /// What happened, from the recipient's point of view.
    NotificationKind("notification kind") {
        TnaScheduled = "tna_scheduled",
        TnaInProgress = "tna_in_progress",
        TnaCompleted = "tna_completed",
        TnaForwarded = "tna_forwarded",
        TnaReviewed = "tna_reviewed",
        TnaSigned = "tna_signed",
        DocumentsRequested = "documents_requested",
        DocumentSubmitted = "document_submitted",
        DocumentReviewed = "document_reviewed",
        FundingStatusChanged = "funding_status_changed",
    }
}

impl NotificationKind {
    /// Default title shown in the notification list.
    pub fn title(self) -> &'static str {
        match self {
            Self::TnaScheduled => "TNA Scheduled",
            Self::TnaInProgress => "TNA In Progress",
            Self::TnaCompleted => "TNA Completed",
            Self::TnaForwarded => "TNA Report Forwarded",
            Self::TnaReviewed => "TNA Report Reviewed",
            Self::TnaSigned => "TNA Report Signed",
            Self::DocumentsRequested => "Funding Documents Requested",
            Self::DocumentSubmitted => "Funding Document Submitted",
            Self::DocumentReviewed => "Funding Document Reviewed",
            Self::FundingStatusChanged => "Funding Request Updated",
        }
    }

    /// The entity type notifications of this kind point at.
    pub fn related_entity_type(self) -> &'static str {
        match self {
            Self::TnaScheduled
            | Self::TnaInProgress
            | Self::TnaCompleted
            | Self::TnaForwarded
            | Self::TnaReviewed
            | Self::TnaSigned => ENTITY_TNA,
            Self::DocumentsRequested
            | Self::DocumentSubmitted
            | Self::DocumentReviewed
            | Self::FundingStatusChanged => ENTITY_FUNDING_REQUEST,
        }
    }
}
