//! Funding document request workflow.
//!
//! A request tracks two things independently: the request-level status, which
//! only moves through explicit actions in [`FundingRequestStatus::TRANSITIONS`],
//! and the per-document status of each entry in `funding_documents`, governed
//! by [`DocumentStatus::TRANSITIONS`]. Document reviews never recompute the
//! request status.

use serde::{Deserialize, Serialize};

use crate::attachment::FileAttachment;
use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_DOST_MIMAROPA, ROLE_PROPONENT, ROLE_PSTO};
use crate::types::{DbId, Timestamp};
use crate::workflow::{next_status, StatusMachine};

/// Maximum length of document review comments.
pub const MAX_DOCUMENT_COMMENTS_LENGTH: usize = 5_000;

/// Documents requested when the caller does not name any.
pub const DEFAULT_REQUIRED_DOCUMENTS: &[(&str, &str)] = &[
    ("letter_of_intent", "Letter of Intent"),
    ("project_proposal", "Project Proposal"),
    ("business_permit", "Business Permit"),
    ("financial_statements", "Audited Financial Statements"),
    ("equipment_quotations", "Equipment Quotations"),
];

// ---------------------------------------------------------------------------
// Request-level status
// ---------------------------------------------------------------------------

define_string_enum! {
    /// Aggregate status of a funding document request.
    FundingRequestStatus("funding request status") {
        ReadyForFunding = "ready_for_funding",
        DocumentsRequested = "documents_requested",
        DocumentsSubmitted = "documents_submitted",
        DocumentsUnderReview = "documents_under_review",
        DocumentsApproved = "documents_approved",
        DocumentsRejected = "documents_rejected",
        DocumentsRevisionRequested = "documents_revision_requested",
        FundingCompleted = "funding_completed",
    }
}

define_string_enum! {
    /// Explicit request-level actions.
    FundingRequestAction("funding request action") {
        RequestDocuments = "request_documents",
        MarkSubmitted = "mark_submitted",
        StartReview = "start_review",
        Approve = "approve",
        Reject = "reject",
        RequestRevision = "request_revision",
        CompleteFunding = "complete_funding",
    }
}

impl FundingRequestAction {
    /// Roles allowed to perform this action.
    ///
    /// `MarkSubmitted` is additionally restricted to the request's own
    /// proponent by the caller.
    pub fn allowed_roles(self) -> &'static [&'static str] {
        match self {
            Self::RequestDocuments => &[ROLE_PSTO, ROLE_DOST_MIMAROPA, ROLE_ADMIN],
            Self::MarkSubmitted => &[ROLE_PROPONENT],
            Self::StartReview
            | Self::Approve
            | Self::Reject
            | Self::RequestRevision
            | Self::CompleteFunding => &[ROLE_DOST_MIMAROPA, ROLE_ADMIN],
        }
    }
}

impl StatusMachine for FundingRequestStatus {
    type Action = FundingRequestAction;

    const ENTITY: &'static str = "FundingDocumentRequest";

    const TRANSITIONS: &'static [(Self, Self::Action, Self)] = &[
        (
            FundingRequestStatus::ReadyForFunding,
            FundingRequestAction::RequestDocuments,
            FundingRequestStatus::DocumentsRequested,
        ),
        (
            FundingRequestStatus::DocumentsRequested,
            FundingRequestAction::MarkSubmitted,
            FundingRequestStatus::DocumentsSubmitted,
        ),
        (
            FundingRequestStatus::DocumentsRevisionRequested,
            FundingRequestAction::MarkSubmitted,
            FundingRequestStatus::DocumentsSubmitted,
        ),
        (
            FundingRequestStatus::DocumentsSubmitted,
            FundingRequestAction::StartReview,
            FundingRequestStatus::DocumentsUnderReview,
        ),
        (
            FundingRequestStatus::DocumentsUnderReview,
            FundingRequestAction::Approve,
            FundingRequestStatus::DocumentsApproved,
        ),
        (
            FundingRequestStatus::DocumentsUnderReview,
            FundingRequestAction::Reject,
            FundingRequestStatus::DocumentsRejected,
        ),
        (
            FundingRequestStatus::DocumentsUnderReview,
            FundingRequestAction::RequestRevision,
            FundingRequestStatus::DocumentsRevisionRequested,
        ),
        (
            FundingRequestStatus::DocumentsApproved,
            FundingRequestAction::CompleteFunding,
            FundingRequestStatus::FundingCompleted,
        ),
    ];

    fn rejection(action: FundingRequestAction) -> String {
        match action {
            FundingRequestAction::RequestDocuments => {
                "Documents have already been requested for this TNA"
            }
            FundingRequestAction::MarkSubmitted => {
                "Documents can only be submitted while documents are requested or a revision is requested"
            }
            FundingRequestAction::StartReview => {
                "Documents must be submitted before review can start"
            }
            FundingRequestAction::Approve
            | FundingRequestAction::Reject
            | FundingRequestAction::RequestRevision => {
                "Documents must be under review to record a decision"
            }
            FundingRequestAction::CompleteFunding => {
                "Documents must be approved before funding can be completed"
            }
        }
        .to_string()
    }
}

impl FundingRequestStatus {
    /// Whether the proponent may currently attach documents.
    pub fn accepts_submissions(self) -> bool {
        matches!(
            self,
            Self::DocumentsRequested | Self::DocumentsRevisionRequested
        )
    }
}

// ---------------------------------------------------------------------------
// Document-level status
// ---------------------------------------------------------------------------

define_string_enum! {
    /// Status of a single funding sub-document.
    DocumentStatus("document status") {
        Pending = "pending",
        Submitted = "submitted",
        Approved = "approved",
        Rejected = "rejected",
        NeedsRevision = "needs_revision",
    }
}

/// Operations on a single funding sub-document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    Submit,
    Approve,
    Reject,
    RequestRevision,
}

impl StatusMachine for DocumentStatus {
    type Action = DocumentAction;

    const ENTITY: &'static str = "FundingDocument";

    const TRANSITIONS: &'static [(Self, Self::Action, Self)] = &[
        (DocumentStatus::Pending, DocumentAction::Submit, DocumentStatus::Submitted),
        (DocumentStatus::Submitted, DocumentAction::Submit, DocumentStatus::Submitted),
        (DocumentStatus::Rejected, DocumentAction::Submit, DocumentStatus::Submitted),
        (DocumentStatus::NeedsRevision, DocumentAction::Submit, DocumentStatus::Submitted),
        (DocumentStatus::Submitted, DocumentAction::Approve, DocumentStatus::Approved),
        (DocumentStatus::Submitted, DocumentAction::Reject, DocumentStatus::Rejected),
        (
            DocumentStatus::Submitted,
            DocumentAction::RequestRevision,
            DocumentStatus::NeedsRevision,
        ),
    ];

    fn rejection(action: DocumentAction) -> String {
        match action {
            DocumentAction::Submit => "An approved document cannot be replaced",
            DocumentAction::Approve | DocumentAction::Reject | DocumentAction::RequestRevision => {
                "Document must be submitted before it can be reviewed"
            }
        }
        .to_string()
    }
}

define_string_enum! {
    /// Central-office decision on a single document.
    DocumentDecision("document review status") {
        Approved = "approved",
        Rejected = "rejected",
        NeedsRevision = "needs_revision",
    }
}

impl DocumentDecision {
    pub fn action(self) -> DocumentAction {
        match self {
            Self::Approved => DocumentAction::Approve,
            Self::Rejected => DocumentAction::Reject,
            Self::NeedsRevision => DocumentAction::RequestRevision,
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// One entry in a request's ordered `funding_documents` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub name: String,
    pub document_status: DocumentStatus,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub file: Option<FileAttachment>,
    #[serde(default)]
    pub uploaded_at: Option<Timestamp>,
    #[serde(default)]
    pub review_comments: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<Timestamp>,
    #[serde(default)]
    pub reviewed_by: Option<DbId>,
}

impl FundingDocument {
    /// A requested document that has not been uploaded yet.
    pub fn pending(doc_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            name: name.into(),
            document_status: DocumentStatus::Pending,
            filename: None,
            original_name: None,
            file: None,
            uploaded_at: None,
            review_comments: None,
            reviewed_at: None,
            reviewed_by: None,
        }
    }
}

/// A document type requested by the caller of RequestDocuments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub name: String,
}

/// Build the initial `pending` document list.
///
/// Falls back to [`DEFAULT_REQUIRED_DOCUMENTS`] when `requested` is empty.
/// Duplicate types are rejected.
pub fn seed_documents(requested: &[RequiredDocument]) -> Result<Vec<FundingDocument>, CoreError> {
    if requested.is_empty() {
        return Ok(DEFAULT_REQUIRED_DOCUMENTS
            .iter()
            .map(|(t, n)| FundingDocument::pending(*t, *n))
            .collect());
    }

    let mut docs: Vec<FundingDocument> = Vec::with_capacity(requested.len());
    for doc in requested {
        validate_document_type(&doc.doc_type)?;
        if doc.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Requested document '{}' must have a name",
                doc.doc_type
            )));
        }
        if docs.iter().any(|d| d.doc_type == doc.doc_type) {
            return Err(CoreError::Validation(format!(
                "Document type '{}' is requested more than once",
                doc.doc_type
            )));
        }
        docs.push(FundingDocument::pending(doc.doc_type.trim(), doc.name.trim()));
    }
    Ok(docs)
}

/// Document types are lower-case identifiers (`[a-z0-9_]+`).
pub fn validate_document_type(doc_type: &str) -> Result<(), CoreError> {
    let valid = !doc_type.is_empty()
        && doc_type
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid document type '{doc_type}'. Use lower-case letters, digits and underscores"
        )))
    }
}

/// Attach an uploaded file to the document of type `doc_type`.
///
/// Replaces the file of an existing entry or appends a new one, and marks it
/// `submitted`. Returns the index of the affected entry.
pub fn apply_submission(
    docs: &mut Vec<FundingDocument>,
    doc_type: &str,
    name: Option<&str>,
    file: FileAttachment,
) -> Result<usize, CoreError> {
    validate_document_type(doc_type)?;

    let index = match docs.iter().position(|d| d.doc_type == doc_type) {
        Some(i) => i,
        None => {
            let name = name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(doc_type);
            docs.push(FundingDocument::pending(doc_type, name));
            docs.len() - 1
        }
    };

    let doc = &mut docs[index];
    doc.document_status = next_status(doc.document_status, DocumentAction::Submit)?;
    if let Some(n) = name.map(str::trim).filter(|n| !n.is_empty()) {
        doc.name = n.to_string();
    }
    doc.filename = Some(file.filename.clone());
    doc.original_name = Some(file.original_name.clone());
    doc.uploaded_at = Some(file.uploaded_at);
    doc.file = Some(file);
    doc.review_comments = None;
    doc.reviewed_at = None;
    doc.reviewed_by = None;
    Ok(index)
}

/// Record a central-office decision on the document at `index`.
pub fn apply_review(
    docs: &mut [FundingDocument],
    index: usize,
    decision: DocumentDecision,
    comments: Option<&str>,
    reviewer: DbId,
    now: Timestamp,
) -> Result<(), CoreError> {
    if let Some(c) = comments {
        if c.len() > MAX_DOCUMENT_COMMENTS_LENGTH {
            return Err(CoreError::Validation(format!(
                "Review comments exceed maximum length of {MAX_DOCUMENT_COMMENTS_LENGTH} characters"
            )));
        }
    }
    let doc = docs.get_mut(index).ok_or_else(|| {
        CoreError::Validation(format!("Document index {index} is out of range"))
    })?;

    doc.document_status = next_status(doc.document_status, decision.action())?;
    doc.review_comments = comments.map(str::to_string);
    doc.reviewed_at = Some(now);
    doc.reviewed_by = Some(reviewer);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn upload(filename: &str, original: &str) -> FileAttachment {
        FileAttachment {
            filename: filename.into(),
            original_name: original.into(),
            path: format!("uploads/{filename}"),
            size: 2048,
            mimetype: "application/pdf".into(),
            uploaded_at: Utc::now(),
            uploaded_by: 7,
        }
    }

    #[test]
    fn request_documents_starts_from_ready_for_funding() {
        assert_eq!(
            next_status(
                FundingRequestStatus::ReadyForFunding,
                FundingRequestAction::RequestDocuments
            )
            .unwrap(),
            FundingRequestStatus::DocumentsRequested
        );
    }

    #[test]
    fn request_level_happy_path() {
        let mut status = FundingRequestStatus::DocumentsRequested;
        for action in [
            FundingRequestAction::MarkSubmitted,
            FundingRequestAction::StartReview,
            FundingRequestAction::Approve,
            FundingRequestAction::CompleteFunding,
        ] {
            status = next_status(status, action).unwrap();
        }
        assert_eq!(status, FundingRequestStatus::FundingCompleted);
    }

    #[test]
    fn revision_loop() {
        let status = next_status(
            FundingRequestStatus::DocumentsUnderReview,
            FundingRequestAction::RequestRevision,
        )
        .unwrap();
        assert!(status.accepts_submissions());
        assert_eq!(
            next_status(status, FundingRequestAction::MarkSubmitted).unwrap(),
            FundingRequestStatus::DocumentsSubmitted
        );
    }

    #[test]
    fn completing_unapproved_request_fails() {
        assert_matches!(
            next_status(
                FundingRequestStatus::DocumentsSubmitted,
                FundingRequestAction::CompleteFunding
            ),
            Err(CoreError::InvalidState(_))
        );
    }

    #[test]
    fn action_strings_parse() {
        assert_eq!(
            "start_review".parse::<FundingRequestAction>().unwrap(),
            FundingRequestAction::StartReview
        );
        assert!("approved".parse::<FundingRequestAction>().is_err());
        assert_eq!(
            "needs_revision".parse::<DocumentDecision>().unwrap(),
            DocumentDecision::NeedsRevision
        );
    }

    #[test]
    fn default_documents_seeded_pending() {
        let docs = seed_documents(&[]).unwrap();
        assert_eq!(docs.len(), DEFAULT_REQUIRED_DOCUMENTS.len());
        assert!(docs.iter().all(|d| d.document_status == DocumentStatus::Pending));
    }

    #[test]
    fn duplicate_requested_types_rejected() {
        let doc = RequiredDocument {
            doc_type: "business_permit".into(),
            name: "Business Permit".into(),
        };
        assert!(seed_documents(&[doc.clone(), doc]).is_err());
    }

    #[test]
    fn submission_keeps_file_names() {
        let mut docs = seed_documents(&[]).unwrap();
        let idx = apply_submission(
            &mut docs,
            "business_permit",
            None,
            upload("funding-document-1.pdf", "permit-2025.pdf"),
        )
        .unwrap();

        let doc = &docs[idx];
        assert_eq!(doc.document_status, DocumentStatus::Submitted);
        assert_eq!(doc.filename.as_deref(), Some("funding-document-1.pdf"));
        assert_eq!(doc.original_name.as_deref(), Some("permit-2025.pdf"));
    }

    #[test]
    fn submission_of_unrequested_type_appends() {
        let mut docs = seed_documents(&[]).unwrap();
        let before = docs.len();
        let idx = apply_submission(
            &mut docs,
            "fda_license",
            Some("FDA License"),
            upload("f.pdf", "fda.pdf"),
        )
        .unwrap();
        assert_eq!(idx, before);
        assert_eq!(docs[idx].name, "FDA License");
    }

    #[test]
    fn approved_document_cannot_be_replaced() {
        let mut docs = seed_documents(&[]).unwrap();
        let idx = apply_submission(&mut docs, "letter_of_intent", None, upload("a.pdf", "a.pdf"))
            .unwrap();
        apply_review(&mut docs, idx, DocumentDecision::Approved, None, 3, Utc::now()).unwrap();

        let result = apply_submission(&mut docs, "letter_of_intent", None, upload("b.pdf", "b.pdf"));
        assert_matches!(result, Err(CoreError::InvalidState(_)));
        assert_eq!(docs[idx].filename.as_deref(), Some("a.pdf"));
    }

    #[test]
    fn review_records_comments_and_reviewer() {
        let mut docs = seed_documents(&[]).unwrap();
        let idx = apply_submission(&mut docs, "project_proposal", None, upload("p.pdf", "p.pdf"))
            .unwrap();
        apply_review(
            &mut docs,
            idx,
            DocumentDecision::NeedsRevision,
            Some("Budget table is incomplete"),
            3,
            Utc::now(),
        )
        .unwrap();

        let doc = &docs[idx];
        assert_eq!(doc.document_status, DocumentStatus::NeedsRevision);
        assert_eq!(doc.review_comments.as_deref(), Some("Budget table is incomplete"));
        assert_eq!(doc.reviewed_by, Some(3));
        assert!(doc.reviewed_at.is_some());
    }

    #[test]
    fn reviewing_pending_document_fails() {
        let mut docs = seed_documents(&[]).unwrap();
        let result = apply_review(&mut docs, 0, DocumentDecision::Approved, None, 3, Utc::now());
        assert_matches!(result, Err(CoreError::InvalidState(_)));
        assert_eq!(docs[0].document_status, DocumentStatus::Pending);
    }

    #[test]
    fn review_index_out_of_range() {
        let mut docs = seed_documents(&[]).unwrap();
        let result = apply_review(&mut docs, 99, DocumentDecision::Approved, None, 3, Utc::now());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn document_serializes_type_key() {
        let doc = FundingDocument::pending("business_permit", "Business Permit");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "business_permit");
        assert_eq!(json["document_status"], "pending");
    }
}
