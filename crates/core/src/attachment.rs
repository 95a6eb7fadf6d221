//! File attachment metadata and upload validation.
//!
//! Uploaded reports and funding documents live in a flat uploads directory
//! keyed by a generated filename. Entities only hold the [`FileAttachment`]
//! metadata record; file contents are never inspected.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Default upper bound on a single uploaded file (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Extensions accepted for reports and funding documents.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "jpg", "jpeg", "png"];

/// Filename prefix for uploaded TNA reports.
pub const PREFIX_TNA_REPORT: &str = "tna-report";

/// Filename prefix for RD-signed TNA reports.
pub const PREFIX_SIGNED_TNA_REPORT: &str = "signed-tna-report";

/// Filename prefix for funding documents.
pub const PREFIX_FUNDING_DOCUMENT: &str = "funding-document";

/// Metadata for a stored file, persisted as JSONB on the owning entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// Generated name of the file inside the uploads directory.
    pub filename: String,
    /// Name of the file as uploaded by the client.
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub mimetype: String,
    pub uploaded_at: Timestamp,
    pub uploaded_by: DbId,
}

/// Lower-cased extension of `name`, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validate an incoming upload and return its normalized extension.
pub fn validate_upload(original_name: &str, size: usize, max_bytes: usize) -> Result<String, CoreError> {
    if original_name.trim().is_empty() {
        return Err(CoreError::Validation("Uploaded file must have a name".into()));
    }
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "Uploaded file exceeds the maximum size of {max_bytes} bytes"
        )));
    }

    let ext = extension_of(original_name).ok_or_else(|| {
        CoreError::Validation(format!("File '{original_name}' has no extension"))
    })?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported file type '.{ext}'. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

/// Generate a unique stored filename such as `tna-report-<uuid>.pdf`.
pub fn generate_stored_filename(prefix: &str, ext: &str) -> String {
    format!("{prefix}-{}.{ext}", uuid::Uuid::new_v4())
}

/// Reject names that could escape the flat uploads directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// MIME type to serve for a stored file, derived from its extension.
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
