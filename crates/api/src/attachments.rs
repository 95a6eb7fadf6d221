//! Local-disk storage for uploaded reports and funding documents.
//!
//! Files live in one flat directory under generated names. Handlers first
//! [`prepare`](AttachmentStore::prepare) the metadata (which validates the
//! upload), run every workflow guard, then [`store`](AttachmentStore::store)
//! the bytes just before the database write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::{Body, Bytes};
use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::Response;
use chrono::Utc;
use mimaropa_core::attachment::{
    content_type_for, generate_stored_filename, is_safe_filename, validate_upload, FileAttachment,
};
use mimaropa_core::error::CoreError;
use mimaropa_core::types::DbId;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};

/// A file received in a multipart request, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A parsed multipart form: at most one file plus its text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Text field value, with blank values treated as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_file(&mut self) -> AppResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| AppError::Core(CoreError::Validation("No file uploaded".into())))
    }
}

/// Read every field of a multipart form. The part named `file` is kept as
/// the upload; all other parts are read as text.
pub async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let original_name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.file = Some(UploadedFile {
                original_name,
                content_type,
                bytes,
            });
        } else if !name.is_empty() {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// How a served file should be presented by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

impl Disposition {
    fn header_value(self, filename: &str) -> String {
        let kind = match self {
            Disposition::Attachment => "attachment",
            Disposition::Inline => "inline",
        };
        let sanitized: String = filename
            .chars()
            .map(|c| if c == '"' || c.is_control() { '_' } else { c })
            .collect();
        format!("{kind}; filename=\"{sanitized}\"")
    }
}

/// Flat uploads directory.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    base_dir: PathBuf,
    max_bytes: usize,
}

impl AttachmentStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_bytes,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validate `file` and build its metadata without touching the disk.
    pub fn prepare(
        &self,
        prefix: &str,
        file: &UploadedFile,
        uploaded_by: DbId,
    ) -> AppResult<FileAttachment> {
        let ext = validate_upload(&file.original_name, file.bytes.len(), self.max_bytes)?;
        let filename = generate_stored_filename(prefix, &ext);
        let mimetype = file
            .content_type
            .clone()
            .filter(|c| !c.is_empty() && c != "application/octet-stream")
            .unwrap_or_else(|| content_type_for(&filename).to_string());

        Ok(FileAttachment {
            path: self.base_dir.join(&filename).to_string_lossy().into_owned(),
            filename,
            original_name: file.original_name.clone(),
            size: file.bytes.len() as i64,
            mimetype,
            uploaded_at: Utc::now(),
            uploaded_by,
        })
    }

    /// Write the bytes for a prepared attachment.
    pub async fn store(&self, attachment: &FileAttachment, bytes: &[u8]) -> AppResult<()> {
        let path = self.resolve(&attachment.filename)?;
        tokio::fs::create_dir_all(&self.base_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(
            filename = %attachment.filename,
            size = attachment.size,
            uploaded_by = attachment.uploaded_by,
            "Stored uploaded file",
        );
        Ok(())
    }

    /// Best-effort removal of a file whose database write did not happen.
    pub async fn discard(&self, attachment: &FileAttachment) {
        if let Ok(path) = self.resolve(&attachment.filename) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(filename = %attachment.filename, error = %e, "Failed to remove orphaned upload");
            }
        }
    }

    /// Open a stored file, returning the handle and its length.
    ///
    /// `entity` and `id` name the owning record in the NotFound error.
    pub async fn open(
        &self,
        filename: &str,
        entity: &'static str,
        id: DbId,
    ) -> AppResult<(tokio::fs::File, u64)> {
        let path = self.resolve(filename)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(%filename, entity, id, "Stored file missing on disk");
                return Err(AppError::Core(CoreError::NotFound { entity, id }));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Stream a stored file as an HTTP response.
    pub async fn serve(
        &self,
        attachment: &FileAttachment,
        disposition: Disposition,
        entity: &'static str,
        id: DbId,
    ) -> AppResult<Response> {
        let (file, len) = self.open(&attachment.filename, entity, id).await?;
        let stream = ReaderStream::new(file);

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, attachment.mimetype.as_str())
            .header(header::CONTENT_LENGTH, len.to_string())
            .header(
                header::CONTENT_DISPOSITION,
                disposition.header_value(&attachment.original_name),
            )
            .body(Body::from_stream(stream))
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(AppError::BadRequest(format!(
                "Invalid stored filename '{filename}'"
            )));
        }
        Ok(self.base_dir.join(filename))
    }
}
