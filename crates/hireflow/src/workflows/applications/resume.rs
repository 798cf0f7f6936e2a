//! Client-side upload gate for resume attachments. The server re-validates; this only
//! avoids wasted uploads and gives immediate feedback.

use std::path::Path;

use mime::Mime;

pub const MAX_RESUME_BYTES: u64 = 5 * 1024 * 1024;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Exact allow-list of resume content types.
pub const ALLOWED_MIME_TYPES: [&str; 3] = [MIME_PDF, MIME_DOC, MIME_DOCX];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResumeError {
    #[error("Please select a PDF or Word document")]
    UnsupportedType { mime_type: String },
    #[error("File size must be less than 5MB")]
    TooLarge { size: u64, max: u64 },
    #[error("Resume file is empty")]
    Empty,
}

/// Check a candidate's declared type and size without reading its content.
pub fn check_resume(mime_type: &str, size: u64) -> Result<(), ResumeError> {
    let essence = mime_type
        .parse::<Mime>()
        .map(|parsed| parsed.essence_str().to_ascii_lowercase())
        .map_err(|_| ResumeError::UnsupportedType {
            mime_type: mime_type.to_string(),
        })?;

    if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
        return Err(ResumeError::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }

    if size > MAX_RESUME_BYTES {
        return Err(ResumeError::TooLarge {
            size,
            max: MAX_RESUME_BYTES,
        });
    }

    Ok(())
}

/// A resume picked by the user, held in memory until uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn validate(&self) -> Result<(), ResumeError> {
        if self.bytes.is_empty() {
            return Err(ResumeError::Empty);
        }
        check_resume(&self.mime_type, self.size())
    }
}
