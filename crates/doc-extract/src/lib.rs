//! Upload validation and document text extraction.
//!
//! Validation (extension whitelist, size cap) always runs before any
//! extraction work: extraction may be expensive on malformed input, so
//! rejected uploads never touch a parser. Extraction itself is
//! format-polymorphic behind [`TextExtractor`], with one backend per
//! format selected by the validated [`DocumentFormat`] — never by content
//! sniffing.

pub mod docx;
pub mod error;
pub mod pdf;

use shared_types::{DocumentFormat, UploadedFile};
use tracing::debug;

pub use docx::DocxExtractor;
pub use error::ExtractError;
pub use pdf::PdfExtractor;

/// Maximum accepted upload size: 16 MiB.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// One text-extraction backend per document format.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError>;
}

/// Lookup from validated format to extraction backend.
/// `.doc` routes to the Word reader best-effort.
pub fn extractor_for(format: DocumentFormat) -> &'static dyn TextExtractor {
    match format {
        DocumentFormat::Pdf => &PdfExtractor,
        DocumentFormat::Docx | DocumentFormat::Doc => &DocxExtractor,
    }
}

/// Validate upload metadata and wrap the bytes as an accepted file.
///
/// Rejects unsupported extensions and files over [`MAX_UPLOAD_BYTES`]
/// without touching the content. No side effects on failure.
pub fn validate_upload(filename: &str, data: Vec<u8>) -> Result<UploadedFile, ExtractError> {
    let format =
        DocumentFormat::from_filename(filename).ok_or_else(|| ExtractError::UnsupportedFormat {
            filename: filename.to_string(),
        })?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ExtractError::FileTooLarge {
            size: data.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    Ok(UploadedFile {
        filename: filename.to_string(),
        format,
        data,
    })
}

/// Extract plain text from an accepted upload.
///
/// Fails with `Unreadable` on corrupt input and `EmptyDocument` when the
/// source yields no usable text. No partial results.
pub fn extract_text(file: &UploadedFile) -> Result<String, ExtractError> {
    let text = extractor_for(file.format).extract(&file.data)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    debug!(
        filename = %file.filename,
        chars = text.len(),
        "extracted document text"
    );
    Ok(text.to_string())
}
