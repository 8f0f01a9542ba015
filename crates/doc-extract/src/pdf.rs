//! PDF text extraction backend.
//!
//! Uses `pdf-extract` on the raw bytes; reading order follows the PDF's
//! content stream order, which is the closest the format gets to reading
//! order. Password-protected PDFs are not supported and surface as
//! `Unreadable`.

use pdf_extract::extract_text_from_mem;

use crate::error::ExtractError;
use crate::TextExtractor;

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        extract_text_from_mem(data).map_err(|e| ExtractError::Unreadable {
            format: "pdf",
            reason: e.to_string(),
        })
    }
}
