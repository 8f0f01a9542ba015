//! Word document text extraction backend.
//!
//! Walks the document body paragraph by paragraph and joins run text with
//! newlines, matching how word processors present reading order. Legacy
//! binary `.doc` files are routed here best-effort; genuinely old files
//! fail as `Unreadable`.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

use crate::error::ExtractError;
use crate::TextExtractor;

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        let docx = read_docx(data).map_err(|e| ExtractError::Unreadable {
            format: "docx",
            reason: e.to_string(),
        })?;

        let mut paragraphs: Vec<String> = Vec::new();
        for child in docx.document.children.iter() {
            if let DocumentChild::Paragraph(para) = child {
                let mut text = String::new();
                for pc in para.children.iter() {
                    if let ParagraphChild::Run(run) = pc {
                        for rc in run.children.iter() {
                            if let RunChild::Text(t) = rc {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                if !text.is_empty() {
                    paragraphs.push(text);
                }
            }
        }

        Ok(paragraphs.join("\n"))
    }
}
