use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file type not allowed for {filename:?}; accepted: pdf, docx, doc")]
    UnsupportedFormat { filename: String },

    #[error("file too large: {size} bytes (maximum {limit})")]
    FileTooLarge { size: usize, limit: usize },

    #[error("could not read {format} document: {reason}")]
    Unreadable {
        format: &'static str,
        reason: String,
    },

    #[error("no text could be extracted from the document")]
    EmptyDocument,
}

impl ExtractError {
    /// Whether the failure was caught by upload validation, before any
    /// extraction work ran.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExtractError::UnsupportedFormat { .. } | ExtractError::FileTooLarge { .. }
        )
    }
}
