pub mod types;

pub use types::{
    ComplianceReport, ComplianceStatus, DocumentFormat, FileId, ModifiedDocument, Severity,
    UploadedFile, Violation,
};
