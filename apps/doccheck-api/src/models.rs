//! Response payloads for the doccheck API

use chrono::{DateTime, Utc};
use serde::Serialize;

use session_store::SessionView;
use shared_types::{ComplianceReport, FileId, ModifiedDocument};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: FileId,
    pub filename: String,
    pub compliance_report: ComplianceReport,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModifyResponse {
    pub file_id: FileId,
    pub modified_filename: String,
    pub preview: String,
    pub message: &'static str,
}

impl ModifyResponse {
    pub fn new(file_id: FileId, doc: ModifiedDocument) -> Self {
        Self {
            file_id,
            modified_filename: doc.filename,
            preview: doc.preview,
            message: "Document modified successfully",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub file_id: FileId,
    pub original_filename: String,
    pub stage: String,
    pub compliance_report: Option<ComplianceReport>,
    pub has_modified: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<SessionView> for StatusResponse {
    fn from(view: SessionView) -> Self {
        Self {
            stage: view.stage().to_string(),
            has_modified: view.modified.is_some(),
            file_id: view.file_id,
            original_filename: view.filename,
            compliance_report: view.report,
            timestamp: view.created_at,
        }
    }
}
