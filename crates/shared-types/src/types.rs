//! Core data model for the document compliance pipeline.

use serde::{Deserialize, Serialize};

/// Opaque handle for one upload's session state.
///
/// Minted as a UUID v4 so ids are not guessable or sequential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
}

impl DocumentFormat {
    /// Parse from a filename's extension, case-insensitively.
    /// Returns `None` for missing or unsupported extensions.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
        }
    }
}

/// An accepted upload. Never constructed for rejected files.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub format: DocumentFormat,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Filename without its extension, for deriving output names.
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.filename)
    }
}

/// Severity of a single violation. Ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a provider-supplied severity string. Case-insensitive, with
    /// aliases for the loose vocabulary providers actually emit.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "info" => Some(Self::Low),
            "medium" | "warning" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Overall verdict for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

/// A single flagged compliance problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub category: String,
    pub issue: String,
    pub severity: Severity,
    pub location: String,
}

/// Structured verdict for one analyzed document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub overall_compliance: ComplianceStatus,
    pub compliance_score: u8, // 0..=100
    pub summary: String,
    pub violations: Vec<Violation>,
    pub suggestions: Vec<String>,
}

/// Corrected output for one session. Replaced wholesale on re-modify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedDocument {
    pub filename: String,
    pub content: String,
    pub preview: String,
}
