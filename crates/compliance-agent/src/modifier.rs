//! AI-assisted document correction.

use std::sync::Arc;

use tracing::debug;

use shared_types::{ComplianceReport, ModifiedDocument};

use crate::analyzer::truncate_chars;
use crate::error::AnalysisError;
use crate::policy::{complete_with_policy, CallPolicy};
use crate::provider::{ChatProvider, ChatRequest};

/// Length of the human-readable preview excerpt, in characters.
pub const PREVIEW_CHARS: usize = 500;

const MODIFY_MAX_TOKENS: u32 = 3_000;

pub struct DocumentModifier {
    provider: Arc<dyn ChatProvider>,
    policy: CallPolicy,
}

impl DocumentModifier {
    pub fn new(provider: Arc<dyn ChatProvider>, policy: CallPolicy) -> Self {
        Self { provider, policy }
    }

    /// Rewrite `text` to address the report's violations. The result
    /// replaces any prior corrected output for the session wholesale.
    pub async fn rewrite(
        &self,
        original_filename: &str,
        text: &str,
        report: &ComplianceReport,
    ) -> Result<ModifiedDocument, AnalysisError> {
        let request = ChatRequest {
            prompt: build_correction_prompt(text, report),
            max_tokens: MODIFY_MAX_TOKENS,
        };

        let reply = complete_with_policy(self.provider.as_ref(), &self.policy, &request).await?;
        let content = reply.trim().to_string();
        if content.is_empty() {
            return Err(AnalysisError::MalformedReport(
                "provider returned an empty correction".to_string(),
            ));
        }
        debug!(chars = content.len(), "received corrected document");

        Ok(ModifiedDocument {
            filename: modified_filename(original_filename),
            preview: make_preview(&content),
            content,
        })
    }
}

fn build_correction_prompt(text: &str, report: &ComplianceReport) -> String {
    let violations_summary = report
        .violations
        .iter()
        .map(|v| format!("- {} ({}, {})", v.issue, v.severity, v.location))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert English editor. Please rewrite the following document to \
         comply with English writing guidelines.\n\n\
         Original Guidelines Violations:\n{violations_summary}\n\n\
         Original Document:\n{text}\n\n\
         Please provide a corrected version that addresses all compliance issues while \
         maintaining the original meaning and intent. Focus on:\n\
         - Fixing grammar errors\n\
         - Improving sentence structure\n\
         - Enhancing clarity\n\
         - Correcting spelling and punctuation\n\
         - Maintaining logical flow\n\n\
         Return only the corrected document text without additional commentary."
    )
}

/// Corrected output is delivered as plain text named after the original.
fn modified_filename(original: &str) -> String {
    let stem = original
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(original);
    format!("modified_{stem}.txt")
}

/// First [`PREVIEW_CHARS`] characters, with an ellipsis when cut.
pub fn make_preview(content: &str) -> String {
    let (head, truncated) = truncate_chars(content, PREVIEW_CHARS);
    if truncated {
        format!("{head}…")
    } else {
        head.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use pretty_assertions::assert_eq;
    use shared_types::{ComplianceStatus, Severity, Violation};

    fn report_with_violation() -> ComplianceReport {
        ComplianceReport {
            overall_compliance: ComplianceStatus::NonCompliant,
            compliance_score: 40,
            summary: "Needs work.".to_string(),
            violations: vec![Violation {
                category: "Grammar".to_string(),
                issue: "Subject-verb disagreement".to_string(),
                severity: Severity::High,
                location: "Paragraph 3".to_string(),
            }],
            suggestions: vec![],
        }
    }

    #[tokio::test]
    async fn correction_prompt_references_the_violations() {
        let provider = std::sync::Arc::new(MockProvider::new().with_reply("Corrected text."));
        let modifier = DocumentModifier::new(provider.clone(), CallPolicy::default());

        let doc = modifier
            .rewrite("report.docx", "The documents is late.", &report_with_violation())
            .await
            .unwrap();

        assert_eq!(doc.content, "Corrected text.");
        assert_eq!(doc.filename, "modified_report.txt");
        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("Subject-verb disagreement"));
        assert!(prompt.contains("The documents is late."));
    }

    #[tokio::test]
    async fn empty_correction_is_an_error() {
        let provider = std::sync::Arc::new(MockProvider::new().with_reply("   \n  "));
        let modifier = DocumentModifier::new(provider, CallPolicy::default());

        let err = modifier
            .rewrite("a.pdf", "text", &report_with_violation())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));
    }

    #[test]
    fn preview_cuts_long_content_with_ellipsis() {
        let long = "x".repeat(PREVIEW_CHARS + 100);
        let preview = make_preview(&long);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 1);
        assert!(preview.ends_with('…'));

        let short = "short content";
        assert_eq!(make_preview(short), short);
    }

    #[test]
    fn modified_filename_strips_only_the_extension() {
        assert_eq!(modified_filename("annual.report.docx"), "modified_annual.report.txt");
        assert_eq!(modified_filename("plain"), "modified_plain.txt");
    }
}
