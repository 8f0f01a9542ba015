//! Compliance analysis: prompt construction, defensive reply parsing, and
//! the verdict derivation rule.
//!
//! The provider reply is treated as untrusted text. Parsing goes through a
//! loosely-typed [`RawReport`] first and only then converts to the strict
//! [`ComplianceReport`]; anything that cannot be converted is an
//! [`AnalysisError::MalformedReport`], never a silently defaulted report.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use shared_types::{ComplianceReport, ComplianceStatus, Severity, Violation};

use crate::error::AnalysisError;
use crate::policy::{complete_with_policy, CallPolicy};
use crate::provider::{ChatProvider, ChatRequest};

/// Character ceiling for document text sent to the provider. Text beyond
/// this is truncated from the end and the truncation is flagged in the
/// report summary.
pub const MAX_ANALYSIS_CHARS: usize = 12_000;

/// Minimum score for a `COMPLIANT` verdict.
pub const COMPLIANT_MIN_SCORE: u8 = 80;

const ANALYSIS_MAX_TOKENS: u32 = 2_000;

const GUIDELINES: &str = "\
1. Grammar Rules:
   - Use proper subject-verb agreement
   - Correct use of tenses
   - Proper punctuation and capitalization
   - Avoid run-on sentences
   - Do not flag email addresses for capitalization or grammar issues.

2. Sentence Structure:
   - Use clear and concise sentences
   - Avoid overly complex sentence structures
   - Maintain proper sentence flow
   - Use active voice when possible

3. Clarity and Style:
   - Use simple and clear language
   - Avoid unnecessary jargon
   - Maintain consistent tone
   - Use proper paragraph structure

4. Writing Rules:
   - Use proper spelling
   - Maintain consistent formatting
   - Use appropriate transitions
   - Ensure logical flow of ideas
";

pub struct ComplianceAnalyzer {
    provider: Arc<dyn ChatProvider>,
    policy: CallPolicy,
}

impl ComplianceAnalyzer {
    pub fn new(provider: Arc<dyn ChatProvider>, policy: CallPolicy) -> Self {
        Self { provider, policy }
    }

    /// Analyze extracted document text into a compliance report.
    pub async fn analyze(&self, text: &str) -> Result<ComplianceReport, AnalysisError> {
        let (excerpt, truncated) = truncate_chars(text, MAX_ANALYSIS_CHARS);
        let request = ChatRequest {
            prompt: build_analysis_prompt(excerpt),
            max_tokens: ANALYSIS_MAX_TOKENS,
        };

        let reply = complete_with_policy(self.provider.as_ref(), &self.policy, &request).await?;
        debug!(reply_chars = reply.len(), "received analysis reply");

        let mut report = parse_report(&reply)?;
        if truncated {
            report.summary.push_str(&format!(
                " (Analysis covers the first {MAX_ANALYSIS_CHARS} characters of the document; \
                 the remainder was truncated.)"
            ));
        }
        Ok(report)
    }
}

/// Cut `text` to at most `limit` characters, never splitting a UTF-8
/// scalar. Returns the excerpt and whether anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

const REPORT_SCHEMA: &str = r#"{
    "overall_compliance": "COMPLIANT" or "NON_COMPLIANT",
    "compliance_score": <score out of 100>,
    "violations": [
        {
            "category": "<Grammar/Structure/Clarity/Writing>",
            "issue": "<description of the issue>",
            "location": "<approximate location in text>",
            "severity": "<Critical/High/Medium/Low>"
        }
    ],
    "suggestions": ["<general improvement suggestions>"],
    "summary": "<overall summary of compliance status>"
}"#;

fn build_analysis_prompt(text: &str) -> String {
    format!(
        "You are an expert English language compliance checker. Analyze the following \
         document text against these guidelines:\n\n{GUIDELINES}\n\
         Document Text:\n{text}\n\n\
         Respond with a compliance report as a single JSON object in exactly this \
         format:\n{REPORT_SCHEMA}\n\n\
         Focus on identifying specific violations and provide actionable feedback. \
         Return only the JSON object."
    )
}

/// Loosely-typed mirror of whatever the provider actually sent back.
#[derive(Deserialize)]
struct RawReport {
    compliance_score: Option<Value>,
    #[serde(default)]
    violations: Vec<RawViolation>,
    #[serde(default)]
    suggestions: Vec<String>,
    summary: Option<String>,
}

#[derive(Deserialize)]
struct RawViolation {
    category: Option<String>,
    issue: Option<String>,
    location: Option<String>,
    severity: Option<String>,
}

/// Parse a provider reply into a strict report.
///
/// The reply may wrap the JSON in prose; the outermost `{...}` slice is
/// taken. The provider's own `overall_compliance` string is ignored: the
/// verdict is re-derived from score and severities so the label is always
/// consistent with the data.
pub fn parse_report(reply: &str) -> Result<ComplianceReport, AnalysisError> {
    let json = extract_json_object(reply).ok_or_else(|| {
        AnalysisError::MalformedReport("no JSON object in provider reply".to_string())
    })?;

    let raw: RawReport = serde_json::from_str(json)
        .map_err(|e| AnalysisError::MalformedReport(format!("invalid JSON: {e}")))?;

    let score = clamp_score(raw.compliance_score.as_ref())?;

    let mut violations = Vec::with_capacity(raw.violations.len());
    for v in raw.violations {
        let severity_str = v.severity.ok_or_else(|| {
            AnalysisError::MalformedReport("violation missing severity".to_string())
        })?;
        let severity = Severity::parse(&severity_str).ok_or_else(|| {
            AnalysisError::MalformedReport(format!("unknown severity {severity_str:?}"))
        })?;
        let issue = v.issue.ok_or_else(|| {
            AnalysisError::MalformedReport("violation missing issue".to_string())
        })?;
        violations.push(Violation {
            category: v.category.unwrap_or_else(|| "General".to_string()),
            issue,
            severity,
            location: v.location.unwrap_or_else(|| "Document".to_string()),
        });
    }

    let summary = raw
        .summary
        .ok_or_else(|| AnalysisError::MalformedReport("missing summary".to_string()))?;

    Ok(ComplianceReport {
        overall_compliance: derive_status(score, &violations),
        compliance_score: score,
        summary,
        violations,
        suggestions: raw.suggestions,
    })
}

/// Slice out the outermost `{...}` of a reply that may wrap JSON in prose
/// or markdown fences.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end >= start).then(|| &reply[start..=end])
}

/// Clamp a provider-supplied score into 0..=100.
///
/// Accepts JSON numbers and numeric strings (providers emit both); anything
/// else is a malformed report.
pub fn clamp_score(value: Option<&Value>) -> Result<u8, AnalysisError> {
    let value = value.ok_or_else(|| {
        AnalysisError::MalformedReport("missing compliance_score".to_string())
    })?;

    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| {
        AnalysisError::MalformedReport(format!("non-numeric compliance_score: {value}"))
    })?;

    Ok(n.clamp(0.0, 100.0) as u8)
}

/// The verdict derivation rule: `COMPLIANT` iff the score reaches
/// [`COMPLIANT_MIN_SCORE`] and no violation is High or Critical. A pure
/// function of its inputs.
pub fn derive_status(score: u8, violations: &[Violation]) -> ComplianceStatus {
    let blocking = violations.iter().any(|v| v.severity >= Severity::High);
    if score >= COMPLIANT_MIN_SCORE && !blocking {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::NonCompliant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn violation(severity: Severity) -> Violation {
        Violation {
            category: "Grammar".to_string(),
            issue: "Run-on sentence".to_string(),
            severity,
            location: "Paragraph 1".to_string(),
        }
    }

    const GOOD_REPLY: &str = r#"Here is the report you asked for:
    {
        "overall_compliance": "COMPLIANT",
        "compliance_score": 55,
        "violations": [
            {"category": "Grammar", "issue": "Run-on sentence", "location": "Paragraph 2", "severity": "High"}
        ],
        "suggestions": ["Split long sentences"],
        "summary": "Several grammar issues."
    }
    Let me know if you need anything else."#;

    #[test]
    fn parses_json_wrapped_in_prose_and_rederives_verdict() {
        let report = parse_report(GOOD_REPLY).unwrap();
        assert_eq!(report.compliance_score, 55);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].severity, Severity::High);
        // Provider claimed COMPLIANT; score and severity say otherwise.
        assert_eq!(report.overall_compliance, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn missing_fields_default_only_where_harmless() {
        let reply = r#"{"compliance_score": 90, "summary": "Clean.",
            "violations": [{"issue": "Typo", "severity": "low"}]}"#;
        let report = parse_report(reply).unwrap();
        assert_eq!(report.violations[0].category, "General");
        assert_eq!(report.violations[0].location, "Document");
        assert!(report.suggestions.is_empty());
        assert_eq!(report.overall_compliance, ComplianceStatus::Compliant);
    }

    #[test]
    fn reply_without_json_is_malformed() {
        let err = parse_report("I could not analyze this document, sorry.").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));
    }

    #[test]
    fn missing_score_is_malformed() {
        let err = parse_report(r#"{"summary": "ok", "violations": []}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));
    }

    #[test]
    fn missing_summary_is_malformed() {
        let err = parse_report(r#"{"compliance_score": 80, "violations": []}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));
    }

    #[test]
    fn unknown_severity_is_malformed() {
        let reply = r#"{"compliance_score": 80, "summary": "x",
            "violations": [{"issue": "y", "severity": "catastrophic"}]}"#;
        let err = parse_report(reply).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));
    }

    #[test]
    fn score_is_clamped_into_range() {
        assert_eq!(clamp_score(Some(&json!(-5))).unwrap(), 0);
        assert_eq!(clamp_score(Some(&json!(250))).unwrap(), 100);
        assert_eq!(clamp_score(Some(&json!(72.9))).unwrap(), 72);
        assert_eq!(clamp_score(Some(&json!("88"))).unwrap(), 88);
    }

    #[test]
    fn non_numeric_score_is_malformed() {
        assert!(clamp_score(Some(&json!("high"))).is_err());
        assert!(clamp_score(Some(&json!([1, 2]))).is_err());
        assert!(clamp_score(None).is_err());
    }

    #[test]
    fn derivation_rule_requires_score_and_severities() {
        // High score, no blockers: compliant.
        assert_eq!(
            derive_status(80, &[violation(Severity::Medium)]),
            ComplianceStatus::Compliant
        );
        // Score below the floor.
        assert_eq!(derive_status(79, &[]), ComplianceStatus::NonCompliant);
        // Blocking severity despite a perfect score.
        assert_eq!(
            derive_status(100, &[violation(Severity::High)]),
            ComplianceStatus::NonCompliant
        );
        assert_eq!(
            derive_status(100, &[violation(Severity::Critical)]),
            ComplianceStatus::NonCompliant
        );
    }

    #[test]
    fn truncate_chars_respects_utf8_boundaries() {
        let text = "héllo wörld";
        let (cut, truncated) = truncate_chars(text, 4);
        assert_eq!(cut, "héll");
        assert!(truncated);

        let (all, truncated) = truncate_chars(text, 100);
        assert_eq!(all, text);
        assert!(!truncated);
    }

    #[tokio::test]
    async fn long_documents_are_truncated_and_flagged() {
        let provider = std::sync::Arc::new(MockProvider::new().with_reply(
            r#"{"compliance_score": 95, "summary": "Mostly fine.", "violations": []}"#,
        ));
        let analyzer = ComplianceAnalyzer::new(provider.clone(), CallPolicy::default());

        let text = "word ".repeat(5_000); // 25k chars
        let report = analyzer.analyze(&text).await.unwrap();

        assert!(report.summary.contains("truncated"));
        let prompt = &provider.prompts()[0];
        // The prompt carries at most the ceiling's worth of document text.
        assert!(prompt.len() < MAX_ANALYSIS_CHARS + 2_500);
    }

    #[tokio::test]
    async fn short_documents_are_not_flagged() {
        let provider = std::sync::Arc::new(MockProvider::new().with_reply(
            r#"{"compliance_score": 95, "summary": "Fine.", "violations": []}"#,
        ));
        let analyzer = ComplianceAnalyzer::new(provider, CallPolicy::default());
        let report = analyzer.analyze("A short document.").await.unwrap();
        assert_eq!(report.summary, "Fine.");
    }
}
