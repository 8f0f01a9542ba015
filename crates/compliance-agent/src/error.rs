use doc_extract::ExtractError;
use session_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider call timed out after {0} seconds")]
    Timeout(u64),

    #[error("provider reply carried no completion content")]
    MalformedResponse,
}

impl ProviderError {
    /// Transport failures and 5xx statuses are transient; anything else
    /// (4xx, timeout, malformed body) will not get better on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::Timeout(_) | ProviderError::MalformedResponse => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("could not parse provider reply into a report: {0}")]
    MalformedReport(String),
}

/// Top-level failure taxonomy surfaced to the boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(ExtractError),

    #[error("{0}")]
    Extraction(ExtractError),

    #[error("analysis failed: {0}")]
    Analysis(AnalysisError),

    #[error("the AI provider timed out")]
    ProviderTimeout,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        if e.is_validation() {
            PipelineError::Validation(e)
        } else {
            PipelineError::Extraction(e)
        }
    }
}

impl From<AnalysisError> for PipelineError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Provider(ProviderError::Timeout(_)) => PipelineError::ProviderTimeout,
            other => PipelineError::Analysis(other),
        }
    }
}
