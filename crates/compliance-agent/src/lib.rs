//! AI-backed document compliance: analysis, correction, and the pipeline
//! facade tying them to the session store.
//!
//! The external AI provider sits behind the [`provider::ChatProvider`]
//! trait; every call goes through an injected [`policy::CallPolicy`]
//! (timeout + bounded retry), and every reply is parsed defensively before
//! anything is stored.

pub mod analyzer;
pub mod error;
pub mod modifier;
pub mod pipeline;
pub mod policy;
pub mod provider;

pub use analyzer::{ComplianceAnalyzer, COMPLIANT_MIN_SCORE, MAX_ANALYSIS_CHARS};
pub use error::{AnalysisError, PipelineError, ProviderError};
pub use modifier::{DocumentModifier, PREVIEW_CHARS};
pub use pipeline::Pipeline;
pub use policy::CallPolicy;
pub use provider::{ChatProvider, ChatRequest, MockProvider, OpenRouterProvider};
