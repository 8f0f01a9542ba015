//! Application state for the doccheck API

use std::sync::Arc;
use std::time::Duration;

use compliance_agent::{CallPolicy, OpenRouterProvider, Pipeline};

const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    /// Build the pipeline from environment configuration:
    /// `AI_API_KEY`, `AI_API_URL`, `AI_MODEL`, `AI_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let api_key = std::env::var("AI_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("AI_API_KEY not set; provider calls will be rejected upstream");
            String::new()
        });
        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let mut provider = OpenRouterProvider::new(api_key, model);
        if let Ok(url) = std::env::var("AI_API_URL") {
            provider = provider.with_api_url(url);
        }

        let timeout = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        let policy = CallPolicy::default().with_timeout(Duration::from_secs(timeout));

        Self {
            pipeline: Pipeline::new(Arc::new(provider), policy),
        }
    }
}
