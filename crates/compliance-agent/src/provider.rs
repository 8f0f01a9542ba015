//! Chat-completions provider client.
//!
//! The provider's schema is untrusted: replies are returned as raw text and
//! parsed defensively by the callers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const TEMPERATURE: f32 = 0.3;

/// One completion request: a single user prompt plus an output budget.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// OpenRouter-compatible chat-completions provider.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: model.into(),
        }
    }

    /// Point at a different chat-completions endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: request.max_tokens,
            temperature: TEMPERATURE,
        };

        debug!(model = %self.model, prompt_chars = request.prompt.len(), "sending provider request");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|_| ProviderError::MalformedResponse)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ProviderError::MalformedResponse)
    }
}

/// Canned-reply provider for tests. Replies are consumed in order and the
/// prompts it saw are recorded for assertions.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .expect("mock replies lock")
            .push_back(Ok(reply.into()));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.replies
            .lock()
            .expect("mock replies lock")
            .push_back(Err(error));
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .expect("mock replies lock")
            .push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.replies
            .lock()
            .expect("mock replies lock")
            .push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock prompts lock").clone()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("mock prompts lock")
            .push(request.prompt.clone());
        self.replies
            .lock()
            .expect("mock replies lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Transport(
                    "mock provider has no queued reply".to_string(),
                ))
            })
    }
}
