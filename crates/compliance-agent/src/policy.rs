//! Timeout and retry policy for provider calls.
//!
//! Expressed as a value injected into the analyzer and modifier rather than
//! inline control flow, so the bound is visible and testable in one place.

use std::time::Duration;

use tracing::warn;

use crate::error::ProviderError;
use crate::provider::{ChatProvider, ChatRequest};

#[derive(Debug, Clone)]
pub struct CallPolicy {
    /// Hard bound on one provider call.
    pub timeout: Duration,
    /// Total attempts, including the first. Retries happen only on
    /// transient failures (transport errors, 5xx).
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_attempts: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl CallPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Run one provider call under the policy. A timeout surfaces immediately
/// as `ProviderError::Timeout`; retrying a full timeout would double
/// worst-case latency for a caller that has likely given up.
pub async fn complete_with_policy(
    provider: &dyn ChatProvider,
    policy: &CallPolicy,
    request: &ChatRequest,
) -> Result<String, ProviderError> {
    let mut attempt = 1u32;
    loop {
        let result = match tokio::time::timeout(policy.timeout, provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(policy.timeout.as_secs())),
        };

        match result {
            Ok(reply) => return Ok(reply),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                warn!(
                    provider = provider.name(),
                    attempt,
                    error = %e,
                    "provider call failed, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
