//! Core traits for model clients.
//!
//! This module defines the `ModelClient` trait - the opaque
//! `complete(model, prompt, options) -> (text, metadata)` capability every
//! transport implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error types for a single model call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client is not available
    #[error("Client unavailable: {0}")]
    Unavailable(String),

    /// Request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the provider
    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The call did not finish within its deadline
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Client misconfigured (missing key, bad URL)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A transport able to answer a prompt.
///
/// Any implementation satisfying this signature is interchangeable.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Get the client identifier.
    fn id(&self) -> &str;

    /// Complete a prompt against the given model.
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, ClientError>;
}

/// Sampling and deadline options for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling mass
    pub top_p: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Per-call deadline; the orchestrator default applies when unset
    pub timeout_ms: Option<u64>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 256,
            timeout_ms: None,
        }
    }
}

impl CompletionOptions {
    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp.clamp(0.0, 2.0);
        self
    }

    /// Set top_p.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p.clamp(0.0, 1.0);
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The per-call deadline, if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Text plus provider metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Provider metadata
    pub metadata: CompletionMetadata,
}

/// Provider metadata attached to a completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionMetadata {
    /// Provider response id
    pub id: Option<String>,
    /// Model that answered
    pub model: String,
    /// Token usage, when reported
    pub usage: Option<Usage>,
    /// Why the call produced no real output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionMetadata {
    /// Metadata carrying only the model name.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Tokens overall
    pub total_tokens: u32,
}

impl Usage {
    /// Create usage with the total derived.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_clamp_and_timeout() {
        let options = CompletionOptions::default()
            .with_temperature(5.0)
            .with_top_p(1.5)
            .with_timeout(Duration::from_millis(250));
        assert_eq!(options.temperature, 2.0);
        assert_eq!(options.top_p, 1.0);
        assert_eq!(options.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(CompletionOptions::default().timeout(), None);
    }

    #[test]
    fn test_usage_total() {
        assert_eq!(Usage::new(5, 3).total_tokens, 8);
    }
}
