//! Mock model client for testing and offline runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use super::traits::*;

/// Mock client.
///
/// Echoes the prompt back unless a scripted response matches, which keeps
/// fusion deterministic without a network.
pub struct MockClient {
    client_id: String,
    available: AtomicBool,
    responses: HashMap<String, String>,
    default_response: Option<String>,
    failing_prompts: HashSet<String>,
    delay: Option<Duration>,
    call_count: AtomicU32,
}

impl MockClient {
    /// Create a new echoing mock client.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            available: AtomicBool::new(true),
            responses: HashMap::new(),
            default_response: None,
            failing_prompts: HashSet::new(),
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Answer every unscripted prompt with this text instead of echoing.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.default_response = Some(content.into());
        self
    }

    /// Answer a specific prompt with a specific text.
    pub fn with_scripted(mut self, prompt: impl Into<String>, content: impl Into<String>) -> Self {
        self.responses.insert(prompt.into(), content.into());
        self
    }

    /// Fail whenever this prompt is sent.
    pub fn failing_on(mut self, prompt: impl Into<String>) -> Self {
        self.failing_prompts.insert(prompt.into());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl ModelClient for MockClient {
    fn id(&self) -> &str {
        &self.client_id
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, ClientError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("Mock client disabled".to_string()));
        }

        if self.failing_prompts.contains(prompt) {
            return Err(ClientError::RequestFailed(format!(
                "scripted failure for prompt {:?}",
                prompt
            )));
        }

        let text = self
            .responses
            .get(prompt)
            .or(self.default_response.as_ref())
            .cloned()
            .unwrap_or_else(|| prompt.to_string());

        // Rough token estimate
        let usage = Usage::new(prompt.len() as u32 / 4, text.len() as u32 / 4);

        Ok(Completion {
            text,
            metadata: CompletionMetadata {
                id: Some(format!("{}-{}", self.client_id, call)),
                model: model.to_string(),
                usage: Some(usage),
                error: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_by_default() {
        let client = MockClient::new("mock");
        let completion = client
            .complete("mock", "Summarize the minutes", &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.text, "Summarize the minutes");
        assert_eq!(completion.metadata.model, "mock");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_and_default() {
        let client = MockClient::new("gpt")
            .with_scripted("p1", "summarize X")
            .with_response("summary please");
        let options = CompletionOptions::default();

        assert_eq!(client.complete("gpt", "p1", &options).await.unwrap().text, "summarize X");
        assert_eq!(client.complete("gpt", "p9", &options).await.unwrap().text, "summary please");
        assert_eq!(client.call_count(), 2);

        client.reset_call_count();
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let client = MockClient::new("mock").failing_on("boom");
        let options = CompletionOptions::default();
        assert!(matches!(
            client.complete("mock", "boom", &options).await,
            Err(ClientError::RequestFailed(_))
        ));

        let offline = MockClient::new("mock").with_available(false);
        assert!(matches!(
            offline.complete("mock", "hi", &options).await,
            Err(ClientError::Unavailable(_))
        ));
    }
}
