//! Mock LLM provider for deterministic testing

use crate::LlmError;
use async_trait::async_trait;
use polex_domain::{CompletionRequest, LlmProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A canned reply: text, or a failure with the given message
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Fail(message) => Err(LlmError::Communication(message)),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Contains(String),
}

impl Matcher {
    fn matches(&self, prompt: &str) -> bool {
        match self {
            Matcher::Exact(expected) => prompt == expected,
            Matcher::Contains(fragment) => prompt.contains(fragment.as_str()),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<Reply>,
    rules: Vec<(Matcher, Reply)>,
    requests: Vec<CompletionRequest>,
}

/// Mock LLM provider
///
/// Returns pre-configured responses without making any network calls.
/// Replies are resolved in this order: queued replies (one per call), then the
/// first matching prompt rule, then the default response.
///
/// # Examples
///
/// ```
/// use polex_domain::{CompletionRequest, LlmProvider};
/// use polex_llm::MockProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new("{}");
/// provider.add_response_containing("grant", r#"{"instrument_type":"grant"}"#);
///
/// let reply = provider.complete(&CompletionRequest::new("a grant scheme", 64)).await.unwrap();
/// assert_eq!(reply, r#"{"instrument_type":"grant"}"#);
/// assert_eq!(provider.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Sleep for `delay` before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report `model` as the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Answer `response` when the prompt equals `prompt`
    pub fn add_response(&self, prompt: impl Into<String>, response: impl Into<String>) {
        self.state()
            .rules
            .push((Matcher::Exact(prompt.into()), Reply::Text(response.into())));
    }

    /// Answer `response` when the prompt contains `fragment`
    pub fn add_response_containing(&self, fragment: impl Into<String>, response: impl Into<String>) {
        self.state()
            .rules
            .push((Matcher::Contains(fragment.into()), Reply::Text(response.into())));
    }

    /// Fail every call whose prompt contains `fragment`
    pub fn add_error_containing(&self, fragment: impl Into<String>) {
        self.state().rules.push((
            Matcher::Contains(fragment.into()),
            Reply::Fail("Mock error".to_string()),
        ));
    }

    /// Queue a reply for the next call, ahead of any rule
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().queue.push_back(Reply::Text(response.into()));
    }

    /// Queue a failure for the next call, ahead of any rule
    pub fn push_error(&self, message: impl Into<String>) {
        self.state().queue.push_back(Reply::Fail(message.into()));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state().requests.clone()
    }

    /// Reset the recorded requests
    pub fn reset_call_count(&self) {
        self.state().requests.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, request: &CompletionRequest) -> Reply {
        let mut state = self.state();
        state.requests.push(request.clone());

        if let Some(reply) = state.queue.pop_front() {
            return reply;
        }
        state
            .rules
            .iter()
            .find(|(matcher, _)| matcher.matches(&request.prompt))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let reply = self.next_reply(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest::new(prompt, 100)
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete(&request("any prompt")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response_containing("foo", "bar");

        assert_eq!(provider.complete(&request("hello")).await.unwrap(), "world");
        assert_eq!(provider.complete(&request("xx foo xx")).await.unwrap(), "bar");
        assert_eq!(
            provider.complete(&request("unknown")).await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_queued_replies_take_precedence() {
        let provider = MockProvider::new("default");
        provider.add_response("p", "rule");
        provider.push_error("first call fails");
        provider.push_response("second call");

        assert!(provider.complete(&request("p")).await.is_err());
        assert_eq!(provider.complete(&request("p")).await.unwrap(), "second call");
        assert_eq!(provider.complete(&request("p")).await.unwrap(), "rule");
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.add_error_containing("bad");

        let result = provider.complete(&request("a bad prompt")).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_records_requests() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.complete(&request("prompt1")).await.unwrap();
        provider.complete(&request("prompt2")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.requests()[1].prompt, "prompt2");
        assert_eq!(provider.requests()[0].temperature, 0.0);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete(&request("test")).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
