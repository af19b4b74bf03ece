use async_trait::async_trait;
use cardcore::{CompletionError, CompletionPayload, TextCompletion};
use rand::Rng;
use tokio::time::{sleep, Duration};

/// Offline completion client used when no credential is configured.
///
/// Sleeps a randomized interval to simulate latency, then returns a
/// deterministic templated payload. Never performs network I/O, never fails.
pub struct MockClient {
    base_delay_ms: u64,
    jitter_ms: u64,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            base_delay_ms: 1000,
            jitter_ms: 1000,
        }
    }

    /// Zero-latency variant for tests.
    pub fn instant() -> Self {
        Self {
            base_delay_ms: 0,
            jitter_ms: 0,
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextCompletion for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str, _input: &str) -> Result<String, CompletionError> {
        let delay_ms = if self.jitter_ms > 0 {
            self.base_delay_ms + rand::thread_rng().gen_range(0..self.jitter_ms)
        } else {
            self.base_delay_ms
        };
        if delay_ms > 0 {
            sleep(Duration::from_millis(delay_ms)).await;
        }

        let payload = CompletionPayload::new(format!(
            "This is a mock response for the instruction \"{prompt}\". \
             Configure a Gemini API key to enable real completions."
        ));
        Ok(payload.to_json())
    }
}
