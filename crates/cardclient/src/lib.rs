//! Text completion clients
//!
//! The real Gemini client and the offline mock it falls back to when no
//! credential is configured.

mod gemini;
mod mock;

pub use gemini::{compose_prompt, normalize_candidate, GeminiClient, DEFAULT_MODEL};
pub use mock::MockClient;

use cardcore::TextCompletion;
use std::sync::Arc;

/// Pick a client for the given credential: Gemini when one is present, the
/// mock otherwise.
pub fn client_for(credential: Option<&str>) -> Arc<dyn TextCompletion> {
    match credential.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => Arc::new(GeminiClient::new(key)),
        None => {
            tracing::warn!("no API key configured, completions will be mocked");
            Arc::new(MockClient::new())
        }
    }
}
