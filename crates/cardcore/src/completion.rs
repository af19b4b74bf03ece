use crate::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured result every completion client must produce.
///
/// A successful `complete` call always returns a serialized JSON object
/// carrying at least a `text` field; the engine threads that `text` value
/// into child cards as their input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionPayload {
    pub text: String,
}

impl CompletionPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Serialize into the wire shape stored on a card.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{{\"text\": {:?}}}", self.text))
    }
}

/// Core trait for turning (instruction, input text) into a completion payload
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Human-readable client identifier for logs
    fn name(&self) -> &str;

    /// Produce a serialized `CompletionPayload` from an instruction and the
    /// input text handed down from the parent card.
    async fn complete(&self, prompt: &str, input: &str) -> Result<String, CompletionError>;
}

/// Extract the `text` field from a serialized payload, falling back to the
/// raw string when it does not parse as a payload.
pub fn next_input_from(payload: &str) -> String {
    match serde_json::from_str::<CompletionPayload>(payload) {
        Ok(parsed) => parsed.text,
        Err(_) => payload.to_string(),
    }
}
