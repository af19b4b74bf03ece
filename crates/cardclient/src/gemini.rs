use async_trait::async_trait;
use cardcore::{CompletionError, CompletionPayload, TextCompletion};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini text completion client
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// ── Wire types ───────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Compose the full prompt sent to the model: the card's instruction, the
/// delimited input handed down from the parent, and a directive demanding a
/// JSON object with a `text` key.
pub fn compose_prompt(prompt: &str, input: &str) -> String {
    format!(
        "Instruction: {prompt}\n\n\
         Input:\n---\n{input}\n---\n\n\
         Important: format your entire response as a JSON object containing a \
         single key named \"text\" whose value is your main reply.\n\
         Example: {{\"text\": \"your reply here...\"}}"
    )
}

/// Normalize a raw candidate into the payload contract.
///
/// Strips optional markdown code fences; a remainder that parses as JSON is
/// returned verbatim (it is trusted to already carry a `text` key), anything
/// else is wrapped into `{"text": raw}`. Unparseable model output is a silent
/// local recovery, never a user-visible error.
pub fn normalize_candidate(raw: &str) -> String {
    let cleaned = strip_code_fence(raw);
    if serde_json::from_str::<serde_json::Value>(cleaned).is_ok() {
        cleaned.to_string()
    } else {
        tracing::warn!("completion was not valid JSON, wrapping raw text");
        CompletionPayload::new(raw).to_json()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let without_suffix = without_prefix.strip_suffix("```").unwrap_or(without_prefix);
    without_suffix.trim()
}

#[async_trait]
impl TextCompletion for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str, input: &str) -> Result<String, CompletionError> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: compose_prompt(prompt, input),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .map(|detail| detail.message)
                .unwrap_or(text);
            return Err(CompletionError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let raw = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(CompletionError::NoCandidates)?;

        Ok(normalize_candidate(&raw))
    }
}
