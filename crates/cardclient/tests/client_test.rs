use cardclient::{compose_prompt, normalize_candidate, MockClient};
use cardcore::{next_input_from, CompletionPayload, TextCompletion};

#[tokio::test]
async fn mock_returns_valid_payload_embedding_the_prompt() {
    let client = MockClient::instant();

    let result = client.complete("Summarize the report", "ignored").await.unwrap();

    let payload: CompletionPayload = serde_json::from_str(&result).unwrap();
    assert!(payload.text.contains("Summarize the report"));
}

#[tokio::test]
async fn mock_payload_round_trips_into_next_input() {
    let client = MockClient::instant();

    let result = client.complete("P1", "seed").await.unwrap();
    let payload: CompletionPayload = serde_json::from_str(&result).unwrap();

    assert_eq!(next_input_from(&result), payload.text);
}

#[tokio::test]
async fn mock_is_deterministic_per_prompt() {
    let client = MockClient::instant();

    let first = client.complete("P1", "a").await.unwrap();
    let second = client.complete("P1", "b").await.unwrap();

    assert_eq!(first, second);
}

#[test]
fn compose_prompt_embeds_instruction_input_and_directive() {
    let full = compose_prompt("Translate to French", "hello world");

    assert!(full.contains("Translate to French"));
    assert!(full.contains("hello world"));
    assert!(full.contains("\"text\""));
}

#[test]
fn normalize_accepts_plain_json_verbatim() {
    let raw = r#"{"text": "result"}"#;
    assert_eq!(normalize_candidate(raw), raw);
}

#[test]
fn normalize_strips_markdown_fences() {
    let raw = "```json\n{\"text\": \"fenced\"}\n```";
    assert_eq!(normalize_candidate(raw), "{\"text\": \"fenced\"}");

    let bare = "```\n{\"text\": \"bare fence\"}\n```";
    assert_eq!(normalize_candidate(bare), "{\"text\": \"bare fence\"}");
}

#[test]
fn normalize_wraps_non_json_text() {
    let wrapped = normalize_candidate("just prose, no JSON");

    let payload: CompletionPayload = serde_json::from_str(&wrapped).unwrap();
    assert_eq!(payload.text, "just prose, no JSON");
}

#[test]
fn next_input_falls_back_to_raw_payload() {
    assert_eq!(next_input_from("not json at all"), "not json at all");
}
