use crate::card::CardId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardflowError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by a text completion client.
#[derive(Error, Debug, Clone)]
pub enum CompletionError {
    #[error("completion request failed: HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response contained no candidates")]
    NoCandidates,
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// A referenced card vanished from the run snapshot. Defensive only;
    /// the snapshot is immutable for the duration of a run.
    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("a run is already in progress")]
    RunInFlight,

    #[error(transparent)]
    Completion(#[from] CompletionError),
}
