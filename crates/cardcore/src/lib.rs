//! Core abstractions for the card workflow engine
//!
//! This crate provides the card forest, the completion contract, and the
//! error/event types that all other components depend on. It has no runtime
//! behavior of its own.

mod card;
mod completion;
mod error;
mod events;
mod store;

pub use card::{Card, CardId, CardStatus, Position};
pub use completion::{next_input_from, CompletionPayload, TextCompletion};
pub use error::{CardflowError, CompletionError, EngineError};
pub use events::{EventBus, ExecutionEvent, RunId};
pub use store::{CardPatch, CardStore};

/// Result type for cardflow operations
pub type Result<T> = std::result::Result<T, CardflowError>;
