//! Card workflow execution runtime
//!
//! Walks the card forest from every root, invoking the completion client per
//! card and threading each card's output into its children, with sibling
//! subtrees running concurrently and failures isolated per subtree.

mod engine;

pub use engine::{RunSummary, WorkflowEngine, SEED_INPUT};
