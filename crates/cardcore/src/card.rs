use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CardId = Uuid;

/// One instruction step in a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// User-supplied instruction; edits only affect future runs
    pub prompt: String,
    /// Serialized completion payload from the last run, if any
    pub result: Option<String>,
    pub status: CardStatus,
    /// Canvas coordinate, cosmetic only
    pub position: Position,
    /// Order carries no execution precedence; children run concurrently
    pub children: Vec<CardId>,
    pub parent: Option<CardId>,
}

impl Card {
    pub fn new(parent: Option<CardId>, position: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: String::new(),
            result: None,
            status: CardStatus::Idle,
            position,
            children: Vec::new(),
            parent,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Per-run card state: Idle -> Processing -> Done | Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Not touched by the current run (serialized as "none" for the canvas)
    #[default]
    #[serde(rename = "none")]
    Idle,
    Processing,
    Done,
    Error,
}

/// Card position in the visual canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
