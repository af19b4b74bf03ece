use crate::card::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type RunId = Uuid;

/// Events emitted while a run is in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    RunStarted {
        run_id: RunId,
        roots: usize,
        total_cards: usize,
        timestamp: DateTime<Utc>,
    },
    CardStarted {
        run_id: RunId,
        card_id: CardId,
        timestamp: DateTime<Utc>,
    },
    CardCompleted {
        run_id: RunId,
        card_id: CardId,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    CardFailed {
        run_id: RunId,
        card_id: CardId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    RunCompleted {
        run_id: RunId,
        completed: usize,
        failed: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast channel carrying execution events to the canvas and CLI
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    /// Send never blocks; events are dropped when nobody listens.
    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
