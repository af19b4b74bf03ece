use cardcore::{
    next_input_from, Card, CardId, CardStatus, CardStore, EngineError, EventBus, ExecutionEvent,
    RunId, TextCompletion,
};
use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Input handed to every root card at the start of a run.
pub const SEED_INPUT: &str = "This is the initial input to the workflow.";

/// Runs every tree in the card forest, threading each card's output into its
/// children and isolating failures per subtree.
///
/// Sibling subtrees execute concurrently; within one card, the completion
/// call always settles before its children start. One engine owns one
/// workflow session, so the single-flight gate lives here rather than in
/// process-global state.
pub struct WorkflowEngine {
    store: Arc<RwLock<CardStore>>,
    client: Arc<dyn TextCompletion>,
    events: Arc<EventBus>,
    running: AtomicBool,
}

impl WorkflowEngine {
    pub fn new(store: Arc<RwLock<CardStore>>, client: Arc<dyn TextCompletion>) -> Self {
        Self::with_event_bus(store, client, Arc::new(EventBus::default()))
    }

    pub fn with_event_bus(
        store: Arc<RwLock<CardStore>>,
        client: Arc<dyn TextCompletion>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            client,
            events,
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<RwLock<CardStore>> {
        &self.store
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Execute one full pass over the forest, from reset to settlement.
    ///
    /// Fails fast with [`EngineError::RunInFlight`] when a run is already
    /// active; per-card failures never escape, they become `Error` status on
    /// the card.
    pub async fn run(&self) -> Result<RunSummary, EngineError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::RunInFlight);
        }

        let summary = self.run_to_settlement().await;
        self.running.store(false, Ordering::SeqCst);
        Ok(summary)
    }

    async fn run_to_settlement(&self) -> RunSummary {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        // Snapshot before the visible clear, so prompt edits and structure
        // changes made while the run is in flight cannot affect it.
        let snapshot: Arc<HashMap<CardId, Card>> = {
            let mut store = self.store.write().await;
            let snapshot = store.cards.clone();
            store.reset_all();
            Arc::new(snapshot)
        };

        let roots: Vec<CardId> = snapshot
            .values()
            .filter(|card| card.is_root())
            .map(|card| card.id)
            .collect();

        self.events.emit(ExecutionEvent::RunStarted {
            run_id,
            roots: roots.len(),
            total_cards: snapshot.len(),
            timestamp: Utc::now(),
        });
        tracing::info!(%run_id, roots = roots.len(), cards = snapshot.len(), "starting run");

        join_all(roots.iter().map(|root| {
            self.execute_node(run_id, Arc::clone(&snapshot), *root, SEED_INPUT.to_string())
        }))
        .await;

        let (completed, failed) = {
            let store = self.store.read().await;
            let completed = store
                .cards
                .values()
                .filter(|card| card.status == CardStatus::Done)
                .count();
            let failed = store
                .cards
                .values()
                .filter(|card| card.status == CardStatus::Error)
                .count();
            (completed, failed)
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        self.events.emit(ExecutionEvent::RunCompleted {
            run_id,
            completed,
            failed,
            duration_ms,
            timestamp: Utc::now(),
        });
        tracing::info!(%run_id, completed, failed, duration_ms, "run settled");

        RunSummary {
            run_id,
            total: snapshot.len(),
            completed,
            failed,
            duration_ms,
        }
    }

    /// Execute one card, then all of its children concurrently with the
    /// card's output as their shared input.
    ///
    /// Boxed because the recursion depth follows the tree depth. Every
    /// failure is converted to `Error` status here; descendants of a failed
    /// card are never visited and keep their reset state for the whole run.
    fn execute_node(
        &self,
        run_id: RunId,
        snapshot: Arc<HashMap<CardId, Card>>,
        id: CardId,
        input: String,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let started = Instant::now();
            self.store.write().await.mark_processing(id);
            self.events.emit(ExecutionEvent::CardStarted {
                run_id,
                card_id: id,
                timestamp: Utc::now(),
            });

            match self.complete_card(&snapshot, id, &input).await {
                Ok((payload, children)) => {
                    self.store.write().await.mark_done(id, payload.clone());
                    self.events.emit(ExecutionEvent::CardCompleted {
                        run_id,
                        card_id: id,
                        duration_ms: started.elapsed().as_millis() as u64,
                        timestamp: Utc::now(),
                    });
                    tracing::debug!(card = %id, "card completed");

                    if !children.is_empty() {
                        let next_input = next_input_from(&payload);
                        join_all(children.iter().map(|child| {
                            self.execute_node(
                                run_id,
                                Arc::clone(&snapshot),
                                *child,
                                next_input.clone(),
                            )
                        }))
                        .await;
                    }
                }
                Err(error) => {
                    let message = format!("Execution failed: {error}");
                    tracing::error!(card = %id, %error, "card failed");
                    self.store.write().await.mark_failed(id, message.clone());
                    self.events.emit(ExecutionEvent::CardFailed {
                        run_id,
                        card_id: id,
                        error: message,
                        timestamp: Utc::now(),
                    });
                }
            }
        })
    }

    async fn complete_card(
        &self,
        snapshot: &HashMap<CardId, Card>,
        id: CardId,
        input: &str,
    ) -> Result<(String, Vec<CardId>), EngineError> {
        let card = snapshot.get(&id).ok_or(EngineError::CardNotFound(id))?;
        let payload = self.client.complete(&card.prompt, input).await?;
        Ok((payload, card.children.clone()))
    }
}

/// Outcome of one full run over the forest
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}
