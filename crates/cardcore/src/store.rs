use crate::card::{Card, CardId, CardStatus, Position};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

// Canvas layout constants used for default placement only.
const CARD_WIDTH: f64 = 320.0;
const CARD_HEIGHT: f64 = 250.0;
const HORIZONTAL_GAP: f64 = 100.0;
const VERTICAL_GAP: f64 = 40.0;

/// Authoritative forest of cards, keyed by identity.
///
/// Parent/child links are stored as identities into the same map, never as
/// references. All mutations keep `children`/`parent` mutually consistent:
/// cards are only ever linked under an existing parent at creation time, and
/// deletion always removes a whole descendant closure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardStore {
    pub cards: HashMap<CardId, Card>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a card, optionally linked under `parent`.
    ///
    /// Returns `None` without inserting anything when `parent` names an
    /// unknown card. The default position offsets from the parent (or from
    /// the bottom-most root) and is purely cosmetic.
    pub fn create_card(&mut self, parent: Option<CardId>) -> Option<CardId> {
        let position = match parent {
            Some(parent_id) => {
                let parent_card = self.cards.get(&parent_id)?;
                let siblings = parent_card.children.len() as f64;
                Position::new(
                    parent_card.position.x + CARD_WIDTH + HORIZONTAL_GAP,
                    parent_card.position.y + siblings * (CARD_HEIGHT + VERTICAL_GAP),
                )
            }
            None => match self.roots().max_by(|a, b| a.position.y.total_cmp(&b.position.y)) {
                Some(last_root) => Position::new(
                    last_root.position.x,
                    last_root.position.y + CARD_HEIGHT + VERTICAL_GAP,
                ),
                None => Position::new(50.0, 50.0),
            },
        };

        let card = Card::new(parent, position);
        let id = card.id;
        self.cards.insert(id, card);

        if let Some(parent_id) = parent {
            if let Some(parent_card) = self.cards.get_mut(&parent_id) {
                parent_card.children.push(id);
            }
        }

        Some(id)
    }

    /// Merge updated fields into an existing card; no-op on unknown id.
    pub fn apply(&mut self, id: CardId, patch: CardPatch) {
        if let Some(card) = self.cards.get_mut(&id) {
            if let Some(prompt) = patch.prompt {
                card.prompt = prompt;
            }
            if let Some(position) = patch.position {
                card.position = position;
            }
        }
    }

    /// Remove a card and its entire descendant subtree, and detach it from
    /// its former parent. Idempotent when `id` is already absent.
    pub fn delete_card(&mut self, id: CardId) {
        let parent = match self.cards.get(&id) {
            Some(card) => card.parent,
            None => return,
        };

        for victim in self.descendant_closure(id) {
            self.cards.remove(&victim);
        }

        if let Some(parent_id) = parent {
            if let Some(parent_card) = self.cards.get_mut(&parent_id) {
                parent_card.children.retain(|child| *child != id);
            }
        }
    }

    /// Breadth-first descendant set of `id`, including `id` itself.
    fn descendant_closure(&self, id: CardId) -> Vec<CardId> {
        let mut closure = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if let Some(card) = self.cards.get(&current) {
                closure.push(current);
                queue.extend(card.children.iter().copied());
            }
        }
        closure
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.cards.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards with no parent, in no particular order.
    pub fn roots(&self) -> impl Iterator<Item = &Card> {
        self.cards.values().filter(|card| card.is_root())
    }

    /// Clear every card's status and result ahead of a run.
    pub fn reset_all(&mut self) {
        for card in self.cards.values_mut() {
            card.status = CardStatus::Idle;
            card.result = None;
        }
    }

    pub fn mark_processing(&mut self, id: CardId) {
        if let Some(card) = self.cards.get_mut(&id) {
            card.status = CardStatus::Processing;
        }
    }

    pub fn mark_done(&mut self, id: CardId, result: String) {
        if let Some(card) = self.cards.get_mut(&id) {
            card.status = CardStatus::Done;
            card.result = Some(result);
        }
    }

    pub fn mark_failed(&mut self, id: CardId, message: String) {
        if let Some(card) = self.cards.get_mut(&id) {
            card.status = CardStatus::Error;
            card.result = Some(message);
        }
    }

    /// Check parent/child consistency of an externally supplied board.
    ///
    /// The store's own API cannot create dangling links, but board files
    /// loaded from disk are untrusted.
    pub fn validate(&self) -> Result<(), String> {
        for card in self.cards.values() {
            if let Some(parent_id) = card.parent {
                let parent = self
                    .cards
                    .get(&parent_id)
                    .ok_or_else(|| format!("card {} points at unknown parent {}", card.id, parent_id))?;
                if !parent.children.contains(&card.id) {
                    return Err(format!(
                        "card {} is not listed among the children of its parent {}",
                        card.id, parent_id
                    ));
                }
            }
            for child_id in &card.children {
                let child = self
                    .cards
                    .get(child_id)
                    .ok_or_else(|| format!("card {} lists unknown child {}", card.id, child_id))?;
                if child.parent != Some(card.id) {
                    return Err(format!(
                        "card {} does not point back at its parent {}",
                        child_id, card.id
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Partial update for a card; fields left as `None` are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardPatch {
    pub prompt: Option<String>,
    pub position: Option<Position>,
}
