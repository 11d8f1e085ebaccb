use std::collections::BTreeMap;

use super::{CardStore, Result};
use crate::models::{CardKey, ReviewCard};

/// In-process store with no persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    cards: BTreeMap<CardKey, ReviewCard>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<ReviewCard> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = ReviewCard>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().map(|c| (c.key(), c)).collect(),
        }
    }
}

impl CardStore for MemoryStore {
    fn get(&self, key: &CardKey) -> Result<Option<ReviewCard>> {
        Ok(self.cards.get(key).cloned())
    }

    fn put(&mut self, card: &ReviewCard) -> Result<()> {
        self.cards.insert(card.key(), card.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<ReviewCard>> {
        Ok(self.cards.values().cloned().collect())
    }

    fn remove(&mut self, key: &CardKey) -> Result<bool> {
        Ok(self.cards.remove(key).is_some())
    }
}
