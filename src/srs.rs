use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::due::{self, DueFilter};
use crate::error::{Result, SrsError};
use crate::models::{CardKey, Rating, ReviewCard};
use crate::scheduler::Scheduler;
use crate::store::CardStore;

/// Caller-facing operations: the scheduler bound to a card store.
///
/// Every mutation computes the complete new card first and then does a single
/// `put`, so a failed write never leaves a half-updated card behind. Store
/// errors are returned as-is with no retry.
pub struct Srs<S: CardStore> {
    store: S,
    scheduler: Scheduler,
}

impl<S: CardStore> Srs<S> {
    pub fn new(store: S, scheduler: Scheduler) -> Self {
        Self { store, scheduler }
    }

    pub fn with_defaults(store: S) -> Self {
        Self::new(store, Scheduler::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Starts tracking a question. Re-adding a known key returns the stored
    /// card untouched.
    pub fn add_to_srs(&mut self, key: &CardKey, now: DateTime<Utc>) -> Result<ReviewCard> {
        if let Some(existing) = self.store.get(key)? {
            tracing::debug!(card = %key, "already tracked, leaving as is");
            return Ok(existing);
        }

        let card = self.scheduler.initialize_card(key, now);
        self.store.put(&card)?;
        tracing::info!(card = %key, "added to SRS");
        Ok(card)
    }

    /// Applies a rating. An untracked key is initialized first, so rating a
    /// question is equivalent to adding it and then rating it.
    pub fn record_review(
        &mut self,
        key: &CardKey,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewCard> {
        let current = match self.store.get(key)? {
            Some(card) => card,
            None => {
                tracing::info!(card = %key, "first rating, initializing card");
                self.scheduler.initialize_card(key, now)
            }
        };

        let updated = self.scheduler.record_review(&current, rating, now);
        self.store.put(&updated)?;
        Ok(updated)
    }

    /// Same as [`Srs::record_review`] for raw user input. Rejects an unknown
    /// rating before touching the store.
    pub fn record_review_str(
        &mut self,
        key: &CardKey,
        rating: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewCard> {
        let rating = Rating::parse(rating)?;
        self.record_review(key, rating, now)
    }

    pub fn card(&self, key: &CardKey) -> Result<Option<ReviewCard>> {
        Ok(self.store.get(key)?)
    }

    pub fn require_card(&self, key: &CardKey) -> Result<ReviewCard> {
        self.card(key)?
            .ok_or_else(|| SrsError::CardNotFound(key.clone()))
    }

    /// All cards sorted by key.
    pub fn cards(&self) -> Result<Vec<ReviewCard>> {
        let mut cards = self.store.list()?;
        cards.sort_by_key(|c| c.key());
        Ok(cards)
    }

    pub fn due_cards(&self, now: DateTime<Utc>) -> Result<Vec<ReviewCard>> {
        Ok(due::due_cards(&self.store, now)?)
    }

    pub fn due_cards_filtered(
        &self,
        now: DateTime<Utc>,
        filter: &DueFilter,
    ) -> Result<Vec<ReviewCard>> {
        Ok(due::due_cards_filtered(&self.store, now, filter)?)
    }

    pub fn remove(&mut self, key: &CardKey) -> Result<bool> {
        let removed = self.store.remove(key)?;
        if removed {
            tracing::info!(card = %key, "removed from SRS");
        }
        Ok(removed)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let cards = self.store.list()?;
        Ok(Stats::from_cards(&cards, now))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_cards: usize,
    pub due_now: usize,
    pub proficient: usize,
    pub total_reviews: u64,
    pub total_lapses: u64,
    pub avg_ease: f64,
    pub avg_mastery: f64,
    pub next_due: Option<DateTime<Utc>>,
}

impl Stats {
    fn from_cards(cards: &[ReviewCard], now: DateTime<Utc>) -> Self {
        let total_cards = cards.len();
        let average = |sum: f64| {
            if total_cards == 0 {
                0.0
            } else {
                sum / total_cards as f64
            }
        };

        Self {
            total_cards,
            due_now: cards.iter().filter(|c| c.is_due(now)).count(),
            // Proficient or better
            proficient: cards.iter().filter(|c| c.mastery_level >= 4).count(),
            total_reviews: cards.iter().map(|c| u64::from(c.total_reviews)).sum(),
            total_lapses: cards.iter().map(|c| u64::from(c.lapses)).sum(),
            avg_ease: average(cards.iter().map(|c| c.ease_factor).sum()),
            avg_mastery: average(cards.iter().map(|c| f64::from(c.mastery_level)).sum()),
            next_due: due::earliest_upcoming(cards, now),
        }
    }
}
