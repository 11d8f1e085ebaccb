//! Due-set selection.
//!
//! A card is due once `due_date <= now`. The due set is rebuilt from the store
//! on every call and sorted most-overdue first, with the card key as a
//! tiebreak so two calls over the same store return the same order.

use chrono::{DateTime, Utc};

use crate::models::{Difficulty, ReviewCard};
use crate::store::{CardStore, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueFilter {
    pub channel: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: Option<usize>,
}

impl DueFilter {
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn accepts(&self, card: &ReviewCard) -> bool {
        self.channel.as_deref().map_or(true, |c| card.channel == c)
            && self.difficulty.map_or(true, |d| card.difficulty == d)
    }
}

pub fn due_cards<S: CardStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Result<Vec<ReviewCard>> {
    due_cards_filtered(store, now, &DueFilter::default())
}

pub fn due_cards_filtered<S: CardStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
    filter: &DueFilter,
) -> Result<Vec<ReviewCard>> {
    let mut due: Vec<ReviewCard> = store
        .list()?
        .into_iter()
        .filter(|c| c.is_due(now) && filter.accepts(c))
        .collect();

    due.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.question_id.cmp(&b.question_id))
            .then_with(|| a.channel.cmp(&b.channel))
            .then_with(|| a.difficulty.cmp(&b.difficulty))
    });

    if let Some(limit) = filter.limit {
        due.truncate(limit);
    }
    Ok(due)
}

/// Earliest due date still in the future, if any card is waiting.
pub fn next_due<S: CardStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    Ok(earliest_upcoming(&store.list()?, now))
}

pub(crate) fn earliest_upcoming(cards: &[ReviewCard], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cards
        .iter()
        .filter(|c| !c.is_due(now))
        .map(|c| c.due_date)
        .min()
}
