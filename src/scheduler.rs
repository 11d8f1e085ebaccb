//! SM-2 style scheduling over a four-button confidence scale.
//!
//! Each review moves the ease factor by a rating-dependent delta, then picks
//! the next interval:
//! - `Again` resets repetitions and uses the short relearn interval
//! - the first two passing reviews use fixed bootstrap intervals (1 then 6 days)
//! - later passing reviews grow the previous interval by the ease factor
//! - `Hard` and `Easy` scale the result down or up on top of that
//! - no interval grows past `max_interval_days`
//!
//! Everything here is pure. The current time is always passed in.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::models::{CardKey, MasteryColor, Rating, ReviewCard};

pub const MAX_MASTERY_LEVEL: u8 = 5;

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Builds a brand-new card that is due immediately.
    pub fn initialize_card(&self, key: &CardKey, now: DateTime<Utc>) -> ReviewCard {
        ReviewCard {
            question_id: key.question_id.clone(),
            channel: key.channel.clone(),
            difficulty: key.difficulty,
            ease_factor: self.config.default_ease,
            interval_days: 0,
            repetitions: 0,
            due_date: now,
            mastery_level: 0,
            last_reviewed_at: None,
            created_at: now,
            total_reviews: 0,
            lapses: 0,
        }
    }

    pub fn record_review(&self, card: &ReviewCard, rating: Rating, now: DateTime<Utc>) -> ReviewCard {
        let ease_factor = self.next_ease(card.ease_factor, rating);

        let (repetitions, interval_days, lapses) = match rating {
            Rating::Again => (0, self.config.relearn_interval_days, card.lapses + 1),
            _ => {
                let repetitions = card.repetitions + 1;
                let base = self.growth_interval(repetitions, card.interval_days, ease_factor);
                let interval = self.apply_rating_multiplier(base, rating);
                (repetitions, interval, card.lapses)
            }
        };

        let due_date = now
            .checked_add_signed(Duration::days(i64::from(interval_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mastery_level = self.mastery_level_for(repetitions, ease_factor);

        tracing::debug!(
            card = %card.key(),
            rating = %rating,
            ease_factor,
            interval_days,
            repetitions,
            "scheduled review"
        );

        ReviewCard {
            ease_factor,
            interval_days,
            repetitions,
            due_date,
            mastery_level,
            last_reviewed_at: Some(now),
            total_reviews: card.total_reviews + 1,
            lapses,
            ..card.clone()
        }
    }

    fn next_ease(&self, ease: f64, rating: Rating) -> f64 {
        let delta = match rating {
            Rating::Again => self.config.again_ease_delta,
            Rating::Hard => self.config.hard_ease_delta,
            Rating::Good => self.config.good_ease_delta,
            Rating::Easy => self.config.easy_ease_delta,
        };
        // Two decimals keeps repeated +/- deltas from drifting
        let ease = ((ease + delta) * 100.0).round() / 100.0;
        ease.max(self.config.min_ease)
    }

    fn growth_interval(&self, repetitions: u32, previous_interval: u32, ease: f64) -> u32 {
        match repetitions {
            0 | 1 => self.config.first_interval_days,
            2 => self.config.second_interval_days,
            _ => round_days(f64::from(previous_interval) * ease),
        }
    }

    fn apply_rating_multiplier(&self, base: u32, rating: Rating) -> u32 {
        let scaled = match rating {
            Rating::Hard => round_days(f64::from(base) * self.config.hard_interval_multiplier),
            Rating::Easy => round_days(f64::from(base) * self.config.easy_interval_multiplier),
            _ => base,
        };
        // A passing answer is never due again the same day
        scaled.max(1).min(self.config.max_interval_days)
    }

    /// Display-only summary of progress. Monotone in both arguments.
    pub fn mastery_level_for(&self, repetitions: u32, ease_factor: f64) -> u8 {
        match repetitions {
            0 => 0,
            1 => 1,
            2 => 2,
            3 | 4 => 3,
            _ if ease_factor >= self.config.default_ease => MAX_MASTERY_LEVEL,
            _ => 4,
        }
    }
}

fn round_days(days: f64) -> u32 {
    if days <= 0.0 {
        0
    } else if days >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        days.round() as u32
    }
}

pub fn mastery_label(level: u8) -> &'static str {
    match level {
        0 => "New",
        1 => "Learning",
        2 => "Familiar",
        3 => "Comfortable",
        4 => "Proficient",
        5 => "Mastered",
        _ => "Unknown",
    }
}

pub fn mastery_color(level: u8) -> MasteryColor {
    match level {
        1 => MasteryColor::Red,
        2 => MasteryColor::Orange,
        3 => MasteryColor::Yellow,
        4 => MasteryColor::Blue,
        5 => MasteryColor::Green,
        _ => MasteryColor::Gray,
    }
}
