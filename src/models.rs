use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SrsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "b" => Some(Difficulty::Beginner),
            "intermediate" | "i" => Some(Difficulty::Intermediate),
            "advanced" | "a" => Some(Difficulty::Advanced),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).ok_or_else(|| SrsError::InvalidDifficulty(s.to_string()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// Four-button confidence scale shown after the answer is revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "again" | "a" | "1" => Some(Rating::Again),
            "hard" | "h" | "2" => Some(Rating::Hard),
            "good" | "g" | "3" => Some(Rating::Good),
            "easy" | "e" | "4" => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Parses user input, rejecting anything outside the four buckets.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).ok_or_else(|| SrsError::InvalidRating(s.to_string()))
    }

    pub fn is_passing(&self) -> bool {
        !matches!(self, Rating::Again)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Identity of a review card: one card per question, channel and difficulty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardKey {
    pub question_id: String,
    pub channel: String,
    pub difficulty: Difficulty,
}

impl CardKey {
    pub fn new(
        question_id: impl Into<String>,
        channel: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            channel: channel.into(),
            difficulty,
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}:{}:{}", self.question_id, self.channel, self.difficulty)
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.storage_key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCard {
    pub question_id: String,
    pub channel: String,
    pub difficulty: Difficulty,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub due_date: DateTime<Utc>,
    // Display only, recomputed on every review
    pub mastery_level: u8,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub lapses: u32,
}

impl ReviewCard {
    pub fn key(&self) -> CardKey {
        CardKey::new(
            self.question_id.clone(),
            self.channel.clone(),
            self.difficulty,
        )
    }

    pub fn matches(&self, key: &CardKey) -> bool {
        self.question_id == key.question_id
            && self.channel == key.channel
            && self.difficulty == key.difficulty
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date <= now
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_reviews == 0 {
            0.0
        } else {
            let passed = self.total_reviews.saturating_sub(self.lapses);
            (passed as f64 / self.total_reviews as f64) * 100.0
        }
    }
}

/// Colour token paired with a mastery level for badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryColor {
    Gray,
    Red,
    Orange,
    Yellow,
    Blue,
    Green,
}

impl MasteryColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryColor::Gray => "gray",
            MasteryColor::Red => "red",
            MasteryColor::Orange => "orange",
            MasteryColor::Yellow => "yellow",
            MasteryColor::Blue => "blue",
            MasteryColor::Green => "green",
        }
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
