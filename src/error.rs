use thiserror::Error;

use crate::models::CardKey;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SrsError {
    #[error("Invalid rating '{0}'. Use: again, hard, good, or easy")]
    InvalidRating(String),

    #[error("Invalid difficulty '{0}'. Use: beginner, intermediate, or advanced")]
    InvalidDifficulty(String),

    #[error("Card not found: {0}")]
    CardNotFound(CardKey),

    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SrsError>;
