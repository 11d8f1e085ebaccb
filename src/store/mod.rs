//! # Card storage
//!
//! The scheduler never talks to a database directly. It goes through
//! [`CardStore`], a minimal keyed interface with upsert semantics, so the same
//! scheduling code runs against any backend:
//!
//! - [`MemoryStore`]: a `BTreeMap`, for tests and embedding
//! - [`SqliteStore`]: one row per card in a `review_cards` table
//! - [`JsonFileStore`]: the whole card set as one JSON document on disk
//!
//! The only consistency assumed is that a `put` is visible to later `get` and
//! `list` calls on the same store value. Stores do no locking of their own.

use crate::error::StoreError;
use crate::models::{CardKey, ReviewCard};

pub mod json;
pub mod memory;
pub mod sqlite;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait CardStore {
    /// Look up a card by its (question, channel, difficulty) key
    fn get(&self, key: &CardKey) -> Result<Option<ReviewCard>>;

    /// Insert or replace the card stored under `card.key()`
    fn put(&mut self, card: &ReviewCard) -> Result<()>;

    /// Every stored card, in no particular order
    fn list(&self) -> Result<Vec<ReviewCard>>;

    /// Administrative delete. Returns whether a card was removed.
    fn remove(&mut self, key: &CardKey) -> Result<bool>;
}
