pub mod config;
pub mod due;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod srs;
pub mod store;

pub use config::SchedulerConfig;
pub use due::{due_cards, due_cards_filtered, next_due, DueFilter};
pub use error::{SrsError, StoreError};
pub use models::{CardKey, Difficulty, MasteryColor, Rating, ReviewCard};
pub use scheduler::{mastery_color, mastery_label, Scheduler};
pub use srs::{Srs, Stats};
pub use store::{CardStore, JsonFileStore, MemoryStore, SqliteStore};
