use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{CardStore, Result};
use crate::error::StoreError;
use crate::models::{CardKey, Difficulty, ReviewCard};

const CARD_COLUMNS: &str = r#"
    question_id, channel, difficulty, ease_factor, interval_days, repetitions,
    due_date, mastery_level, last_reviewed_at, created_at, total_reviews, lapses
"#;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS review_cards (
                question_id TEXT NOT NULL,
                channel TEXT NOT NULL,
                difficulty TEXT NOT NULL CHECK(difficulty IN ('beginner', 'intermediate', 'advanced')),
                ease_factor REAL NOT NULL,
                interval_days INTEGER NOT NULL DEFAULT 0 CHECK(interval_days >= 0),
                repetitions INTEGER NOT NULL DEFAULT 0 CHECK(repetitions >= 0),
                due_date TEXT NOT NULL,
                mastery_level INTEGER NOT NULL DEFAULT 0,
                last_reviewed_at TEXT,
                created_at TEXT NOT NULL,
                total_reviews INTEGER NOT NULL DEFAULT 0,
                lapses INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (question_id, channel, difficulty)
            );

            CREATE INDEX IF NOT EXISTS idx_review_cards_due ON review_cards(due_date);
            CREATE INDEX IF NOT EXISTS idx_review_cards_channel ON review_cards(channel);
            "#,
        )?;
        Ok(())
    }
}

// Column values as SQLite hands them back, before validation
struct CardRow {
    question_id: String,
    channel: String,
    difficulty: String,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    due_date: String,
    mastery_level: u8,
    last_reviewed_at: Option<String>,
    created_at: String,
    total_reviews: u32,
    lapses: u32,
}

impl CardRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            question_id: row.get(0)?,
            channel: row.get(1)?,
            difficulty: row.get(2)?,
            ease_factor: row.get(3)?,
            interval_days: row.get(4)?,
            repetitions: row.get(5)?,
            due_date: row.get(6)?,
            mastery_level: row.get(7)?,
            last_reviewed_at: row.get(8)?,
            created_at: row.get(9)?,
            total_reviews: row.get(10)?,
            lapses: row.get(11)?,
        })
    }

    fn into_card(self) -> Result<ReviewCard> {
        let storage_key = format!("{}:{}:{}", self.question_id, self.channel, self.difficulty);
        let corrupt = |reason: String| StoreError::Corrupt {
            key: storage_key.clone(),
            reason,
        };

        let difficulty = Difficulty::from_str(&self.difficulty)
            .ok_or_else(|| corrupt(format!("unknown difficulty '{}'", self.difficulty)))?;
        let due_date = parse_timestamp(&self.due_date).map_err(&corrupt)?;
        let created_at = parse_timestamp(&self.created_at).map_err(&corrupt)?;
        let last_reviewed_at = self
            .last_reviewed_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(&corrupt)?;

        Ok(ReviewCard {
            question_id: self.question_id,
            channel: self.channel,
            difficulty,
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
            due_date,
            mastery_level: self.mastery_level,
            last_reviewed_at,
            created_at,
            total_reviews: self.total_reviews,
            lapses: self.lapses,
        })
    }
}

fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{}': {}", s, e))
}

impl CardStore for SqliteStore {
    fn get(&self, key: &CardKey) -> Result<Option<ReviewCard>> {
        let sql = format!(
            "SELECT {} FROM review_cards WHERE question_id = ?1 AND channel = ?2 AND difficulty = ?3",
            CARD_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![key.question_id, key.channel, key.difficulty.as_str()],
                CardRow::from_row,
            )
            .optional()?;

        row.map(CardRow::into_card).transpose()
    }

    fn put(&mut self, card: &ReviewCard) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO review_cards (
                question_id, channel, difficulty, ease_factor, interval_days, repetitions,
                due_date, mastery_level, last_reviewed_at, created_at, total_reviews, lapses
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(question_id, channel, difficulty) DO UPDATE SET
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                due_date = excluded.due_date,
                mastery_level = excluded.mastery_level,
                last_reviewed_at = excluded.last_reviewed_at,
                created_at = excluded.created_at,
                total_reviews = excluded.total_reviews,
                lapses = excluded.lapses
            "#,
            params![
                card.question_id,
                card.channel,
                card.difficulty.as_str(),
                card.ease_factor,
                card.interval_days,
                card.repetitions,
                format_timestamp(&card.due_date),
                card.mastery_level,
                card.last_reviewed_at.as_ref().map(format_timestamp),
                format_timestamp(&card.created_at),
                card.total_reviews,
                card.lapses,
            ],
        )?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<ReviewCard>> {
        let sql = format!("SELECT {} FROM review_cards", CARD_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], CardRow::from_row)?;

        let mut cards = Vec::new();
        for row in rows {
            cards.push(row?.into_card()?);
        }
        Ok(cards)
    }

    fn remove(&mut self, key: &CardKey) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM review_cards WHERE question_id = ?1 AND channel = ?2 AND difficulty = ?3",
            params![key.question_id, key.channel, key.difficulty.as_str()],
        )?;
        Ok(rows > 0)
    }
}
