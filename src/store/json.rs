//! Single-document JSON backend.
//!
//! The full card set is one JSON array in one file, the same shape a browser
//! would keep under a single localStorage key. The file is read once on open
//! and rewritten on every mutation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CardStore, Result};
use crate::models::{CardKey, ReviewCard};

pub struct JsonFileStore {
    path: PathBuf,
    cards: BTreeMap<CardKey, ReviewCard>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cards = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let list: Vec<ReviewCard> = if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            };
            list.into_iter().map(|c| (c.key(), c)).collect()
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened {} with {} cards", path.display(), cards.len());
        Ok(Self { path, cards })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Write to .tmp then rename so a crash never leaves half a document
    fn save(&self, cards: &BTreeMap<CardKey, ReviewCard>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let list: Vec<&ReviewCard> = cards.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl CardStore for JsonFileStore {
    fn get(&self, key: &CardKey) -> Result<Option<ReviewCard>> {
        Ok(self.cards.get(key).cloned())
    }

    fn put(&mut self, card: &ReviewCard) -> Result<()> {
        // Only swap in the new map once it is on disk
        let mut next = self.cards.clone();
        next.insert(card.key(), card.clone());
        self.save(&next)?;
        self.cards = next;
        Ok(())
    }

    fn list(&self) -> Result<Vec<ReviewCard>> {
        Ok(self.cards.values().cloned().collect())
    }

    fn remove(&mut self, key: &CardKey) -> Result<bool> {
        if !self.cards.contains_key(key) {
            return Ok(false);
        }
        let mut next = self.cards.clone();
        next.remove(key);
        self.save(&next)?;
        self.cards = next;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::Difficulty;
    use crate::store::contract;

    fn setup_store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("cards.json")).unwrap();
        (dir, store)
    }

    mod contract_tests {
        use super::*;

        #[test]
        fn get_missing_is_none() {
            let (_dir, mut store) = setup_store();
            contract::get_missing_is_none(&mut store);
        }

        #[test]
        fn put_then_get() {
            let (_dir, mut store) = setup_store();
            contract::put_then_get(&mut store);
        }

        #[test]
        fn put_replaces_existing() {
            let (_dir, mut store) = setup_store();
            contract::put_replaces_existing(&mut store);
        }

        #[test]
        fn difficulty_is_part_of_key() {
            let (_dir, mut store) = setup_store();
            contract::difficulty_is_part_of_key(&mut store);
        }

        #[test]
        fn remove_card() {
            let (_dir, mut store) = setup_store();
            contract::remove_card(&mut store);
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn missing_file_is_empty_and_not_created() {
            let (dir, store) = setup_store();
            assert!(store.list().unwrap().is_empty());
            assert!(!dir.path().join("cards.json").exists());
        }

        #[test]
        fn put_survives_reopen() {
            let (dir, mut store) = setup_store();
            let card = contract::sample_card("q1", Difficulty::Advanced);
            store.put(&card).unwrap();

            let reopened = JsonFileStore::open(dir.path().join("cards.json")).unwrap();
            assert_eq!(reopened.get(&card.key()).unwrap(), Some(card));
        }

        #[test]
        fn remove_survives_reopen() {
            let (dir, mut store) = setup_store();
            let card = contract::sample_card("q1", Difficulty::Advanced);
            store.put(&card).unwrap();
            store.remove(&card.key()).unwrap();

            let reopened = JsonFileStore::open(dir.path().join("cards.json")).unwrap();
            assert!(reopened.list().unwrap().is_empty());
        }

        #[test]
        fn file_is_json_array() {
            let (dir, mut store) = setup_store();
            store
                .put(&contract::sample_card("q1", Difficulty::Beginner))
                .unwrap();

            let content = fs::read_to_string(dir.path().join("cards.json")).unwrap();
            let value: serde_json::Value = serde_json::from_str(&content).unwrap();
            let arr = value.as_array().unwrap();
            assert_eq!(arr.len(), 1);
            assert_eq!(arr[0]["question_id"], "q1");
            assert_eq!(arr[0]["difficulty"], "beginner");
        }

        #[test]
        fn no_tmp_file_left_behind() {
            let (dir, mut store) = setup_store();
            store
                .put(&contract::sample_card("q1", Difficulty::Beginner))
                .unwrap();
            assert!(!dir.path().join("cards.json.tmp").exists());
        }

        #[test]
        fn empty_file_is_empty_store() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cards.json");
            fs::write(&path, "").unwrap();

            let store = JsonFileStore::open(&path).unwrap();
            assert!(store.list().unwrap().is_empty());
        }

        #[test]
        fn garbage_file_is_json_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cards.json");
            fs::write(&path, "{not json").unwrap();

            let result = JsonFileStore::open(&path);
            assert!(matches!(result, Err(StoreError::Json(_))));
        }

        #[test]
        fn failed_write_leaves_memory_unchanged() {
            let dir = tempfile::tempdir().unwrap();
            // A directory where the file should be makes the rename fail
            let path = dir.path().join("cards.json");
            let mut store = JsonFileStore::open(&path).unwrap();
            fs::create_dir(&path).unwrap();
            fs::write(path.join("blocker"), "x").unwrap();

            let card = contract::sample_card("q1", Difficulty::Beginner);
            assert!(store.put(&card).is_err());
            assert!(store.get(&card.key()).unwrap().is_none());
        }
    }
}
