//! Durable personal best
//!
//! A single integer under one LocalStorage key, read at startup and written
//! only when a finished game beats it.

use crate::persistence::{KeyValueStore, StorageError};

/// Storage key for the personal best
pub const STORAGE_KEY: &str = "flappyFishHighScore";

/// A finished score replaces the stored best only when strictly greater
#[inline]
pub fn is_new_high_score(previous: u64, finished: u64) -> bool {
    finished > previous
}

/// Parse a stored value; anything that is not a non-negative integer is absent
pub fn parse_high_score(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// High score persisted through a key/value backend
pub struct HighScoreStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> HighScoreStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stored best, or 0 when missing, unreadable or malformed
    pub fn load(&self) -> u64 {
        match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match parse_high_score(&raw) {
                Some(score) => {
                    log::info!("Loaded high score {}", score);
                    score
                }
                None => {
                    log::warn!("Ignoring malformed high score {:?}", raw);
                    0
                }
            },
            Ok(None) => {
                log::info!("No high score found, starting fresh");
                0
            }
            Err(e) => {
                log::warn!("Could not read high score: {}", e);
                0
            }
        }
    }

    pub fn save(&mut self, score: u64) -> Result<(), StorageError> {
        self.storage.set(STORAGE_KEY, &score.to_string())?;
        log::info!("High score saved ({})", score);
        Ok(())
    }

    /// Persist `finished` if it beats `previous`; returns whether it did
    pub fn record(&mut self, previous: u64, finished: u64) -> Result<bool, StorageError> {
        if !is_new_high_score(previous, finished) {
            return Ok(false);
        }
        self.save(finished)?;
        Ok(true)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_strictly_greater_rule() {
        assert!(!is_new_high_score(5, 5));
        assert!(is_new_high_score(5, 6));
        assert!(!is_new_high_score(5, 0));
    }

    #[test]
    fn test_load_missing_is_zero() {
        let store = HighScoreStore::new(MemoryStore::new());
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_load_malformed_is_zero() {
        for raw in ["abc", "-3", "", "1.5"] {
            let store = HighScoreStore::new(MemoryStore::with_entry(STORAGE_KEY, raw));
            assert_eq!(store.load(), 0, "raw value {raw:?}");
        }
        let store = HighScoreStore::new(MemoryStore::with_entry(STORAGE_KEY, " 42 "));
        assert_eq!(store.load(), 42);
    }

    #[test]
    fn test_record_writes_only_new_best() {
        let mut store = HighScoreStore::new(MemoryStore::with_entry(STORAGE_KEY, "5"));
        assert!(!store.record(5, 5).unwrap());
        assert_eq!(store.load(), 5);
        assert!(store.record(5, 6).unwrap());
        assert_eq!(store.load(), 6);
        assert_eq!(
            store.storage().get(STORAGE_KEY).unwrap().as_deref(),
            Some("6")
        );
    }
}
