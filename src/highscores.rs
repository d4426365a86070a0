//! High score leaderboard system
//!
//! Tracks the top 10 runs as `{name, score, date}` entries, sorted by score
//! descending. Stored as a JSON record through the persistence gateway.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistError, Storage};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Longest name kept on an entry
pub const MAX_NAME_LEN: usize = 12;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    /// Day the run ended, `YYYY-MM-DD`
    pub date: String,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Storage record name
    pub const RECORD: &'static str = "leaderboard";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify.
    /// A tie goes below the entries already holding that score.
    pub fn add_score(&mut self, name: &str, score: u64, date: &str) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            name: sanitize_name(name),
            score,
            date: date.to_string(),
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Parse a stored record. Entries are re-sorted and trimmed so a
    /// hand-edited file cannot break the ordering.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let mut scores: HighScores = serde_json::from_str(json).map_err(|source| PersistError::Json {
            record: Self::RECORD,
            source,
        })?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string(self).map_err(|source| PersistError::Json {
            record: Self::RECORD,
            source,
        })
    }

    /// Load from storage. Missing or malformed records give an empty board.
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.read(Self::RECORD) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    scores
                }
                Err(e) => {
                    log::warn!("Discarding leaderboard: {e}");
                    Self::new()
                }
            },
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Could not read leaderboard: {e}");
                Self::new()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PersistError> {
        storage.write(Self::RECORD, &self.to_json()?)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Trim whitespace, cap the length, fall back to a placeholder
fn sanitize_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if trimmed.is_empty() {
        "PLAYER".to_string()
    } else {
        trimmed
    }
}

/// Record name for the single best score
pub const HIGH_SCORE_RECORD: &str = "highscore";

/// Load the all-time best score. Missing or malformed gives 0.
pub fn load_high_score(storage: &dyn Storage) -> u64 {
    match storage.read(HIGH_SCORE_RECORD) {
        Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Malformed high score record, using 0");
            0
        }),
        Ok(None) => 0,
        Err(e) => {
            log::warn!("Could not read high score: {e}");
            0
        }
    }
}

pub fn save_high_score(storage: &mut dyn Storage, score: u64) -> Result<(), PersistError> {
    storage.write(HIGH_SCORE_RECORD, &score.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use proptest::prelude::*;

    #[test]
    fn test_zero_never_qualifies() {
        let board = HighScores::new();
        assert!(!board.qualifies(0));
        assert!(board.qualifies(1));
    }

    #[test]
    fn test_full_board_requires_beating_last() {
        let mut board = HighScores::new();
        for i in 1..=10 {
            board.add_score("AAA", i * 10, "2026-01-01");
        }
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        assert!(!board.qualifies(10));
        assert!(board.qualifies(11));
        assert_eq!(board.potential_rank(1000), Some(1));

        assert_eq!(board.add_score("BBB", 55, "2026-01-02"), Some(6));
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(board.entries.last().map(|e| e.score), Some(20));
    }

    #[test]
    fn test_ties_rank_below_older_entries() {
        let mut board = HighScores::new();
        board.add_score("OLD", 50, "2026-01-01");
        board.add_score("TOP", 90, "2026-01-01");
        assert_eq!(board.potential_rank(50), Some(3));
        assert_eq!(board.add_score("NEW", 50, "2026-01-02"), Some(3));

        let names: Vec<&str> = board.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["TOP", "OLD", "NEW"]);

        // Reloading keeps the tie order
        let reloaded = HighScores::from_json(&board.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, board);
    }

    #[test]
    fn test_name_is_sanitized() {
        let mut board = HighScores::new();
        board.add_score("   ", 5, "2026-01-01");
        board.add_score("  a very long pilot name  ", 4, "2026-01-01");
        assert_eq!(board.entries[0].name, "PLAYER");
        assert_eq!(board.entries[1].name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_malformed_record_loads_empty() {
        let mut storage = MemoryStorage::new();
        storage.write(HighScores::RECORD, "{not json").unwrap();
        assert!(HighScores::load(&storage).entries.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let mut storage = MemoryStorage::new();
        let mut board = HighScores::new();
        board.add_score("ACE", 300, "2026-03-04");
        board.save(&mut storage).unwrap();
        assert_eq!(HighScores::load(&storage), board);
    }

    #[test]
    fn test_high_score_record() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_high_score(&storage), 0);
        save_high_score(&mut storage, 1234).unwrap();
        assert_eq!(load_high_score(&storage), 1234);
        storage.write(HIGH_SCORE_RECORD, "garbage").unwrap();
        assert_eq!(load_high_score(&storage), 0);
    }

    proptest! {
        #[test]
        fn board_stays_sorted_and_bounded(scores in proptest::collection::vec(0u64..10_000, 0..60)) {
            let mut board = HighScores::new();
            for s in scores {
                board.add_score("P", s, "2026-01-01");
                prop_assert!(board.entries.len() <= MAX_HIGH_SCORES);
                prop_assert!(board.entries.windows(2).all(|w| w[0].score >= w[1].score));
                prop_assert!(board.entries.iter().all(|e| e.score > 0));
            }
        }
    }
}
