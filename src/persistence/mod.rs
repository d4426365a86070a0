//! Save/load persistence with integrity verification
//!
//! Features:
//! - Named JSON records behind a [`Storage`] gateway (file or memory)
//! - BLAKE3 integrity digest on the progress record
//! - Backup rotation (old primary → backup on every progress save)
//! - Corruption detection and recovery (primary → backup → defaults)

mod error;
pub mod progress;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use error::PersistError;
pub use progress::{Progress, ProgressRecord, PurchaseError, UpgradeKind};

use crate::highscores::{self, HighScores};
use crate::settings::Settings;

/// Primary progress record name
pub const PROGRESS_RECORD: &str = "progress";
/// Previous good progress record
pub const PROGRESS_BACKUP_RECORD: &str = "progress.backup";

/// Named-record storage backend
pub trait Storage {
    /// Read a record. `Ok(None)` when it does not exist.
    fn read(&self, record: &str) -> Result<Option<String>, PersistError>;

    /// Create or replace a record
    fn write(&mut self, record: &str, data: &str) -> Result<(), PersistError>;
}

/// One JSON file per record inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| PersistError::Io {
            record: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, record: &str) -> PathBuf {
        self.dir.join(format!("{record}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, record: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(record)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::Io {
                record: record.to_string(),
                source,
            }),
        }
    }

    fn write(&mut self, record: &str, data: &str) -> Result<(), PersistError> {
        // tmp then rename, so a crash never leaves a half-written record
        let path = self.path_for(record);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| PersistError::Io {
            record: record.to_string(),
            source,
        };
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        log::debug!("Wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}

/// In-memory records for tests and `--memory` runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, record: &str) -> Result<Option<String>, PersistError> {
        Ok(self.records.get(record).cloned())
    }

    fn write(&mut self, record: &str, data: &str) -> Result<(), PersistError> {
        self.records.insert(record.to_string(), data.to_string());
        Ok(())
    }
}

/// Load progress: primary, then backup, then defaults. Never fails.
pub fn load_progress(storage: &dyn Storage) -> Progress {
    for record in [PROGRESS_RECORD, PROGRESS_BACKUP_RECORD] {
        match storage.read(record) {
            Ok(Some(json)) => match Progress::from_json(&json) {
                Ok(progress) => {
                    log::info!("Loaded progress from '{record}' ({} coins)", progress.coins);
                    return progress;
                }
                Err(e) => log::warn!("Rejected '{record}': {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read '{record}': {e}"),
        }
    }
    log::info!("No valid progress found, starting fresh");
    Progress::new()
}

/// Save progress, rotating the previous primary record into the backup slot.
///
/// Only a primary that still verifies is rotated. An unreadable or corrupt
/// primary leaves the backup alone and is simply overwritten.
pub fn save_progress(storage: &mut dyn Storage, progress: &Progress) -> Result<(), PersistError> {
    let json = progress.to_json()?;
    match storage.read(PROGRESS_RECORD) {
        Ok(Some(previous)) => match Progress::from_json(&previous) {
            Ok(_) => {
                if let Err(e) = storage.write(PROGRESS_BACKUP_RECORD, &previous) {
                    log::warn!("Could not rotate progress backup: {e}");
                }
            }
            Err(e) => log::warn!("Not rotating rejected '{PROGRESS_RECORD}': {e}"),
        },
        Ok(None) => {}
        Err(e) => log::warn!("Could not read '{PROGRESS_RECORD}' for rotation: {e}"),
    }
    storage.write(PROGRESS_RECORD, &json)?;
    log::info!("Progress saved ({} coins)", progress.coins);
    Ok(())
}

/// Everything persisted across runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub progress: Progress,
    pub high_score: u64,
    pub leaderboard: HighScores,
    pub settings: Settings,
}

impl Profile {
    /// Load every record, falling back to defaults per record
    pub fn load(storage: &dyn Storage) -> Self {
        Self {
            progress: load_progress(storage),
            high_score: highscores::load_high_score(storage),
            leaderboard: HighScores::load(storage),
            settings: Settings::load(storage),
        }
    }

    /// Write every record, even after one fails. Returns the first failure.
    pub fn save_all(&self, storage: &mut dyn Storage) -> Result<(), PersistError> {
        let results = [
            save_progress(storage, &self.progress),
            highscores::save_high_score(storage, self.high_score),
            self.leaderboard.save(storage),
            self.settings.save(storage),
        ];
        let mut first = None;
        for result in results {
            if let Err(e) = result {
                log::warn!("Save failed: {e}");
                if first.is_none() {
                    first = Some(e);
                }
            }
        }
        first.map_or(Ok(()), Err)
    }
}
