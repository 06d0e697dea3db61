// pathgate-store-file/src/store.rs
// ============================================================================
// Module: PathGate File Policy Store
// Description: Primary/backup file persistence for the committed policy.
// Purpose: Implement PolicyPersistence over two durable JSON copies.
// Dependencies: pathgate-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! [`FilePolicyStore`] keeps the committed policy in two independent files
//! under one directory: the primary `pathz_policy.txt` and the backup
//! `pathz_policy.bak`. Writes land in a temporary file in the same directory
//! and are renamed into place, primary first, so a crash mid-rotation leaves
//! at least one decodable copy. Recovery prefers the primary, falls back to
//! the backup, and never fails on corrupt content: when copies exist but none
//! decodes, it substitutes the named deny-all snapshot stamped with the
//! corrupt file's modification time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use pathgate_core::PersistenceError;
use pathgate_core::PolicyPersistence;
use pathgate_core::PolicySnapshot;
use pathgate_core::RecoveredPolicy;
use tempfile::NamedTempFile;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the primary durable policy copy.
pub const PRIMARY_FILE_NAME: &str = "pathz_policy.txt";

/// File name of the backup durable policy copy.
pub const BACKUP_FILE_NAME: &str = "pathz_policy.bak";

// ============================================================================
// SECTION: File Policy Store
// ============================================================================

/// Durable policy storage over a primary and a backup file.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    /// Directory holding both policy copies and write-side temp files.
    dir: PathBuf,
}

impl FilePolicyStore {
    /// Creates a store over the given policy directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the path of the primary copy.
    #[must_use]
    pub fn primary_path(&self) -> PathBuf {
        self.dir.join(PRIMARY_FILE_NAME)
    }

    /// Returns the path of the backup copy.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE_NAME)
    }

    /// Writes `bytes` to `target` through a same-directory temp file rename.
    fn write_copy(&self, target: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|err| PersistenceError::Io(err.to_string()))?;
        temp.write_all(bytes).map_err(|err| PersistenceError::Io(err.to_string()))?;
        temp.as_file().sync_all().map_err(|err| PersistenceError::Io(err.to_string()))?;
        temp.persist(target).map_err(|err| PersistenceError::Io(err.to_string()))?;
        Ok(())
    }

    /// Reads one copy. `Ok(None)` means the file does not exist; a file that
    /// exists but cannot be read or decoded reports as corrupt.
    fn read_copy(path: &Path) -> Result<Option<CopyState>, PersistenceError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(_) => return Ok(Some(CopyState::Corrupt(mtime_micros(path)))),
        };
        match serde_json::from_slice::<PolicySnapshot>(&bytes) {
            Ok(snapshot) => Ok(Some(CopyState::Decoded(snapshot))),
            Err(_) => Ok(Some(CopyState::Corrupt(mtime_micros(path)))),
        }
    }
}

/// State of one durable copy on disk.
enum CopyState {
    /// The copy decoded cleanly.
    Decoded(PolicySnapshot),
    /// The copy exists but does not decode; carries its mtime in micros.
    Corrupt(u64),
}

/// Returns a file's modification time as Unix microseconds, zero on error.
fn mtime_micros(path: &Path) -> u64 {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
}

impl PolicyPersistence for FilePolicyStore {
    fn persist(&self, snapshot: &PolicySnapshot) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| PersistenceError::Encode(err.to_string()))?;
        self.write_copy(&self.primary_path(), &bytes)?;
        self.write_copy(&self.backup_path(), &bytes)?;
        Ok(())
    }

    fn recover(&self) -> Result<RecoveredPolicy, PersistenceError> {
        let primary = Self::read_copy(&self.primary_path())?;
        if let Some(CopyState::Decoded(snapshot)) = primary {
            return Ok(RecoveredPolicy::Recovered(snapshot));
        }
        let backup = Self::read_copy(&self.backup_path())?;
        if let Some(CopyState::Decoded(snapshot)) = backup {
            return Ok(RecoveredPolicy::Recovered(snapshot));
        }
        // No copy decoded. Any copy present at all means corruption, stamped
        // with the corrupt file's mtime; otherwise there is no policy.
        let corrupt_mtime = match (primary, backup) {
            (Some(CopyState::Corrupt(mtime)), _) | (None, Some(CopyState::Corrupt(mtime))) => {
                Some(mtime)
            }
            _ => None,
        };
        match corrupt_mtime {
            Some(mtime) => {
                Ok(RecoveredPolicy::CorruptFallback(PolicySnapshot::corrupt_fallback(mtime)))
            }
            None => Ok(RecoveredPolicy::Absent),
        }
    }
}
