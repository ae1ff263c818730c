//! Profile file storage.
//!
//! # File Structure
//!
//! One file per profile, flat in the data directory:
//! ```text
//! <data_dir>/
//! ├── Ada_save.dat
//! ├── Bo_save.dat
//! └── ...
//! ```
//!
//! # Durability Sync
//!
//! Some platforms buffer writes so that a later read may not see them until an
//! explicit sync has been requested and a short settle time has passed. With
//! `requires_durability_sync` set, every write is:
//!
//! 1. written and synced
//! 2. left to settle for the configured interval
//! 3. read back and compared with what was written
//! 4. on mismatch, written and synced once more, then accepted as is
//!
//! There is never a second retry.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SaveConfig;
use crate::logging::{LogSink, Severity};

/// Suffix appended to a profile name to form its file name.
pub const SAVE_SUFFIX: &str = "_save.dat";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid profile name: {0:?}")]
    InvalidProfileName(String),
}

/// How a successful write was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteReport {
    /// Plain write, no verification required on this platform.
    Written,
    /// Synced and the readback matched.
    Verified,
    /// Readback did not match; written and synced a second time.
    Rewritten,
}

// ============================================================================
// Backends
// ============================================================================

/// Raw file operations the store is built on.
pub trait StorageBackend: Send + Sync {
    /// Names of the regular files directly inside `dir`.
    fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>>;

    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replace the full contents of `path`.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Ask the platform to make previous writes to `path` durable.
    fn sync(&self, path: &Path) -> io::Result<()>;
}

/// The local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsBackend;

impl StorageBackend for FsBackend {
    fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    /// Write-then-rename so a crash mid-write never leaves a truncated save.
    ///
    /// The temp file swaps the `.dat` extension for `.tmp`, so it never
    /// matches [`SAVE_SUFFIX`] during enumeration.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        Ok(())
    }

    fn sync(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new().write(true).open(path)?.sync_all()
    }
}

/// In-process storage, for hosts without a usable file system and for tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<PathBuf, String>>> {
        self.files
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory backend poisoned"))
    }
}

impl StorageBackend for MemoryBackend {
    fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        Ok(self
            .files()?
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files()?
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.files()?.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn sync(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Profile Store
// ============================================================================

/// Maps profile names to save files and performs verified reads and writes.
///
/// Cheap to clone; clones share the backend and log sink.
#[derive(Clone)]
pub struct ProfileStore {
    dir: PathBuf,
    backend: Arc<dyn StorageBackend>,
    sink: Arc<dyn LogSink>,
    requires_durability_sync: bool,
    settle_interval: Duration,
}

impl ProfileStore {
    /// A store with plain writes (no durability sync).
    pub fn new(
        dir: impl Into<PathBuf>,
        backend: Arc<dyn StorageBackend>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            dir: dir.into(),
            backend,
            sink,
            requires_durability_sync: false,
            settle_interval: Duration::ZERO,
        }
    }

    /// A file system store configured from `config`.
    pub fn from_config(config: &SaveConfig, sink: Arc<dyn LogSink>) -> Self {
        let store = Self::new(config.data_dir.clone(), Arc::new(FsBackend), sink);
        if config.requires_durability_sync {
            store.with_durability_sync(config.settle_interval())
        } else {
            store
        }
    }

    /// Enable sync + readback verification on every write.
    pub fn with_durability_sync(mut self, settle_interval: Duration) -> Self {
        self.requires_durability_sync = true;
        self.settle_interval = settle_interval;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn requires_durability_sync(&self) -> bool {
        self.requires_durability_sync
    }

    /// Location of the save file for `profile_name`.
    ///
    /// Rejects names that are empty, that are not a single plain path
    /// component, or that contain [`SAVE_SUFFIX`] (those could not be told
    /// apart from other profiles during enumeration).
    pub fn path_for(&self, profile_name: &str) -> Result<PathBuf, StoreError> {
        validate_profile_name(profile_name)?;
        Ok(self.dir.join(format!("{profile_name}{SAVE_SUFFIX}")))
    }

    pub fn exists(&self, location: &Path) -> bool {
        self.backend.exists(location)
    }

    /// Names of every profile with a save file in the data directory.
    ///
    /// An unreadable or missing directory is reported and yields an empty set.
    pub fn list_profile_names(&self) -> BTreeSet<String> {
        let file_names = match self.backend.list_file_names(&self.dir) {
            Ok(names) => names,
            Err(e) => {
                self.report(
                    &format!(
                        "Could not access persistent data path {}: {e}",
                        self.dir.display()
                    ),
                    Severity::Error,
                );
                return BTreeSet::new();
            }
        };

        let names: BTreeSet<String> = file_names
            .iter()
            .filter(|name| name.contains(SAVE_SUFFIX))
            .map(|name| name.replace(SAVE_SUFFIX, ""))
            .collect();

        if names.is_empty() {
            self.report("No profile save files found", Severity::Warning);
        }

        names
    }

    /// Read a save file. `Ok(None)` when it does not exist.
    pub fn try_read_text(&self, location: &Path) -> Result<Option<String>, StoreError> {
        if !self.backend.exists(location) {
            return Ok(None);
        }
        Ok(Some(self.backend.read(location)?))
    }

    /// Read a save file, treating any failure like absence.
    pub fn read_text(&self, location: &Path) -> Option<String> {
        match self.try_read_text(location) {
            Ok(text) => text,
            Err(e) => {
                self.report(
                    &format!("Could not read file {}: {e}", location.display()),
                    Severity::Error,
                );
                None
            }
        }
    }

    /// Read the save file for a profile by name.
    pub fn read_profile_text(&self, profile_name: &str) -> Option<String> {
        match self.path_for(profile_name) {
            Ok(location) => self.read_text(&location),
            Err(e) => {
                self.report(&e.to_string(), Severity::Error);
                None
            }
        }
    }

    /// Write a save file, applying the durability protocol when enabled.
    pub async fn try_write_text(
        &self,
        location: &Path,
        text: &str,
    ) -> Result<WriteReport, StoreError> {
        self.backend.write(location, text)?;

        if !self.requires_durability_sync {
            return Ok(WriteReport::Written);
        }

        self.backend.sync(location)?;
        tokio::time::sleep(self.settle_interval).await;

        if self.readback_matches(location, text) {
            return Ok(WriteReport::Verified);
        }

        log::warn!(
            "readback of {} did not match, writing once more",
            location.display()
        );
        self.backend.write(location, text)?;
        self.backend.sync(location)?;
        tokio::time::sleep(self.settle_interval).await;

        Ok(WriteReport::Rewritten)
    }

    /// Write a save file; failures are reported and yield `false`.
    pub async fn write_text(&self, location: &Path, text: &str) -> bool {
        match self.try_write_text(location, text).await {
            Ok(_) => true,
            Err(e) => {
                self.report(&format!("Could not save locally {e}"), Severity::Error);
                false
            }
        }
    }

    pub(crate) fn report(&self, message: &str, severity: Severity) {
        self.sink.send(message, severity);
    }

    fn readback_matches(&self, location: &Path, text: &str) -> bool {
        self.backend.exists(location)
            && matches!(self.backend.read(location), Ok(ref stored) if stored == text)
    }
}

fn validate_profile_name(name: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidProfileName(name.to_string());

    if name.is_empty() || name.contains(SAVE_SUFFIX) {
        return Err(invalid());
    }

    let mut components = Path::new(name).components();
    match components.next() {
        Some(Component::Normal(_)) if components.next().is_none() => Ok(()),
        _ => Err(invalid()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
