use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::KeyValueStore;
use crate::error::{CampaignKitError, ErrorCode, Result};

const LOCK_FILE_NAME: &str = "campaignkit.lock";

// Store calls run on async workers, so lock contention is bounded to
// LOCK_ATTEMPTS * LOCK_RETRY_DELAY rather than blocking indefinitely.
const LOCK_ATTEMPTS: u32 = 20;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(5);

/// File-backed [`KeyValueStore`].
///
/// Each key maps to `<dir>/<key>.json`. Writes go to a temporary sibling
/// that is synced and renamed over the target while an exclusive lock on
/// `campaignkit.lock` is held, so another process sharing the directory
/// never reads a half-written blob. A crash before the rename leaves the
/// previous blob in place.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_file_path: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            CampaignKitError::storage_error(
                ErrorCode::StorageWriteError,
                format!("Failed to create storage directory: {}", dir.display()),
                e,
            )
        })?;

        let lock_file_path = dir.join(LOCK_FILE_NAME);
        Ok(Self {
            dir,
            lock_file_path,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    fn acquire_lock(&self) -> Result<File> {
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_file_path)
            .map_err(|e| {
                CampaignKitError::storage_error(
                    ErrorCode::StorageLockError,
                    "Failed to open lock file",
                    e,
                )
            })?;

        for attempt in 1..=LOCK_ATTEMPTS {
            match lock_file.try_lock_exclusive() {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if attempt < LOCK_ATTEMPTS {
                        std::thread::sleep(LOCK_RETRY_DELAY);
                    }
                }
                Err(e) => {
                    return Err(CampaignKitError::storage_error(
                        ErrorCode::StorageLockError,
                        "Failed to acquire file lock",
                        e,
                    ))
                }
            }
        }

        tracing::warn!("Gave up waiting for {}", self.lock_file_path.display());
        Err(CampaignKitError::new(
            ErrorCode::StorageLockError,
            "Storage is locked by another process",
        ))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        let lock_file = self.acquire_lock()?;

        let result = match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CampaignKitError::storage_error(
                ErrorCode::StorageReadError,
                format!("Failed to read {}", path.display()),
                e,
            )),
        };

        drop(lock_file);
        result
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        let lock_file = self.acquire_lock()?;

        let mut file = File::create(&tmp_path).map_err(|e| {
            CampaignKitError::storage_error(
                ErrorCode::StorageWriteError,
                format!("Failed to create {}", tmp_path.display()),
                e,
            )
        })?;
        file.write_all(value).map_err(|e| {
            CampaignKitError::storage_error(ErrorCode::StorageWriteError, "Failed to write blob", e)
        })?;
        file.sync_all().map_err(|e| {
            CampaignKitError::storage_error(ErrorCode::StorageWriteError, "Failed to sync blob", e)
        })?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|e| {
            CampaignKitError::storage_error(
                ErrorCode::StorageWriteError,
                format!("Failed to replace {}", path.display()),
                e,
            )
        })?;

        drop(lock_file);

        tracing::debug!("Wrote {} bytes to {}", value.len(), path.display());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        let lock_file = self.acquire_lock()?;

        let result = match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CampaignKitError::storage_error(
                ErrorCode::StorageWriteError,
                format!("Failed to remove {}", path.display()),
                e,
            )),
        };

        drop(lock_file);
        result
    }
}
