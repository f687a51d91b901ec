//! JSON files guarded by advisory OS file locks.
//!
//! Readers hold a shared lock, writers an exclusive one for the whole
//! read-modify-write. The lock is released when the guard drops, which
//! covers every early return and error path.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// An open file holding an advisory lock until dropped.
pub struct LockedFile {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl LockedFile {
    /// Open an existing file for reading under a shared lock.
    pub fn open_shared(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        file.lock_shared().map_err(|e| io_err(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode: LockMode::Shared,
        })
    }

    /// Open (creating if needed) for read-modify-write under an exclusive lock.
    pub fn open_exclusive(path: &Path) -> CoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        file.lock().map_err(|e| io_err(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode: LockMode::Exclusive,
        })
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Parse the whole file. An empty file reads as `None`.
    pub fn read_json<T: DeserializeOwned>(&mut self) -> CoreResult<Option<T>> {
        let mut content = String::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_string(&mut content))
            .map_err(|e| io_err(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CoreError::Json {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the file content. Only valid under an exclusive lock.
    pub fn write_json<T: Serialize>(&mut self, value: &T) -> CoreResult<()> {
        if self.mode != LockMode::Exclusive {
            return Err(CoreError::InvalidArg {
                what: "write_json requires an exclusive lock",
            });
        }
        let json = serde_json::to_string_pretty(value).map_err(|source| CoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let path = self.path.clone();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.write_all(json.as_bytes()))
            .and_then(|_| self.file.set_len(json.len() as u64))
            .and_then(|_| self.file.sync_data())
            .map_err(|e| io_err(&path, e))
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock too; unlocking first keeps
        // the critical section from outliving the guard on every platform.
        let _ = self.file.unlock();
    }
}

fn io_err(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a JSON document under a shared lock.
pub fn read_json_shared<T: DeserializeOwned>(path: &Path) -> CoreResult<Option<T>> {
    LockedFile::open_shared(path)?.read_json()
}

/// Atomic read-modify-write of a JSON document under an exclusive lock.
///
/// `f` receives the current document (`None` for a new or empty file) and
/// returns the document to persist. Nothing is written if `f` fails.
pub fn update_json<T, E, F>(path: &Path, f: F) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    E: From<CoreError>,
    F: FnOnce(Option<T>) -> Result<T, E>,
{
    let mut guard = LockedFile::open_exclusive(path)?;
    let current = guard.read_json::<T>()?;
    let next = f(current)?;
    guard.write_json(&next)?;
    Ok(next)
}
