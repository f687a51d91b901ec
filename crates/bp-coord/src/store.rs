//! Where the turn record lives.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bp_core::CoreError;
use bp_core::locked_file::{LockedFile, read_json_shared};

use crate::record::CoordinationRecord;
use crate::{CoordError, CoordResult};

/// Mutual-exclusion service over one [`CoordinationRecord`].
///
/// `update` must run the closure and persist its result as one critical
/// section; nothing is written if the closure fails.
pub trait TurnStore: Send + Sync {
    fn read(&self) -> CoordResult<CoordinationRecord>;

    fn update(
        &self,
        f: &mut dyn FnMut(&mut CoordinationRecord) -> CoordResult<()>,
    ) -> CoordResult<CoordinationRecord>;

    /// Overwrite the record.
    fn reset(&self, record: CoordinationRecord) -> CoordResult<()> {
        self.update(&mut |current| {
            *current = record;
            Ok(())
        })
        .map(|_| ())
    }
}

impl<S: TurnStore + ?Sized> TurnStore for Arc<S> {
    fn read(&self) -> CoordResult<CoordinationRecord> {
        (**self).read()
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&mut CoordinationRecord) -> CoordResult<()>,
    ) -> CoordResult<CoordinationRecord> {
        (**self).update(f)
    }
}

/// JSON record file guarded by an OS advisory lock.
///
/// A missing or empty file reads as the initial record. A corrupt file is
/// an error for readers; a writer logs it and starts from the initial record.
#[derive(Debug, Clone)]
pub struct FileTurnStore {
    path: PathBuf,
    initial: CoordinationRecord,
}

impl FileTurnStore {
    pub fn new(path: impl Into<PathBuf>, initial: CoordinationRecord) -> Self {
        Self {
            path: path.into(),
            initial,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TurnStore for FileTurnStore {
    fn read(&self) -> CoordResult<CoordinationRecord> {
        match read_json_shared::<CoordinationRecord>(&self.path) {
            Ok(record) => Ok(record.unwrap_or(self.initial)),
            Err(CoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(self.initial)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&mut CoordinationRecord) -> CoordResult<()>,
    ) -> CoordResult<CoordinationRecord> {
        let mut guard = LockedFile::open_exclusive(&self.path)?;
        let mut record = match guard.read_json::<CoordinationRecord>() {
            Ok(record) => record.unwrap_or(self.initial),
            Err(e @ CoreError::Json { .. }) => {
                tracing::error!(error = %e, "coordination record unreadable, starting over");
                self.initial
            }
            Err(e) => return Err(e.into()),
        };
        f(&mut record)?;
        guard.write_json(&record)?;
        Ok(record)
    }
}

/// In-process record shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryTurnStore {
    inner: Arc<Mutex<CoordinationRecord>>,
}

impl MemoryTurnStore {
    pub fn new(initial: CoordinationRecord) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }
}

impl TurnStore for MemoryTurnStore {
    fn read(&self) -> CoordResult<CoordinationRecord> {
        self.inner
            .lock()
            .map(|record| *record)
            .map_err(|_| CoordError::Poisoned {
                what: "memory turn store",
            })
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&mut CoordinationRecord) -> CoordResult<()>,
    ) -> CoordResult<CoordinationRecord> {
        let mut record = self.inner.lock().map_err(|_| CoordError::Poisoned {
            what: "memory turn store",
        })?;
        let mut next = *record;
        f(&mut next)?;
        *record = next;
        Ok(next)
    }
}
