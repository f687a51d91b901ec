//! Tag store interface.
//!
//! Processes never share memory; every tag read or write goes through a
//! [`TagStore`]. The transport behind it is opaque to the rest of the plant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{CoreError, CoreResult};
use crate::locked_file::{read_json_shared, update_json};
use crate::state::ProcessState;
use crate::tags::Tag;

/// Get/set access to shared plant tags.
pub trait TagStore: Send + Sync {
    fn get(&self, tag: Tag) -> CoreResult<f64>;

    fn set(&self, tag: Tag, value: f64) -> CoreResult<()>;

    /// Write several tags in one go. Stores that can batch should override.
    fn set_many(&self, values: &[(Tag, f64)]) -> CoreResult<()> {
        for &(tag, value) in values {
            self.set(tag, value)?;
        }
        Ok(())
    }

    /// Seed the store with initial values, replacing whatever was there.
    fn initialize(&self, values: &[(Tag, f64)]) -> CoreResult<()> {
        self.set_many(values)
    }
}

impl<S: TagStore + ?Sized> TagStore for Arc<S> {
    fn get(&self, tag: Tag) -> CoreResult<f64> {
        (**self).get(tag)
    }

    fn set(&self, tag: Tag, value: f64) -> CoreResult<()> {
        (**self).set(tag, value)
    }

    fn set_many(&self, values: &[(Tag, f64)]) -> CoreResult<()> {
        (**self).set_many(values)
    }

    fn initialize(&self, values: &[(Tag, f64)]) -> CoreResult<()> {
        (**self).initialize(values)
    }
}

/// Read a full snapshot of the plant.
pub fn read_state(store: &dyn TagStore) -> CoreResult<ProcessState> {
    ProcessState::from_tags(|tag| store.get(tag))
}

/// Write only the tags that changed between `before` and `after`.
pub fn write_changes(
    store: &dyn TagStore,
    before: &ProcessState,
    after: &ProcessState,
) -> CoreResult<Vec<(Tag, f64)>> {
    let changes = after.changes_from(before);
    if !changes.is_empty() {
        store.set_many(&changes)?;
    }
    Ok(changes)
}

/// In-process store. Clones share the same tags.
#[derive(Clone, Debug, Default)]
pub struct MemoryTagStore {
    values: Arc<Mutex<BTreeMap<Tag, f64>>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already seeded from `state`.
    pub fn with_state(state: &ProcessState) -> Self {
        let values: BTreeMap<Tag, f64> = state.to_tag_values().into_iter().collect();
        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }

    pub fn snapshot(&self) -> CoreResult<BTreeMap<Tag, f64>> {
        self.values
            .lock()
            .map(|values| values.clone())
            .map_err(|_| CoreError::Poisoned { what: "tag store" })
    }
}

impl TagStore for MemoryTagStore {
    fn get(&self, tag: Tag) -> CoreResult<f64> {
        let values = self
            .values
            .lock()
            .map_err(|_| CoreError::Poisoned { what: "tag store" })?;
        values.get(&tag).copied().ok_or(CoreError::MissingTag { tag })
    }

    fn set(&self, tag: Tag, value: f64) -> CoreResult<()> {
        self.set_many(&[(tag, value)])
    }

    fn set_many(&self, batch: &[(Tag, f64)]) -> CoreResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CoreError::Poisoned { what: "tag store" })?;
        values.extend(batch.iter().copied());
        Ok(())
    }

    fn initialize(&self, batch: &[(Tag, f64)]) -> CoreResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CoreError::Poisoned { what: "tag store" })?;
        values.clear();
        values.extend(batch.iter().copied());
        Ok(())
    }
}

/// Tags kept as one JSON object on disk, for processes sharing a host.
#[derive(Clone, Debug)]
pub struct FileTagStore {
    path: PathBuf,
}

type TagDocument = BTreeMap<String, f64>;

impl FileTagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<TagDocument> {
        Ok(read_json_shared::<TagDocument>(&self.path)?.unwrap_or_default())
    }
}

impl TagStore for FileTagStore {
    fn get(&self, tag: Tag) -> CoreResult<f64> {
        self.load()?
            .get(tag.key())
            .copied()
            .ok_or(CoreError::MissingTag { tag })
    }

    fn set(&self, tag: Tag, value: f64) -> CoreResult<()> {
        self.set_many(&[(tag, value)])
    }

    fn set_many(&self, values: &[(Tag, f64)]) -> CoreResult<()> {
        update_json::<TagDocument, CoreError, _>(&self.path, |current| {
            let mut doc = current.unwrap_or_default();
            for &(tag, value) in values {
                doc.insert(tag.key().to_string(), value);
            }
            Ok(doc)
        })?;
        Ok(())
    }

    fn initialize(&self, values: &[(Tag, f64)]) -> CoreResult<()> {
        update_json::<TagDocument, CoreError, _>(&self.path, |_| {
            Ok(values
                .iter()
                .map(|&(tag, value)| (tag.key().to_string(), value))
                .collect())
        })?;
        Ok(())
    }
}
