use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use crate::normalize;

/// One mutex per document path, so saves of one document never overlap.
#[derive(Default, Debug)]
pub struct DocumentLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    /// The lock for `document`. Spellings of the same path share one lock.
    pub fn get(&self, document: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        // Locks are only handed out while the map is held, so a count of one means unused.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);

        Arc::clone(locks.entry(normalize(document)).or_default())
    }
}
