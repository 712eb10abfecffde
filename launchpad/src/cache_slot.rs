//! Cache handle slot
//!
//! Process-wide record of the persistent cache the cache driver has opened.
//! Cleared at the start of every load attempt, written only by the cache
//! driver.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

/// Persistent cache opened by the cache-reconciling driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHandle {
    pub root: PathBuf,
    pub index_path: PathBuf,
    pub opened_at: DateTime<Utc>,
}

/// Shared, resettable slot holding the current [`CacheHandle`]
#[derive(Debug, Clone, Default)]
pub struct CacheSlot {
    inner: Arc<RwLock<Option<CacheHandle>>>,
}

/// Global slot shared by loaders that are not given their own
static GLOBAL_SLOT: Lazy<CacheSlot> = Lazy::new(CacheSlot::new);

impl CacheSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide slot
    pub fn global() -> Self {
        GLOBAL_SLOT.clone()
    }

    /// Back to "not yet computed"
    pub fn reset(&self) {
        *self.write() = None;
    }

    pub fn set(&self, handle: CacheHandle) {
        *self.write() = Some(handle);
    }

    pub fn get(&self) -> Option<CacheHandle> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<CacheHandle>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
