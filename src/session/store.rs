//! Metadata record store of a compilation session.
//!
//! The store maps `(ClassHandle, InfoKind)` to the value fetched for that pair, plus a
//! separate cache of decoded read-only descriptors keyed by class. It is shared by every
//! worker thread compiling against the same session.
//!
//! # Thread Safety
//!
//! Both maps are `DashMap`s. A lookup or insert holds one shard lock only for the duration of
//! that single operation; fetches run with no lock held. When two workers miss the same key
//! at once both may fetch, but only the first insert is kept and both receive that value.
//! Stored values are never overwritten or evicted.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::{mapref::entry::Entry, DashMap};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    metadata::{ClassDescriptor, ClassHandle, ClassMetadataRecord, InfoKind, InfoValue},
    Result,
};

/// Session-scoped cache of fetched class metadata
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: DashMap<(ClassHandle, InfoKind), InfoValue>,
    descriptors: DashMap<ClassHandle, Arc<ClassDescriptor>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MetadataStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `(handle, kind)`, without fetching
    #[must_use]
    pub fn get(&self, handle: ClassHandle, kind: InfoKind) -> Option<InfoValue> {
        self.records
            .get(&(handle, kind))
            .map(|entry| entry.value().clone())
    }

    /// Returns `true` if a value for `(handle, kind)` is cached
    #[must_use]
    pub fn contains(&self, handle: ClassHandle, kind: InfoKind) -> bool {
        self.records.contains_key(&(handle, kind))
    }

    /// Cached value for `(handle, kind)`, invoking `fetch` on a miss and storing its result.
    ///
    /// The returned value is always the one held by the store, so concurrent callers agree
    /// even when both fetched.
    ///
    /// # Errors
    /// Propagates the error of `fetch`; nothing is stored in that case.
    pub fn get_or_fetch<F>(&self, handle: ClassHandle, kind: InfoKind, fetch: F) -> Result<InfoValue>
    where
        F: FnOnce() -> Result<InfoValue>,
    {
        if let Some(value) = self.get(handle, kind) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(class = %handle, kind = kind.as_ref(), "metadata cache miss");
        let fetched = fetch()?;
        Ok(self.insert(handle, kind, fetched))
    }

    /// Store a value unless one is already present; returns the value that is kept
    pub fn insert(&self, handle: ClassHandle, kind: InfoKind, value: InfoValue) -> InfoValue {
        match self.records.entry((handle, kind)) {
            Entry::Occupied(entry) => {
                debug!(class = %handle, kind = kind.as_ref(), "concurrent fetch lost, keeping first value");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                debug!(class = %handle, kind = kind.as_ref(), "metadata cached");
                entry.insert(value).value().clone()
            }
        }
    }

    /// Cached descriptor of a class, without fetching
    #[must_use]
    pub fn descriptor(&self, handle: ClassHandle) -> Option<Arc<ClassDescriptor>> {
        self.descriptors
            .get(&handle)
            .map(|entry| entry.value().clone())
    }

    /// Returns `true` if the descriptor of `handle` is cached
    #[must_use]
    pub fn has_descriptor(&self, handle: ClassHandle) -> bool {
        self.descriptors.contains_key(&handle)
    }

    /// Store a decoded descriptor unless one is already present; returns the one kept
    pub fn insert_descriptor(
        &self,
        handle: ClassHandle,
        descriptor: Arc<ClassDescriptor>,
    ) -> Arc<ClassDescriptor> {
        self.descriptors
            .entry(handle)
            .or_insert(descriptor)
            .value()
            .clone()
    }

    /// Cached descriptor of `handle`, invoking `fetch` on a miss.
    ///
    /// # Errors
    /// Propagates the error of `fetch`.
    pub fn descriptor_or_fetch<F>(&self, handle: ClassHandle, fetch: F) -> Result<Arc<ClassDescriptor>>
    where
        F: FnOnce() -> Result<ClassDescriptor>,
    {
        if let Some(descriptor) = self.descriptor(handle) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(descriptor);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(class = %handle, "descriptor cache miss");
        let fetched = fetch()?;
        Ok(self.insert_descriptor(handle, Arc::new(fetched)))
    }

    /// Snapshot of everything cached about one class
    #[must_use]
    pub fn record(&self, handle: ClassHandle) -> ClassMetadataRecord {
        let mut record = ClassMetadataRecord {
            has_descriptor: self.has_descriptor(handle),
            ..ClassMetadataRecord::default()
        };
        for kind in InfoKind::iter() {
            let Some(value) = self.get(handle, kind) else {
                continue;
            };
            match (kind, value) {
                (InfoKind::DepthAndFlags, InfoValue::Word(word)) => {
                    record.depth_and_flags = Some(word);
                }
                (InfoKind::Flags, InfoValue::Word(word)) => {
                    record.class_flags = u32::try_from(word).ok();
                }
                (InfoKind::TotalInstanceSize, InfoValue::Word(word)) => {
                    record.total_instance_size = Some(word);
                }
                (InfoKind::SuperClasses, InfoValue::Classes(classes)) => {
                    record.superclasses = Some(classes);
                }
                (InfoKind::InterfaceTable, InfoValue::Classes(classes)) => {
                    record.interfaces = Some(classes);
                }
                _ => {}
            }
        }
        record
    }

    /// Number of cached `(class, kind)` values
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been cached yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.descriptors.is_empty()
    }

    /// Number of lookups answered from the store
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that had to fetch
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    #[test]
    fn test_fetch_runs_once() {
        let store = MetadataStore::new();
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok(InfoValue::Word(0x40))
        };

        let first = store
            .get_or_fetch(ClassHandle(1), InfoKind::Flags, fetch)
            .unwrap();
        let second = store
            .get_or_fetch(ClassHandle(1), InfoKind::Flags, || {
                calls.set(calls.get() + 1);
                Ok(InfoValue::Word(0))
            })
            .unwrap();

        assert_eq!(first, InfoValue::Word(0x40));
        assert_eq!(second, InfoValue::Word(0x40));
        assert_eq!(calls.get(), 1);
        assert_eq!(store.hits(), 1);
        assert_eq!(store.misses(), 1);
    }

    #[test]
    fn test_kinds_are_cached_separately() {
        let store = MetadataStore::new();
        store.insert(ClassHandle(1), InfoKind::Flags, InfoValue::Word(1));
        assert!(store.get(ClassHandle(1), InfoKind::DepthAndFlags).is_none());
        assert!(store.get(ClassHandle(2), InfoKind::Flags).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_first_insert_wins() {
        let store = MetadataStore::new();
        let kept = store.insert(ClassHandle(7), InfoKind::TotalInstanceSize, InfoValue::Word(24));
        assert_eq!(kept, InfoValue::Word(24));
        let kept = store.insert(ClassHandle(7), InfoKind::TotalInstanceSize, InfoValue::Word(99));
        assert_eq!(kept, InfoValue::Word(24));
        assert_eq!(
            store.get(ClassHandle(7), InfoKind::TotalInstanceSize),
            Some(InfoValue::Word(24))
        );
    }

    #[test]
    fn test_failed_fetch_stores_nothing() {
        let store = MetadataStore::new();
        let result = store.get_or_fetch(ClassHandle(3), InfoKind::Flags, || {
            Err(Error::Transport("peer went away".to_string()))
        });
        assert!(matches!(result, Err(Error::Transport(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_snapshot() {
        let store = MetadataStore::new();
        let handle = ClassHandle(0x10);
        store.insert(handle, InfoKind::DepthAndFlags, InfoValue::Word(2));
        store.insert(handle, InfoKind::Flags, InfoValue::Word(0x20));
        store.insert(
            handle,
            InfoKind::SuperClasses,
            InfoValue::Classes(Arc::from(vec![ClassHandle(0x20), ClassHandle(0x30)])),
        );

        let record = store.record(handle);
        assert_eq!(record.depth_and_flags, Some(2));
        assert_eq!(record.class_flags, Some(0x20));
        assert_eq!(record.total_instance_size, None);
        assert_eq!(record.superclasses.as_deref().map(<[_]>::len), Some(2));
        assert!(!record.has_descriptor);
        assert_eq!(store.record(ClassHandle(0x99)), ClassMetadataRecord::default());
    }
}
