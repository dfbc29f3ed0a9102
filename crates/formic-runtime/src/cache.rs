#![forbid(unsafe_code)]

//! Bounded reuse cache for closed forms.
//!
//! Closed forms are inserted at the front (most recently cached first);
//! eviction trims from the tail. The cache stores shared handles only; the
//! manager decides when a trimmed entry is actually released.
//!
//! The cache must never legitimately contain opened or released forms, but
//! scans still purge such entries defensively as routine hygiene rather
//! than surfacing them as errors.

use std::collections::VecDeque;
use std::rc::Rc;

use formic_core::{FormRef, SerialId};

/// Ordered, most-recently-cached-first list of closed forms.
#[derive(Default)]
pub struct ReuseCache {
    /// Front = most recently cached.
    entries: VecDeque<FormRef>,
}

impl ReuseCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Insert a form at the front. If the same instance is already cached
    /// it is moved to the front rather than duplicated.
    pub fn insert_front(&mut self, form: FormRef) {
        if let Some(pos) = self.entries.iter().position(|e| Rc::ptr_eq(e, &form)) {
            self.entries.remove(pos);
        }
        self.entries.push_front(form);
    }

    /// Take the first entry matching the asset name, scanning front to
    /// back. Stale entries (opened or released) encountered during the
    /// scan are purged without being returned.
    pub fn take_by_asset(&mut self, asset_name: &str) -> Option<FormRef> {
        let mut index = 0;
        while index < self.entries.len() {
            let (stale, matches) = {
                let form = self.entries[index].borrow();
                (
                    form.is_opened() || form.is_released(),
                    form.asset_name() == asset_name,
                )
            };
            if stale {
                self.entries.remove(index);
                continue;
            }
            if matches {
                return self.entries.remove(index);
            }
            index += 1;
        }
        None
    }

    /// Pop entries off the tail until the cache is within `capacity`.
    /// Returns the evicted entries, oldest first.
    pub fn trim_to(&mut self, capacity: usize) -> Vec<FormRef> {
        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            if let Some(form) = self.entries.pop_back() {
                evicted.push(form);
            }
        }
        evicted
    }

    /// Remove and return every entry, most recently cached first.
    pub fn drain_all(&mut self) -> Vec<FormRef> {
        self.entries.drain(..).collect()
    }

    /// Whether an entry with this (stale) serial id is cached.
    pub fn contains_serial(&self, serial_id: SerialId) -> bool {
        self.entries
            .iter()
            .any(|e| e.borrow().serial_id() == serial_id)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries, most recently cached first.
    pub fn iter(&self) -> impl Iterator<Item = &FormRef> {
        self.entries.iter()
    }
}

impl std::fmt::Debug for ReuseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReuseCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formic_core::{Form, NoopLogic, OpenPolicy};

    fn cached_form(serial: SerialId, asset: &str) -> FormRef {
        Form::new(
            serial,
            asset,
            "HUD",
            OpenPolicy::SingleInstanceGlobal,
            false,
            None,
            Box::new(()),
            Box::new(NoopLogic),
        )
        .into_ref()
    }

    #[test]
    fn empty_cache() {
        let cache = ReuseCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn take_matches_by_asset_name() {
        let mut cache = ReuseCache::new();
        cache.insert_front(cached_form(1, "Inventory"));
        cache.insert_front(cached_form(2, "Settings"));

        let taken = cache.take_by_asset("Inventory").unwrap();
        assert_eq!(taken.borrow().serial_id(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.take_by_asset("Inventory").is_none());
    }

    #[test]
    fn take_prefers_most_recently_cached() {
        let mut cache = ReuseCache::new();
        cache.insert_front(cached_form(1, "Inventory"));
        cache.insert_front(cached_form(2, "Inventory"));

        let taken = cache.take_by_asset("Inventory").unwrap();
        assert_eq!(taken.borrow().serial_id(), 2);
    }

    #[test]
    fn reinsert_moves_to_front_without_duplicating() {
        let mut cache = ReuseCache::new();
        let a = cached_form(1, "Inventory");
        let b = cached_form(2, "Settings");
        cache.insert_front(a.clone());
        cache.insert_front(b);
        cache.insert_front(a.clone());

        assert_eq!(cache.len(), 2);
        let front = cache.iter().next().unwrap();
        assert!(Rc::ptr_eq(front, &a));
    }

    #[test]
    fn trim_evicts_from_tail() {
        let mut cache = ReuseCache::new();
        cache.insert_front(cached_form(1, "A"));
        cache.insert_front(cached_form(2, "B"));
        cache.insert_front(cached_form(3, "C"));

        let evicted = cache.trim_to(1);
        assert_eq!(evicted.len(), 2);
        // Oldest entries go first.
        assert_eq!(evicted[0].borrow().serial_id(), 1);
        assert_eq!(evicted[1].borrow().serial_id(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_serial(3));
    }

    #[test]
    fn trim_to_zero_empties_the_cache() {
        let mut cache = ReuseCache::new();
        cache.insert_front(cached_form(1, "A"));
        let evicted = cache.trim_to(0);
        assert_eq!(evicted.len(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn scan_purges_stale_entries() {
        let mut cache = ReuseCache::new();
        let released = cached_form(1, "Inventory");
        released.borrow_mut().release();
        let opened = cached_form(2, "Inventory");
        opened.borrow_mut().open();
        cache.insert_front(cached_form(3, "Inventory"));
        cache.insert_front(opened);
        cache.insert_front(released);

        let taken = cache.take_by_asset("Inventory").unwrap();
        assert_eq!(taken.borrow().serial_id(), 3);
        // Both stale entries were purged along the way.
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_purge_happens_even_without_a_match() {
        let mut cache = ReuseCache::new();
        let released = cached_form(1, "Settings");
        released.borrow_mut().release();
        cache.insert_front(released);

        assert!(cache.take_by_asset("Inventory").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn drain_returns_everything_in_order() {
        let mut cache = ReuseCache::new();
        cache.insert_front(cached_form(1, "A"));
        cache.insert_front(cached_form(2, "B"));
        let drained = cache.drain_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].borrow().serial_id(), 2);
        assert!(cache.is_empty());
    }
}
