//! In-memory view/get counter store.
//!
//! Counters are independent atomic cells: per-package cells live in maps
//! whose *structure* is frozen once startup seeding is done, so concurrent
//! readers may iterate the maps while leaf values mutate. There is no global
//! lock; a total and its per-package cell are bumped as two separate atomic
//! adds, so a reader can briefly observe one without the other. The sums
//! reconcile at rest.
//!
//! Dirty tracking uses a logical version counter instead of a wall-clock
//! timestamp: every increment advances `last_updated`, and a successful flush
//! stores the version it snapshotted into `last_synced`. "Dirty" is then the
//! plain inequality `last_synced != last_updated`, with no granularity race.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Live counter store. Built mutably (load + seed) at startup, then shared
/// behind `Arc` for the lifetime of the process.
pub struct StatsStore {
    total_view: AtomicI64,
    total_get: AtomicI64,
    pkg_view: HashMap<String, AtomicI64>,
    pkg_get: HashMap<String, AtomicI64>,

    last_updated: AtomicU64,
    last_synced: AtomicU64,
}

impl StatsStore {
    /// Empty store: zero totals, no packages.
    pub fn new() -> Self {
        Self {
            total_view: AtomicI64::new(0),
            total_get: AtomicI64::new(0),
            pkg_view: HashMap::new(),
            pkg_get: HashMap::new(),
            last_updated: AtomicU64::new(0),
            last_synced: AtomicU64::new(0),
        }
    }

    /// Rebuild a store from persisted counts. Paths present in only one of
    /// the two maps get a zero cell in the other, so every known path has an
    /// entry in both maps afterwards.
    pub(crate) fn from_counts(
        total_view: i64,
        total_get: i64,
        pkg_view: impl IntoIterator<Item = (String, i64)>,
        pkg_get: impl IntoIterator<Item = (String, i64)>,
    ) -> Self {
        let mut store = Self::new();
        store.total_view = AtomicI64::new(total_view);
        store.total_get = AtomicI64::new(total_get);
        for (path, n) in pkg_view {
            store.pkg_view.insert(path, AtomicI64::new(n));
        }
        for (path, n) in pkg_get {
            store.pkg_get.insert(path, AtomicI64::new(n));
        }
        let paths: Vec<String> = store
            .pkg_view
            .keys()
            .chain(store.pkg_get.keys())
            .cloned()
            .collect();
        for path in paths {
            store.seed(&path);
        }
        store
    }

    /// Ensure `import_path` has a zero cell in both maps. Startup only: the
    /// `&mut self` receiver is what guarantees the maps never grow while the
    /// store is shared.
    pub fn seed(&mut self, import_path: &str) {
        self.pkg_view
            .entry(import_path.to_owned())
            .or_insert_with(|| AtomicI64::new(0));
        self.pkg_get
            .entry(import_path.to_owned())
            .or_insert_with(|| AtomicI64::new(0));
    }

    fn cell<'a>(map: &'a HashMap<String, AtomicI64>, import_path: &str) -> &'a AtomicI64 {
        match map.get(import_path) {
            Some(cell) => cell,
            // Contract violation: silently dropping the increment would break
            // the total == sum(per-package) invariant.
            None => panic!("import path not seeded: {import_path}"),
        }
    }

    /// Record `n` page views for `import_path`.
    ///
    /// # Panics
    /// Panics if `import_path` was never seeded.
    pub fn incr_view(&self, import_path: &str, n: i64) {
        Self::cell(&self.pkg_view, import_path).fetch_add(n, Ordering::Relaxed);
        self.total_view.fetch_add(n, Ordering::Relaxed);
        self.last_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `n` go-get fetches for `import_path`.
    ///
    /// # Panics
    /// Panics if `import_path` was never seeded.
    pub fn incr_get(&self, import_path: &str, n: i64) {
        Self::cell(&self.pkg_get, import_path).fetch_add(n, Ordering::Relaxed);
        self.total_get.fetch_add(n, Ordering::Relaxed);
        self.last_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_view(&self) -> i64 {
        self.total_view.load(Ordering::Relaxed)
    }

    pub fn total_get(&self) -> i64 {
        self.total_get.load(Ordering::Relaxed)
    }

    /// Current view count for `import_path`. Panics if unseeded.
    pub fn pkg_view(&self, import_path: &str) -> i64 {
        Self::cell(&self.pkg_view, import_path).load(Ordering::Relaxed)
    }

    /// Current get count for `import_path`. Panics if unseeded.
    pub fn pkg_get(&self, import_path: &str) -> i64 {
        Self::cell(&self.pkg_get, import_path).load(Ordering::Relaxed)
    }

    /// All known import paths (seeded or loaded), in map order.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.pkg_view.keys().map(String::as_str)
    }

    /// Version of the most recent increment.
    pub fn last_updated(&self) -> u64 {
        self.last_updated.load(Ordering::Relaxed)
    }

    /// Version captured by the most recent successful flush.
    pub fn last_synced(&self) -> u64 {
        self.last_synced.load(Ordering::Relaxed)
    }

    /// Record that the backing store now reflects `version`. Called by the
    /// synchronizer after a successful write, with the `last_updated` value
    /// it read *before* snapshotting, so increments landing mid-flush stay
    /// dirty and are picked up next tick.
    pub fn mark_synced(&self, version: u64) {
        self.last_synced.store(version, Ordering::Relaxed);
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new()
    }
}
