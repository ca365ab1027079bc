#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use vanityhub_core::stats::StatsStore;

fn seeded(paths: &[&str]) -> StatsStore {
    let mut store = StatsStore::new();
    for p in paths {
        store.seed(p);
    }
    store
}

#[test]
fn view_and_get_counters_track_separately() {
    let store = seeded(&["example.com/a", "example.com/b"]);

    store.incr_view("example.com/a", 1);
    store.incr_view("example.com/a", 1);
    store.incr_view("example.com/a", 1);
    store.incr_get("example.com/b", 1);

    assert_eq!(store.total_view(), 3);
    assert_eq!(store.total_get(), 1);
    assert_eq!(store.pkg_view("example.com/a"), 3);
    assert_eq!(store.pkg_view("example.com/b"), 0);
    assert_eq!(store.pkg_get("example.com/b"), 1);
    assert_eq!(store.pkg_get("example.com/a"), 0);
}

#[test]
fn totals_equal_per_package_sums_at_rest() {
    let store = seeded(&["a", "b", "c"]);

    store.incr_view("a", 2);
    store.incr_view("b", 5);
    store.incr_get("c", 7);
    store.incr_get("a", 1);

    let view_sum: i64 = store.import_paths().map(|p| store.pkg_view(p)).sum();
    let get_sum: i64 = store.import_paths().map(|p| store.pkg_get(p)).sum();
    assert_eq!(store.total_view(), view_sum);
    assert_eq!(store.total_get(), get_sum);
}

#[test]
fn concurrent_increments_lose_nothing() {
    let store = Arc::new(seeded(&["p"]));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.incr_view("p", 1))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.pkg_view("p"), 100);
    assert_eq!(store.total_view(), 100);
}

#[test]
fn every_increment_advances_the_version() {
    let store = seeded(&["p"]);
    let v0 = store.last_updated();
    store.incr_view("p", 1);
    store.incr_get("p", 1);
    assert_eq!(store.last_updated(), v0 + 2);
}

#[test]
#[should_panic(expected = "import path not seeded")]
fn increment_on_unseeded_path_panics() {
    let store = seeded(&["known.example/pkg"]);
    store.incr_view("unknown.example/pkg", 1);
}

#[test]
fn seeding_is_idempotent() {
    let mut store = StatsStore::new();
    store.seed("example.com/a");
    store.incr_view("example.com/a", 4);
    store.seed("example.com/a");
    assert_eq!(store.pkg_view("example.com/a"), 4);
}
