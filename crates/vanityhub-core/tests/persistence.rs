#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use vanityhub_core::error::Result;
use vanityhub_core::persist::json_file::JsonFileBacking;
use vanityhub_core::persist::sled_store::SledBacking;
use vanityhub_core::persist::{load_stats, StatsBacking, StatsSnapshot, Synchronizer};
use vanityhub_core::stats::StatsStore;
use vanityhub_core::HubError;

/// In-memory backing that counts durable writes, for flush-idempotence
/// checks. Fails the first `fail_first` stores.
#[derive(Default)]
struct RecordingBacking {
    last: std::sync::Mutex<Option<StatsSnapshot>>,
    writes: AtomicUsize,
    fail_first: AtomicUsize,
}

#[async_trait]
impl StatsBacking for RecordingBacking {
    async fn load(&self) -> Result<Option<StatsSnapshot>> {
        Ok(self.last.lock().unwrap().clone())
    }

    async fn store(&self, snapshot: &StatsSnapshot) -> Result<()> {
        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(HubError::Backing("injected write failure".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

fn seeded(paths: &[&str]) -> Arc<StatsStore> {
    let mut store = StatsStore::new();
    for p in paths {
        store.seed(p);
    }
    Arc::new(store)
}

#[tokio::test]
async fn flush_without_changes_is_a_noop() {
    let backing = Arc::new(RecordingBacking::default());
    let stats = seeded(&["example.com/a"]);
    let sync = Synchronizer::new(stats.clone(), backing.clone(), Duration::from_secs(60));

    // Nothing ever incremented: not dirty, nothing written.
    assert!(!sync.flush().await.unwrap());
    assert_eq!(backing.writes.load(Ordering::SeqCst), 0);

    stats.incr_view("example.com/a", 1);
    assert!(sync.flush().await.unwrap());
    assert!(!sync.flush().await.unwrap());
    assert_eq!(backing.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_flush_stays_dirty_and_retries() {
    let backing = Arc::new(RecordingBacking {
        fail_first: AtomicUsize::new(1),
        ..Default::default()
    });
    let stats = seeded(&["example.com/a"]);
    let sync = Synchronizer::new(stats.clone(), backing.clone(), Duration::from_secs(60));

    stats.incr_view("example.com/a", 2);
    assert!(sync.flush().await.is_err());
    assert_eq!(backing.writes.load(Ordering::SeqCst), 0);

    // Next tick retries the same state and succeeds.
    assert!(sync.flush().await.unwrap());
    let snap = backing.last.lock().unwrap().clone().unwrap();
    assert_eq!(snap.pkgs_view["example.com/a"], 2);
}

#[tokio::test]
async fn increments_during_flush_are_not_marked_synced() {
    let backing = Arc::new(RecordingBacking::default());
    let stats = seeded(&["example.com/a"]);
    let sync = Synchronizer::new(stats.clone(), backing.clone(), Duration::from_secs(60));

    stats.incr_view("example.com/a", 1);
    assert!(sync.flush().await.unwrap());

    // An increment after the flush's version snapshot re-dirties the store.
    stats.incr_view("example.com/a", 1);
    assert!(sync.flush().await.unwrap());
    assert_eq!(backing.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn json_flush_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let backing: Arc<dyn StatsBacking> =
        Arc::new(JsonFileBacking::new(dir.path().join("stats.json")));

    let stats = seeded(&["example.com/a", "example.com/b"]);
    stats.incr_view("example.com/a", 1);
    stats.incr_view("example.com/a", 1);
    stats.incr_view("example.com/a", 1);
    stats.incr_get("example.com/b", 1);

    let sync = Synchronizer::new(stats, backing.clone(), Duration::from_secs(60));
    assert!(sync.flush().await.unwrap());

    let restored = load_stats(backing.as_ref()).await.unwrap();
    assert_eq!(restored.total_view(), 3);
    assert_eq!(restored.total_get(), 1);
    assert_eq!(restored.pkg_view("example.com/a"), 3);
    assert_eq!(restored.pkg_view("example.com/b"), 0);
    assert_eq!(restored.pkg_get("example.com/b"), 1);
}

#[tokio::test]
async fn missing_json_file_loads_as_zero_store() {
    let dir = tempfile::tempdir().unwrap();
    let backing = JsonFileBacking::new(dir.path().join("does-not-exist.json"));

    let stats = load_stats(&backing).await.unwrap();
    assert_eq!(stats.total_view(), 0);
    assert_eq!(stats.total_get(), 0);
    assert_eq!(stats.import_paths().count(), 0);
}

#[tokio::test]
async fn corrupt_json_file_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    tokio::fs::write(&path, b"{ not json").await.unwrap();

    let backing = JsonFileBacking::new(path);
    assert!(load_stats(&backing).await.is_err());
}

#[tokio::test]
async fn loaded_paths_get_cells_in_both_maps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    // Hand-written state with a path present only under views.
    tokio::fs::write(
        &path,
        br#"{"total_view": 9, "total_get": 0, "pkgs_view": {"old.example/pkg": 9}, "pkgs_get": {}}"#,
    )
    .await
    .unwrap();

    let stats = load_stats(&JsonFileBacking::new(path)).await.unwrap();
    assert_eq!(stats.pkg_view("old.example/pkg"), 9);
    assert_eq!(stats.pkg_get("old.example/pkg"), 0);
}

#[tokio::test]
async fn sled_flush_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let backing: Arc<dyn StatsBacking> = Arc::new(SledBacking::open(dir.path()).unwrap());

    let stats = seeded(&["example.com/a", "example.com/b"]);
    stats.incr_view("example.com/a", 3);
    stats.incr_get("example.com/b", 1);

    let sync = Synchronizer::new(stats, backing.clone(), Duration::from_secs(60));
    assert!(sync.flush().await.unwrap());

    let restored = load_stats(backing.as_ref()).await.unwrap();
    assert_eq!(restored.total_view(), 3);
    assert_eq!(restored.total_get(), 1);
    assert_eq!(restored.pkg_view("example.com/a"), 3);
    assert_eq!(restored.pkg_get("example.com/b"), 1);
}

#[tokio::test]
async fn sled_load_ignores_unknown_and_malformed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let db = sled::open(dir.path()).unwrap();
    db.insert("view_total", "12").unwrap();
    db.insert("get_total", "4").unwrap();
    db.insert("view_example.com/a", "12").unwrap();
    db.insert("get_example.com/a", "not a number").unwrap();
    db.insert("bogus_key", "1").unwrap();
    db.flush().unwrap();

    let stats = load_stats(&SledBacking::new(db)).await.unwrap();
    assert_eq!(stats.total_view(), 12);
    assert_eq!(stats.total_get(), 4);
    assert_eq!(stats.pkg_view("example.com/a"), 12);
    assert_eq!(stats.pkg_get("example.com/a"), 0);
}

#[tokio::test]
async fn empty_sled_db_loads_as_zero_store() {
    let dir = tempfile::tempdir().unwrap();
    let backing = SledBacking::open(dir.path()).unwrap();

    let stats = load_stats(&backing).await.unwrap();
    assert_eq!(stats.total_view(), 0);
    assert_eq!(stats.import_paths().count(), 0);
}

#[tokio::test]
async fn shutdown_signal_triggers_a_final_flush() {
    let dir = tempfile::tempdir().unwrap();
    let backing: Arc<dyn StatsBacking> =
        Arc::new(JsonFileBacking::new(dir.path().join("stats.json")));

    let stats = seeded(&["example.com/a"]);
    let sync = Synchronizer::new(stats.clone(), backing.clone(), Duration::from_secs(3600));
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(sync.run(rx));

    // Recorded before shutdown, flushed only by the final flush (the tick
    // interval is far longer than this test).
    stats.incr_get("example.com/a", 1);
    tx.send(true).unwrap();
    task.await.unwrap();

    let restored = load_stats(backing.as_ref()).await.unwrap();
    assert_eq!(restored.pkg_get("example.com/a"), 1);
    assert_eq!(restored.total_get(), 1);
}
