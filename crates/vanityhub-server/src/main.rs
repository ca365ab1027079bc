//! vanityhub server binary.
//!
//! Startup order matters: open the backing store, load persisted stats, seed
//! every configured import path, start the synchronizer, and only then start
//! accepting requests. Shutdown reverses it: stop the HTTP server, signal the
//! synchronizer, and wait for its final flush before exiting.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use vanityhub_core::persist::json_file::JsonFileBacking;
use vanityhub_core::persist::sled_store::SledBacking;
use vanityhub_core::persist::{self, StatsBacking, Synchronizer};
use vanityhub_server::config::StatsBackend;
use vanityhub_server::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vanityhub-server starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./vanityhub.toml".to_string());
    let cfg = config::load_from_file(&config_path).expect("config load failed");
    let listen: SocketAddr = cfg.addr.parse().expect("addr must be a valid SocketAddr");

    let backing: Arc<dyn StatsBacking> = match cfg.stats.backend {
        StatsBackend::Json => Arc::new(JsonFileBacking::new(&cfg.stats.path)),
        StatsBackend::Sled => {
            Arc::new(SledBacking::open(&cfg.stats.path).expect("failed to open stats db"))
        }
    };

    // A corrupt backing store is fatal: running with unknown counter state
    // would silently diverge from disk.
    let mut stats = persist::load_stats(backing.as_ref())
        .await
        .expect("failed to load persisted stats");
    for pkg in &cfg.packages {
        stats.seed(&pkg.import_path);
    }
    let stats = Arc::new(stats);

    let sync = Synchronizer::new(
        Arc::clone(&stats),
        Arc::clone(&backing),
        Duration::from_secs(cfg.stats.sync_interval_secs),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sync_task = tokio::spawn(sync.run(shutdown_rx));

    let state = AppState::new(cfg, stats);
    let app = router::build_router(state);

    tracing::info!(%listen, "listening");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    // Requests have stopped; let the synchronizer take its final flush and
    // wait for it before the backing store handle drops.
    tracing::info!("server closed, flushing stats");
    let _ = shutdown_tx.send(true);
    sync_task.await.expect("stats synchronizer panicked");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
