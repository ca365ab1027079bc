//! Prometheus text exposition rendered from the live counter store.

use std::fmt::Write;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use vanityhub_core::stats::StatsStore;

use crate::app_state::AppState;
use crate::obs::auth;

const NAMESPACE: &str = "vanityhub_stats";

/// Turn an import path into a valid metric name suffix.
pub fn sanitize_metric_name(import_path: &str) -> String {
    import_path
        .chars()
        .map(|c| match c {
            '.' | '/' | '-' => '_',
            c => c,
        })
        .collect()
}

/// Render every counter in Prometheus text exposition format. Packages are
/// sorted so the output is deterministic.
pub fn render(stats: &StatsStore) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# HELP {NAMESPACE}_view_total Number of total page views");
    let _ = writeln!(out, "# TYPE {NAMESPACE}_view_total counter");
    let _ = writeln!(out, "{NAMESPACE}_view_total {}", stats.total_view());

    let _ = writeln!(out, "# HELP {NAMESPACE}_get_total Number of total 'go-get's");
    let _ = writeln!(out, "# TYPE {NAMESPACE}_get_total counter");
    let _ = writeln!(out, "{NAMESPACE}_get_total {}", stats.total_get());

    let mut paths: Vec<&str> = stats.import_paths().collect();
    paths.sort_unstable();

    for path in &paths {
        let name = sanitize_metric_name(path);
        let _ = writeln!(out, "# HELP {NAMESPACE}_view_{name} Number of page views for {path}");
        let _ = writeln!(out, "# TYPE {NAMESPACE}_view_{name} counter");
        let _ = writeln!(out, "{NAMESPACE}_view_{name} {}", stats.pkg_view(path));
    }

    for path in &paths {
        let name = sanitize_metric_name(path);
        let _ = writeln!(out, "# HELP {NAMESPACE}_get_{name} Number of 'go-get's for {path}");
        let _ = writeln!(out, "# TYPE {NAMESPACE}_get_{name} counter");
        let _ = writeln!(out, "{NAMESPACE}_get_{name} {}", stats.pkg_get(path));
    }

    out
}

pub async fn serve_metrics(State(app): State<AppState>, headers: HeaderMap) -> Response {
    if !auth::authorized(&app.cfg().prometheus, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"metrics\"")],
            "unauthorized\n",
        )
            .into_response();
    }

    tracing::trace!("metrics requested");
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render(app.stats()),
    )
        .into_response()
}
