//! Axum router wiring: one GET route per configured package subpath, plus
//! the metrics endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;

use crate::app_state::AppState;
use crate::obs;
use crate::pages::{self, PageQuery};

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();

    for pkg in &state.cfg().packages {
        let pkg = Arc::new(pkg.clone());
        let path = pkg.subpath.clone();
        router = router.route(
            &path,
            get(move |State(app): State<AppState>, Query(query): Query<PageQuery>| {
                pages::serve_package(app, Arc::clone(&pkg), query)
            }),
        );
    }

    router
        .route("/-/metrics", get(obs::metrics::serve_metrics))
        .with_state(state)
}
