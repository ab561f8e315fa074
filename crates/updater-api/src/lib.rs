//! updater-api — HTTP surface for update checks.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/?version=…` | Update check; XML manifest or empty body |
//! | GET | `/updater_server/?version=…` | Same, under the legacy path |
//! | GET | `/healthz` | Liveness plus the channels the catalog serves |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use updater_core::ReleaseCatalog;
use updater_rollout::UpdateEngine;

/// Shared state for handlers. The catalog is an immutable snapshot.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<ReleaseCatalog>,
    pub engine: UpdateEngine,
}

/// Build the update server router.
pub fn build_router(catalog: Arc<ReleaseCatalog>, engine: UpdateEngine) -> Router {
    let state = ApiState { catalog, engine };

    Router::new()
        .route("/", get(handlers::check_update))
        .route("/updater_server/", get(handlers::check_update))
        .route("/healthz", get(handlers::health))
        .with_state(state)
}
