// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions.

use crate::handlers;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Registry and composition routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add-sub-schema", post(handlers::add_sub_schema))
        .route("/run-rover", post(handlers::run_rover))
        .route("/subgraphs", get(handlers::subgraphs))
        .route("/health", get(handlers::health))
        .route("/api/v1/info", get(handlers::info))
}

/// Full application router with tracing and CORS layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    api_routes()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
