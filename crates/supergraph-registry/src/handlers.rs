// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers.

use crate::compose::{ComposeError, CompositionResult};
use crate::registry::RegistryError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    pub code: u16,
}

impl ApiError {
    fn new(code: u16, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let code = if err.is_invalid_input() { 400 } else { 500 };
        Self::new(code, err.to_string())
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        let code = match err {
            ComposeError::Timeout(_) => 504,
            ComposeError::Launch(_) | ComposeError::Io(_) => 500,
        };
        Self::new(code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(400, rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("Blocking task failed: {}", err);
        Self::new(500, err.to_string())
    }
}

/// Body of `POST /add-sub-schema`
#[derive(Debug, Default, Deserialize)]
pub struct AddSubSchemaRequest {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
}

/// POST /add-sub-schema
pub async fn add_sub_schema(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddSubSchemaRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let schema = req.schema.unwrap_or_default();
    if schema.is_empty() {
        return Err(RegistryError::EmptySchema.into());
    }

    let registry = state.registry.clone();
    let ack = tokio::task::spawn_blocking(move || {
        registry.register(req.module.as_deref(), &schema)
    })
    .await??;

    let body = serde_json::json!({
        "message": format!("Schema saved to {}", ack.path.display()),
    });
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// POST /run-rover
pub async fn run_rover(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CompositionResult>, ApiError> {
    let result = state.composer.compose().await?;
    Ok(Json(result))
}

/// GET /subgraphs
pub async fn subgraphs(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let registry = state.registry.clone();
    let modules = tokio::task::spawn_blocking(move || registry.list()).await??;
    let names: Vec<&str> = modules.iter().map(|m| m.as_str()).collect();

    Ok((StatusCode::OK, Json(serde_json::json!({ "subgraphs": names }))).into_response())
}

/// GET /health
pub async fn health() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}

/// GET /api/v1/info - Service info
pub async fn info() -> Response {
    let info = serde_json::json!({
        "name": "supergraph-registry",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "POST /add-sub-schema",
            "POST /run-rover",
            "GET /subgraphs",
            "GET /health",
            "GET /api/v1/info"
        ]
    });

    (StatusCode::OK, Json(info)).into_response()
}
