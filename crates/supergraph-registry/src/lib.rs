// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subgraph Schema Registry
//!
//! Stores independently submitted GraphQL subgraph schemas on disk and
//! triggers supergraph composition (`rover supergraph compose`) over them.
//!
//! # Architecture
//!
//! ```text
//!   POST /add-sub-schema            POST /run-rover
//!          |                               |
//!          v                               v
//!   SubgraphRegistry                  Composer
//!   (temp file + rename)                   |
//!          |                               v
//!          v                          ProcessRunner
//!   {registry_root}/{module}.graphql  ---> rover supergraph compose
//!                                            --output {output_path}
//!                                            --config {rover_config}
//! ```
//!
//! Composition reads whatever fragments are committed when the tool scans
//! the root; there is no snapshot across calls.

pub mod compose;
pub mod config;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod runner;

pub use compose::{ComposeError, Composer, CompositionResult};
pub use config::{ConfigError, GatewayConfig};
pub use registry::{ModuleName, Registration, RegistryError, SubgraphRegistry, DEFAULT_MODULE};
pub use routes::build_router;
pub use runner::{Invocation, ProcessOutput, ProcessRunner, RunError, TokioProcessRunner};

use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub registry: SubgraphRegistry,
    pub composer: Composer,
}

impl AppState {
    pub fn new(registry: SubgraphRegistry, composer: Composer) -> Self {
        Self { registry, composer }
    }

    /// Wire a registry and composer from configuration.
    pub fn from_config(config: &GatewayConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let registry = SubgraphRegistry::new(&config.registry_root)
            .with_reserved(&config.output_path);
        let composer = Composer::new(runner, config.invocation(), config.compose_timeout());
        Self::new(registry, composer)
    }
}
