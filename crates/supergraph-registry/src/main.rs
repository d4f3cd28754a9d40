// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subgraph Schema Registry service
//!
//! # Usage
//!
//! ```bash
//! # Serve /dist on port 8080
//! supergraph-registry
//!
//! # Custom registry root and composition tool
//! supergraph-registry --registry-root ./graphs --rover ~/.rover/bin/rover \
//!     --rover-config ./graphs/supergraph.yaml --output ./graphs/supergraph.graphql
//!
//! # Using a configuration file
//! supergraph-registry --config registry.toml
//! ```
//!
//! # Endpoints
//!
//! - `POST /add-sub-schema` - Register a subgraph schema `{schema, module}`
//! - `POST /run-rover` - Compose the supergraph
//! - `GET /subgraphs` - Registered subgraph names
//! - `GET /health` - Health check

use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use supergraph_registry::{build_router, AppState, GatewayConfig, TokioProcessRunner};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Subgraph schema registry and supergraph composition trigger
#[derive(Parser, Debug)]
#[command(name = "supergraph-registry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// Directory holding registered subgraph schemas
    #[arg(long)]
    registry_root: Option<PathBuf>,

    /// Composition executable
    #[arg(long)]
    rover: Option<PathBuf>,

    /// Supergraph configuration passed to the composition tool
    #[arg(long)]
    rover_config: Option<PathBuf>,

    /// Merged supergraph output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Composition timeout in seconds (0 disables)
    #[arg(long)]
    compose_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error) or filter directive
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "registry.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = build_config(&args)?;

    // Initialize logging
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let state = Arc::new(AppState::from_config(
        &config,
        Arc::new(TokioProcessRunner),
    ));
    let app = build_router(state);

    let addr = SocketAddr::new(config.bind_address, config.port);
    info!("Supergraph Registry v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}", addr);
    info!("Registry root: {}", config.registry_root.display());
    info!(
        "Composition: {} (config {}, output {})",
        config.rover_binary.display(),
        config.rover_config.display(),
        config.output_path.display()
    );
    match config.compose_timeout() {
        Some(limit) => info!("Composition timeout: {:?}", limit),
        None => info!("Composition timeout: disabled"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Supergraph registry stopped");
    Ok(())
}

fn build_config(args: &Args) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(ref root) = args.registry_root {
        config.registry_root = root.clone();
    }
    if let Some(ref rover) = args.rover {
        config.rover_binary = rover.clone();
    }
    if let Some(ref rover_config) = args.rover_config {
        config.rover_config = rover_config.clone();
    }
    if let Some(ref output) = args.output {
        config.output_path = output.clone();
    }
    if let Some(secs) = args.compose_timeout {
        config.compose_timeout_secs = secs;
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config.resolve_paths()?)
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::default();
    std::fs::write(&output, config.to_toml()?)?;
    println!("Generated configuration: {}", output.display());
    Ok(())
}

fn cmd_validate(config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = GatewayConfig::from_file(&config)?.resolve_paths()?;
    println!("Configuration is valid: {}", config.display());
    println!("  Listen:        {}:{}", parsed.bind_address, parsed.port);
    println!("  Registry root: {}", parsed.registry_root.display());
    println!("  Rover:         {}", parsed.rover_binary.display());
    println!("  Rover config:  {}", parsed.rover_config.display());
    println!("  Output:        {}", parsed.output_path.display());
    Ok(())
}
