// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service configuration.
//!
//! Loaded from a TOML file and/or built from command-line flags. Every path
//! the service touches lives here so nothing depends on ambient globals.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::runner::Invocation;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Registry service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to bind to (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// HTTP port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one `<module>.graphql` file per subgraph
    #[serde(default = "default_registry_root")]
    pub registry_root: PathBuf,

    /// Composition executable
    #[serde(default = "default_rover_binary")]
    pub rover_binary: PathBuf,

    /// Supergraph configuration passed to the composition tool
    #[serde(default = "default_rover_config")]
    pub rover_config: PathBuf,

    /// Where the composition tool writes the merged schema
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Composition timeout in seconds (0 = wait forever)
    #[serde(default = "default_compose_timeout")]
    pub compose_timeout_secs: u64,

    /// Log level / filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_registry_root() -> PathBuf {
    PathBuf::from("/dist")
}

fn default_rover_binary() -> PathBuf {
    PathBuf::from("/dist/rover")
}

fn default_rover_config() -> PathBuf {
    PathBuf::from("/dist/rover-config.yaml")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("/dist/schema.graphql")
}

fn default_compose_timeout() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            registry_root: default_registry_root(),
            rover_binary: default_rover_binary(),
            rover_config: default_rover_config(),
            output_path: default_output_path(),
            compose_timeout_secs: default_compose_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port cannot be 0".into()));
        }
        if self.registry_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("registry_root cannot be empty".into()));
        }
        if self.rover_binary.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("rover_binary cannot be empty".into()));
        }
        Ok(())
    }

    /// Resolve relative paths against the process working directory.
    pub fn resolve_paths(self) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir()?;
        self.with_base_dir(&cwd)
    }

    /// Resolve relative paths against `base`.
    ///
    /// The tool runs with `registry_root` as its working directory, so every
    /// path handed to it must be absolute. A bare `rover_binary` name (no
    /// directory part) is left alone for `PATH` lookup.
    pub fn with_base_dir(mut self, base: &Path) -> Result<Self, ConfigError> {
        // `join` keeps an absolute `path` as is.
        let resolve = |path: &Path| -> Result<PathBuf, ConfigError> {
            Ok(std::path::absolute(base.join(path))?)
        };

        self.registry_root = resolve(&self.registry_root)?;
        self.rover_config = resolve(&self.rover_config)?;
        self.output_path = resolve(&self.output_path)?;
        if self.rover_binary.components().count() > 1 {
            self.rover_binary = resolve(&self.rover_binary)?;
        }
        Ok(self)
    }

    /// Composition timeout, `None` when disabled.
    pub fn compose_timeout(&self) -> Option<Duration> {
        match self.compose_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// The fixed composition command line.
    ///
    /// `rover supergraph compose --output <output_path> --config <rover_config>`,
    /// run from the registry root so relative schema paths in the supergraph
    /// config resolve against registered fragments.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            program: self.rover_binary.clone(),
            args: vec![
                "supergraph".into(),
                "compose".into(),
                "--output".into(),
                self.output_path.clone().into_os_string(),
                "--config".into(),
                self.rover_config.clone().into_os_string(),
            ],
            working_dir: Some(self.registry_root.clone()),
        }
    }
}
