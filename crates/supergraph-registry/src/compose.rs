// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Supergraph composition.
//!
//! Runs the composition tool over whatever fragments are in the registry root
//! and hands its exit status and output back untouched. A nonzero exit is a
//! normal result; only a failure to run the tool at all is an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::runner::{Invocation, ProcessRunner, RunError};

/// Outcome of one composition run, as reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl CompositionResult {
    pub fn succeeded(&self) -> bool {
        self.returncode == 0
    }
}

/// Composition errors.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Launch(RunError),

    #[error("composition timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Io(String),
}

impl From<RunError> for ComposeError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Launch { .. } => ComposeError::Launch(err),
            RunError::TimedOut(limit) => ComposeError::Timeout(limit),
            RunError::Io(e) => ComposeError::Io(e.to_string()),
        }
    }
}

/// Triggers the composition tool with a fixed command line.
pub struct Composer {
    runner: Arc<dyn ProcessRunner>,
    invocation: Invocation,
    timeout: Option<Duration>,
    /// One run at a time; the tool always writes the same output file.
    running: Mutex<()>,
}

impl Composer {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        invocation: Invocation,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            runner,
            invocation,
            timeout,
            running: Mutex::new(()),
        }
    }

    /// Run composition and wait for it to finish.
    pub async fn compose(&self) -> Result<CompositionResult, ComposeError> {
        let _guard = self.running.lock().await;
        let started = Instant::now();

        let output = self
            .runner
            .run(&self.invocation, self.timeout)
            .await
            .inspect_err(|e| warn!("Composition did not complete: {}", e))?;

        let result = CompositionResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            returncode: output.exit_code,
        };

        info!(
            "Composition finished in {:?} with return code {}",
            started.elapsed(),
            result.returncode
        );

        Ok(result)
    }
}
