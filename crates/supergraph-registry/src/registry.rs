// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! On-disk subgraph registry.
//!
//! Each subgraph is one file, `{root}/{module}.graphql`. A registration
//! replaces the file through a temp file + rename in the same directory, so
//! a concurrent composition sees either the previous fragment or the new
//! one, never a partial write.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Module used when a registration omits one.
pub const DEFAULT_MODULE: &str = "webui";

/// File extension of stored fragments.
pub const FRAGMENT_EXTENSION: &str = "graphql";

const MAX_MODULE_LEN: usize = 128;

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors produced by the subgraph registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The schema text is empty.
    #[error("Schema string is required")]
    EmptySchema,

    /// The module name cannot be mapped to a file under the registry root.
    #[error("invalid module name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The fragment could not be committed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    /// Caller-side precondition failure (as opposed to a storage failure).
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RegistryError::EmptySchema)
    }

    fn io(path: &Path, source: io::Error) -> Self {
        RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// ModuleName
// ---------------------------------------------------------------------------

/// A validated subgraph name, safe to use as a file stem.
///
/// Only `[A-Za-z0-9_.-]` is accepted and the name may not start with `.`,
/// which rules out separators, `..` and hidden files. Names are rejected
/// rather than rewritten so two different inputs never share a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

impl ModuleName {
    /// Parse a caller-supplied module; empty or absent selects [`DEFAULT_MODULE`].
    pub fn resolve(module: Option<&str>) -> Result<Self, RegistryError> {
        match module {
            None | Some("") => Ok(ModuleName(DEFAULT_MODULE.to_string())),
            Some(name) => Self::parse(name),
        }
    }

    /// Parse a non-empty module name.
    pub fn parse(name: &str) -> Result<Self, RegistryError> {
        let reject = |reason| RegistryError::InvalidName {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(reject("name is empty"));
        }
        if name.len() > MAX_MODULE_LEN {
            return Err(reject("name is longer than 128 bytes"));
        }
        if name.starts_with('.') {
            return Err(reject("name may not start with '.'"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(reject("only ASCII letters, digits, '_', '-' and '.' are allowed"));
        }

        Ok(ModuleName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SubgraphRegistry
// ---------------------------------------------------------------------------

/// Acknowledgement of a committed registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The module actually applied (after defaulting).
    pub module: ModuleName,
    /// File the fragment was committed to.
    pub path: PathBuf,
}

/// File-backed store of subgraph fragments, one per module name.
#[derive(Debug, Clone)]
pub struct SubgraphRegistry {
    root: PathBuf,
    /// Path owned by the composition tool; never handed out to a module.
    reserved: Option<PathBuf>,
}

impl SubgraphRegistry {
    /// Create a registry rooted at `root`. The directory is created lazily on
    /// the first registration.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SubgraphRegistry {
            root: root.into(),
            reserved: None,
        }
    }

    /// Protect `path` (typically the merged supergraph output) from being
    /// overwritten by a registration whose module maps onto it.
    pub fn with_reserved(mut self, path: impl Into<PathBuf>) -> Self {
        self.reserved = Some(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage path for a module.
    pub fn path_for(&self, module: &ModuleName) -> PathBuf {
        self.root.join(format!("{}.{}", module, FRAGMENT_EXTENSION))
    }

    /// Register (or replace) the fragment for `module`.
    pub fn register(
        &self,
        module: Option<&str>,
        schema: &str,
    ) -> Result<Registration, RegistryError> {
        if schema.is_empty() {
            return Err(RegistryError::EmptySchema);
        }

        let module =
            ModuleName::resolve(module).inspect_err(|e| warn!("Rejected registration: {}", e))?;
        let path = self.path_for(&module);

        if self.reserved.as_deref() == Some(path.as_path()) {
            warn!("Rejected module {}: collides with composition output", module);
            return Err(RegistryError::InvalidName {
                name: module.0,
                reason: "name is reserved for the composed supergraph",
            });
        }

        self.commit(&module, &path, schema.as_bytes())?;

        info!(
            "Registered subgraph {} ({} bytes) at {}",
            module,
            schema.len(),
            path.display()
        );

        Ok(Registration { module, path })
    }

    /// Read the committed fragment for `module`, `None` if never registered.
    pub fn read(&self, module: &ModuleName) -> Result<Option<String>, RegistryError> {
        let path = self.path_for(module);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::io(&path, e)),
        }
    }

    /// Names of all registered subgraphs, sorted.
    pub fn list(&self) -> Result<Vec<ModuleName>, RegistryError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RegistryError::io(&self.root, e)),
        };

        let mut modules = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| RegistryError::io(&self.root, e))?.path();

            if self.reserved.as_deref() == Some(path.as_path()) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
                continue;
            }
            // Files dropped in by hand that are not valid names are skipped.
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(module) = ModuleName::parse(stem) {
                    if path.is_file() {
                        modules.push(module);
                    }
                }
            }
        }

        modules.sort();
        Ok(modules)
    }

    fn commit(&self, module: &ModuleName, path: &Path, bytes: &[u8]) -> Result<(), RegistryError> {
        fs::create_dir_all(&self.root).map_err(|e| RegistryError::io(&self.root, e))?;

        // Same directory as the target so the final rename stays on one filesystem.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", module))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|e| RegistryError::io(&self.root, e))?;

        debug!("Staging {} in {}", module, tmp.path().display());

        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| RegistryError::io(tmp.path(), e))?;

        tmp.persist(path).map_err(|e| RegistryError::io(path, e.error))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
