//! core::registry
//!
//! Registry of known apps on the local system.
//!
//! Registered app configs live under `<home>/app/` as `<name>.yaml` or
//! `<name>.yml`. The registry only maps names to paths; loading is done by
//! [`crate::core::app::load`].

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use super::paths::LodestarPaths;

/// Config file extensions, in lookup order.
const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Errors from registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry kind is not supported.
    #[error("unknown registry kind '{0}'")]
    UnknownKind(String),

    /// The name cannot be used as a registry key.
    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: String, name: String },

    /// No entry with that name is registered.
    #[error("no {kind} named '{name}' is registered in {dir}")]
    NotFound {
        kind: String,
        name: String,
        dir: PathBuf,
    },

    /// The registry directory cannot be read.
    #[error("failed to read registry '{dir}': {source}")]
    ReadError {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// Kinds of registered objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// Application configs
    App,
}

impl RegistryKind {
    /// Parse a kind name.
    pub fn parse(kind: &str) -> Result<Self, RegistryError> {
        match kind {
            "app" => Ok(RegistryKind::App),
            other => Err(RegistryError::UnknownKind(other.to_string())),
        }
    }

    /// The kind's name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::App => "app",
        }
    }
}

/// The on-disk registry.
#[derive(Debug, Clone)]
pub struct Registry {
    paths: LodestarPaths,
}

impl Registry {
    /// Create a registry rooted at the given paths.
    pub fn new(paths: LodestarPaths) -> Self {
        Self { paths }
    }

    /// Directory holding entries of `kind`.
    fn dir(&self, kind: RegistryKind) -> PathBuf {
        match kind {
            RegistryKind::App => self.paths.app_dir(),
        }
    }

    /// Resolve a registered name to its config file path.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownKind`] for kinds other than `app`
    /// - [`RegistryError::InvalidName`] for names that are not plain file stems
    /// - [`RegistryError::NotFound`] if nothing is registered under `name`
    pub fn resolve(&self, kind: &str, name: &str) -> Result<PathBuf, RegistryError> {
        let kind = RegistryKind::parse(kind)?;
        validate_name(kind, name)?;

        let dir = self.dir(kind);
        for ext in EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", name, ext));
            if candidate.is_file() {
                tracing::debug!(
                    kind = kind.as_str(),
                    name,
                    path = %candidate.display(),
                    "resolved registry entry"
                );
                return Ok(candidate);
            }
        }

        Err(RegistryError::NotFound {
            kind: kind.as_str().to_string(),
            name: name.to_string(),
            dir,
        })
    }

    /// List registered names of `kind`, sorted.
    ///
    /// A missing registry directory yields an empty list.
    pub fn list(&self, kind: RegistryKind) -> Result<Vec<String>, RegistryError> {
        let dir = self.dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RegistryError::ReadError { dir, source: e }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RegistryError::ReadError {
                dir: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_config = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            if !is_config {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn validate_name(kind: RegistryKind, name: &str) -> Result<(), RegistryError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.chars().any(|c| c.is_control());
    if invalid {
        return Err(RegistryError::InvalidName {
            kind: kind.as_str().to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}
