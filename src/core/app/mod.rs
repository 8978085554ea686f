//! core::app
//!
//! App configuration loading.
//!
//! # Overview
//!
//! An app configuration names the application, the repository that backs
//! its environment records, and its ordered environment graph. It is loaded
//! from a file path on every invocation, whether that path was given
//! directly or produced by a registry lookup.
//!
//! # Validation
//!
//! Loading enforces the document's structure:
//! - `AppInfo.Name` and `AppInfo.RepoUrl` are non-empty
//! - every environment has a non-empty `SrcPath`
//! - environment names are unique within the graph
//!
//! An empty `EnvGraph` is *not* rejected here; commands check it before
//! resolving environments (see [`crate::core::resolve::require_environments`]).
//!
//! # Example
//!
//! ```no_run
//! use lodestar::core::app::load;
//! use std::path::Path;
//!
//! let config = load(Path::new("api.yaml")).unwrap();
//! println!("{} -> {}", config.app_info.name, config.app_info.repo_url);
//! ```

pub mod schema;

pub use schema::{AppInfo, EnvironmentRecord, LodestarAppConfig};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from loading an app configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file does not exist or cannot be read.
    #[error("app config not found at '{path}': {source}")]
    ConfigNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document cannot be parsed into an app configuration.
    #[error("malformed app config '{path}': {message}")]
    MalformedConfig { path: PathBuf, message: String },

    /// Two environments share a name.
    #[error("app config '{path}' defines environment '{name}' more than once")]
    DuplicateEnvironment { path: PathBuf, name: String },
}

/// Load and validate an app configuration from `path`.
///
/// # Errors
///
/// - [`LoadError::ConfigNotFound`] if the file cannot be read
/// - [`LoadError::MalformedConfig`] if parsing or structural validation fails
/// - [`LoadError::DuplicateEnvironment`] if an environment name repeats
pub fn load(path: &Path) -> Result<LodestarAppConfig, LoadError> {
    let contents = fs::read_to_string(path).map_err(|e| LoadError::ConfigNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = parse(&contents).map_err(|message| LoadError::MalformedConfig {
        path: path.to_path_buf(),
        message,
    })?;

    if let Some(name) = first_duplicate(&config) {
        return Err(LoadError::DuplicateEnvironment {
            path: path.to_path_buf(),
            name,
        });
    }

    tracing::debug!(
        path = %path.display(),
        app = %config.app_info.name,
        environments = config.env_graph.len(),
        "loaded app config"
    );

    Ok(config)
}

/// Parse a document and check its structural fields.
fn parse(contents: &str) -> Result<LodestarAppConfig, String> {
    let config: LodestarAppConfig =
        serde_yaml_ng::from_str(contents).map_err(|e| e.to_string())?;

    if config.app_info.name.trim().is_empty() {
        return Err("AppInfo.Name cannot be empty".to_string());
    }
    if config.app_info.repo_url.trim().is_empty() {
        return Err("AppInfo.RepoUrl cannot be empty".to_string());
    }
    for env in &config.env_graph {
        if env.src_path.trim().is_empty() {
            return Err(format!("environment '{}' has an empty SrcPath", env.name));
        }
    }

    Ok(config)
}

/// Return the first environment name that appears more than once.
fn first_duplicate(config: &LodestarAppConfig) -> Option<String> {
    let mut seen = HashSet::new();
    config
        .env_graph
        .iter()
        .find(|env| !seen.insert(env.name.as_str()))
        .map(|env| env.name.to_string())
}
