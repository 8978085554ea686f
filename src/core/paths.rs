//! core::paths
//!
//! Centralized path routing for Lodestar's local state directory.
//!
//! # Storage Layout
//!
//! All local state lives under a single home directory:
//! - `config.toml` - Global settings
//! - `app/<name>.yaml` - Registered app configurations
//! - `locks/<hash>.lock` - Per-repository publish locks
//!
//! # Home Resolution
//!
//! Searched in order:
//! 1. Explicit override (`--home` / `$LODESTAR_HOME`, resolved by the CLI)
//! 2. `~/.lodestar`
//!
//! # Example
//!
//! ```
//! use lodestar::core::paths::LodestarPaths;
//! use std::path::PathBuf;
//!
//! let paths = LodestarPaths::new(PathBuf::from("/home/ops/.lodestar"));
//!
//! assert_eq!(
//!     paths.app_dir(),
//!     PathBuf::from("/home/ops/.lodestar/app")
//! );
//! ```

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Directory under home holding registered app configs.
const APP_DIR: &str = "app";

/// Directory under home holding publish locks.
const LOCKS_DIR: &str = "locks";

/// Centralized path routing for Lodestar storage.
///
/// No code outside this module should compute paths under the home
/// directory by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LodestarPaths {
    /// Root of the local state directory.
    pub home: PathBuf,
}

impl LodestarPaths {
    /// Create paths rooted at an explicit home directory.
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// Resolve the home directory.
    ///
    /// Uses `override_home` when given, otherwise `~/.lodestar`.
    /// Returns `None` only when no override is given and the user's home
    /// directory cannot be determined.
    pub fn resolve(override_home: Option<&Path>) -> Option<Self> {
        if let Some(home) = override_home {
            return Some(Self::new(home.to_path_buf()));
        }
        dirs::home_dir().map(|home| Self::new(home.join(".lodestar")))
    }

    /// Path to the global settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Directory holding registered app configs.
    pub fn app_dir(&self) -> PathBuf {
        self.home.join(APP_DIR)
    }

    /// Directory holding per-repository publish locks.
    pub fn locks_dir(&self) -> PathBuf {
        self.home.join(LOCKS_DIR)
    }

    /// Lock file for a backing repository URL.
    ///
    /// The URL is hashed so that arbitrary URLs map to safe file names.
    /// Trailing slashes and a `.git` suffix are ignored so that equivalent
    /// spellings of one repository share a lock.
    pub fn publish_lock_path(&self, repo_url: &str) -> PathBuf {
        let normalized = repo_url.trim_end_matches('/');
        let normalized = normalized.strip_suffix(".git").unwrap_or(normalized);
        let digest = Sha256::digest(normalized.as_bytes());
        let name = hex::encode(&digest[..16]);
        self.locks_dir().join(format!("{}.lock", name))
    }
}
