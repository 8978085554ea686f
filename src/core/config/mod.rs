//! core::config
//!
//! Global settings schema and loading.
//!
//! # Precedence
//!
//! Settings are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Settings file
//! 3. CLI flags (not handled here)
//!
//! # Settings Locations
//!
//! Searched in order:
//! 1. `$LODESTAR_CONFIG` if set
//! 2. `<home>/config.toml`
//!
//! A missing `<home>/config.toml` is not an error; defaults are used. A
//! `$LODESTAR_CONFIG` naming a missing file is.
//!
//! # Example
//!
//! ```no_run
//! use lodestar::core::config::Config;
//! use lodestar::core::paths::LodestarPaths;
//! use std::path::PathBuf;
//!
//! let paths = LodestarPaths::new(PathBuf::from("/home/ops/.lodestar"));
//! let config = Config::load(&paths).unwrap();
//!
//! println!("Attempts: {}", config.max_attempts());
//! println!("Tag key: {}", config.tag_key());
//! ```

pub mod schema;

pub use schema::{GitSettings, PublishSettings, Settings};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::paths::LodestarPaths;

/// Default number of publish attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default dotted key of the tag inside environment documents.
pub const DEFAULT_TAG_KEY: &str = "tag";

/// Default commit author name.
pub const DEFAULT_AUTHOR_NAME: &str = "lodestar";

/// Default commit author email.
pub const DEFAULT_AUTHOR_EMAIL: &str = "lodestar@localhost";

/// Errors from settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Loaded settings with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed settings
    pub settings: Settings,
    /// Path the settings were loaded from (if any)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load settings from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read,
    /// parsed, or validated.
    pub fn load(paths: &LodestarPaths) -> Result<Self, SettingsError> {
        if let Some(path) = std::env::var_os("LODESTAR_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let path = paths.settings_path();
        if path.exists() {
            return Self::load_from(&path);
        }

        Ok(Self::default())
    }

    /// Load settings from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Settings =
            toml::from_str(&contents).map_err(|e| SettingsError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        settings.validate()?;

        Ok(Self {
            settings,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Total publish attempts (first try plus conflict retries).
    ///
    /// Defaults to 3.
    pub fn max_attempts(&self) -> u32 {
        self.settings
            .publish
            .as_ref()
            .and_then(|p| p.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    /// Dotted key of the tag inside environment documents.
    ///
    /// Defaults to `tag`.
    pub fn tag_key(&self) -> &str {
        self.settings
            .publish
            .as_ref()
            .and_then(|p| p.tag_key.as_deref())
            .unwrap_or(DEFAULT_TAG_KEY)
    }

    /// Commit author name.
    pub fn author_name(&self) -> &str {
        self.settings
            .git
            .as_ref()
            .and_then(|g| g.author_name.as_deref())
            .unwrap_or(DEFAULT_AUTHOR_NAME)
    }

    /// Commit author email.
    pub fn author_email(&self) -> &str {
        self.settings
            .git
            .as_ref()
            .and_then(|g| g.author_email.as_deref())
            .unwrap_or(DEFAULT_AUTHOR_EMAIL)
    }

    /// Branch override. `None` means "use the remote's default branch".
    pub fn branch(&self) -> Option<&str> {
        self.settings.git.as_ref().and_then(|g| g.branch.as_deref())
    }

    /// Get the path the settings were loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
