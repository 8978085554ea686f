//! core::config::schema
//!
//! Settings schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: attempt counts must be positive,
//! the tag key must be a well-formed dotted path.

use serde::{Deserialize, Serialize};

use super::SettingsError;

/// Global settings.
///
/// # Example
///
/// ```toml
/// [git]
/// author_name = "lodestar"
/// author_email = "lodestar@example.com"
/// branch = "main"
///
/// [publish]
/// max_attempts = 3
/// tag_key = "image.tag"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Commit identity and branch selection
    pub git: Option<GitSettings>,

    /// Publish behavior
    pub publish: Option<PublishSettings>,
}

impl Settings {
    /// Validate the settings values.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(git) = &self.git {
            git.validate()?;
        }
        if let Some(publish) = &self.publish {
            publish.validate()?;
        }
        Ok(())
    }
}

/// Git commit settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitSettings {
    /// Commit author name
    pub author_name: Option<String>,

    /// Commit author email
    pub author_email: Option<String>,

    /// Branch to publish to (default: the remote's HEAD branch)
    pub branch: Option<String>,
}

impl GitSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        for (key, value) in [
            ("git.author_name", &self.author_name),
            ("git.author_email", &self.author_email),
            ("git.branch", &self.branch),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(SettingsError::InvalidValue(format!(
                        "{} cannot be empty",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Publish settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    /// Total publish attempts when a conflict is detected
    pub max_attempts: Option<u32>,

    /// Dotted key of the tag inside environment documents
    pub tag_key: Option<String>,
}

impl PublishSettings {
    /// Upper bound on configured publish attempts.
    pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

    fn validate(&self) -> Result<(), SettingsError> {
        if let Some(n) = self.max_attempts {
            if n == 0 || n > Self::MAX_ATTEMPTS_LIMIT {
                return Err(SettingsError::InvalidValue(format!(
                    "publish.max_attempts must be between 1 and {}, got {}",
                    Self::MAX_ATTEMPTS_LIMIT,
                    n
                )));
            }
        }
        if let Some(key) = &self.tag_key {
            if key.is_empty() || key.split('.').any(|segment| segment.trim().is_empty()) {
                return Err(SettingsError::InvalidValue(format!(
                    "invalid publish.tag_key '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}
