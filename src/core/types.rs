//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Tag`] - Opaque artifact version identifier
//! - [`EnvName`] - Environment identifier within an app's environment graph
//! - [`Credentials`] - Username/token pair for the backing repository
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so the engine never has to re-check them.
//!
//! # Examples
//!
//! ```
//! use lodestar::core::types::{EnvName, Tag};
//!
//! let tag = Tag::new("v1.4.2").unwrap();
//! let env = EnvName::new("staging").unwrap();
//! assert_eq!(tag.as_str(), "v1.4.2");
//! assert_eq!(env.as_str(), "staging");
//!
//! assert!(Tag::new("").is_err());
//! assert!(EnvName::new("  ").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid tag: {0}")]
    InvalidTag(String),

    #[error("invalid environment name: {0}")]
    InvalidEnvName(String),
}

/// An artifact version tag (e.g. a container image tag).
///
/// The core assumes no structure beyond "non-empty, single line, comparable
/// for equality". Surrounding whitespace is rejected rather than trimmed so
/// that what gets published is exactly what the operator typed.
///
/// # Example
///
/// ```
/// use lodestar::core::types::Tag;
///
/// assert!(Tag::new("sha-3f9c2e1").is_ok());
/// assert!(Tag::new("v2\n").is_err());
/// assert!(Tag::new(" v2").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Create a new validated tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTag` if the tag is empty, spans multiple
    /// lines, or carries leading/trailing whitespace.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TypeError::InvalidTag("tag cannot be empty".into()));
        }
        if tag.trim() != tag {
            return Err(TypeError::InvalidTag(
                "tag cannot have leading or trailing whitespace".into(),
            ));
        }
        if tag.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidTag(
                "tag cannot contain control characters".into(),
            ));
        }
        Ok(Self(tag))
    }

    /// Get the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated environment name (e.g. "dev", "staging", "prod").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvName(String);

impl EnvName {
    /// Create a new validated environment name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidEnvName` if the name is blank or contains
    /// control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidEnvName(
                "environment name cannot be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidEnvName(
                "environment name cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EnvName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvName> for String {
    fn from(name: EnvName) -> Self {
        name.0
    }
}

impl std::fmt::Display for EnvName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for EnvName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EnvName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Credentials for the backing repository.
///
/// Never persisted and never logged: the `Debug` implementation redacts
/// the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// The account username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The access token. Callers must not log or display this value.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
