//! store::traits
//!
//! Tag store trait definition.
//!
//! # Design
//!
//! A tag store gives read/write access to the tag recorded in a document
//! inside a version-controlled repository. It exposes exactly two
//! primitives:
//!
//! - `read_tag` returns the tag at a path together with the [`Revision`]
//!   of the snapshot it was read from.
//! - `write_tag_and_publish` replaces the tag and publishes the change as
//!   one atomic unit, **conditional on the expected revision**: if the
//!   repository moved since that revision was observed, it fails with
//!   [`StoreError::PublishConflict`] and publishes nothing.
//!
//! Either the new tag is durably recorded and visible to readers, or no
//! change is visible at all.
//!
//! # Security
//!
//! Implementations must never log, print, or include credentials in error
//! messages.

use thiserror::Error;

use crate::core::types::{Credentials, Tag};

/// Errors from tag store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The repository rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network or transport failure.
    #[error("repository unreachable: {0}")]
    RepositoryUnreachable(String),

    /// The branch to publish to does not exist.
    #[error("branch '{0}' not found in repository")]
    BranchNotFound(String),

    /// The document does not exist in the repository.
    #[error("path '{path}' not found in repository")]
    PathNotFound { path: String },

    /// The document exists but its tag cannot be read or written.
    #[error("cannot use tag document '{path}': {message}")]
    MalformedDocument { path: String, message: String },

    /// The repository changed since the expected revision was observed.
    #[error("publish conflict: expected revision {expected}, found {actual}")]
    PublishConflict { expected: String, actual: String },

    /// Internal store error.
    #[error("repository error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Check if this is a conflict that a fresh read may resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::PublishConflict { .. })
    }
}

/// Identifier of a repository snapshot (a commit id for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Wrap a store-specific revision identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the revision as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display.
    pub fn short(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The tag at a path, as observed at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSnapshot {
    /// Document path inside the repository
    pub path: String,
    /// Recorded tag; `None` when the document holds no tag
    pub tag: Option<Tag>,
    /// Revision the snapshot was read from
    pub revision: Revision,
}

/// Request to replace the tag at a path.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    /// Document path inside the repository
    pub path: &'a str,
    /// Tag to record
    pub tag: &'a Tag,
    /// Revision the caller based its decision on
    pub expected: &'a Revision,
    /// Change description (commit message)
    pub message: &'a str,
}

/// Whether a publish changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new revision carrying the tag was published
    Published,
    /// The document already held the tag; nothing was published
    Unchanged,
}

impl std::fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishOutcome::Published => write!(f, "published"),
            PublishOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Result of a successful `write_tag_and_publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Revision now holding the tag
    pub revision: Revision,
    /// Whether a new revision was created
    pub outcome: PublishOutcome,
}

/// The tag store trait.
///
/// # Error Handling
///
/// Callers should handle:
/// - `PublishConflict`: re-read and retry (bounded)
/// - everything else: terminal, surface unchanged
pub trait TagStore {
    /// Get the store name (e.g. "git", "mock").
    fn name(&self) -> &'static str;

    /// Read the tag recorded at `path`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PathNotFound`] if the document does not exist
    /// - [`StoreError::AuthenticationFailed`] / [`StoreError::RepositoryUnreachable`]
    fn read_tag(
        &self,
        creds: &Credentials,
        repo_url: &str,
        path: &str,
    ) -> Result<TagSnapshot, StoreError>;

    /// Replace the tag at `request.path` and publish atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PublishConflict`] if the repository moved past
    ///   `request.expected` or the publish was rejected as non-fast-forward
    /// - [`StoreError::PathNotFound`] if the document does not exist
    /// - [`StoreError::AuthenticationFailed`] / [`StoreError::RepositoryUnreachable`]
    fn write_tag_and_publish(
        &self,
        creds: &Credentials,
        repo_url: &str,
        request: &PublishRequest<'_>,
    ) -> Result<Published, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_short() {
        let rev = Revision::new("3f9c2e1ab77");
        assert_eq!(rev.short(7), "3f9c2e1");
        assert_eq!(Revision::new("abc").short(7), "abc");
    }

    #[test]
    fn conflict_detection() {
        let conflict = StoreError::PublishConflict {
            expected: "a".into(),
            actual: "b".into(),
        };
        assert!(conflict.is_conflict());
        assert!(!StoreError::RepositoryUnreachable("timeout".into()).is_conflict());
    }

    #[test]
    fn error_display() {
        let err = StoreError::PathNotFound {
            path: "envs/dev.yaml".into(),
        };
        assert_eq!(
            err.to_string(),
            "path 'envs/dev.yaml' not found in repository"
        );
    }
}
