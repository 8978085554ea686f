//! engine::propagate
//!
//! The tag propagation engine: `push` and `promote`.
//!
//! # Protocol
//!
//! Both operations follow the same shape:
//!
//! ```text
//! Read (snapshot + revision) -> Write conditional on revision -> Publish
//!            ^                                                     |
//!            +------------- PublishConflict (bounded) -------------+
//! ```
//!
//! Every attempt starts from a fresh read, so a retry never republishes a
//! decision made against a stale snapshot. Only `PublishConflict` is
//! retried; every other store error is surfaced on first occurrence.
//!
//! `promote` reads the source tag and publishes the destination
//! conditional on the revision the source was read from, so the tag copied
//! is the one recorded at the moment of publishing.

use chrono::{DateTime, Utc};

use super::PropagateError;
use crate::core::config::DEFAULT_MAX_ATTEMPTS;
use crate::core::types::{Credentials, Tag};
use crate::store::{PublishOutcome, PublishRequest, Revision, StoreError, TagStore};

/// Record of a completed push or promote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Document path that was written
    pub path: String,
    /// Tag now recorded at `path`
    pub tag: Tag,
    /// Revision holding the tag
    pub revision: Revision,
    /// Whether a new revision was published
    pub outcome: PublishOutcome,
    /// Number of publish attempts made (1 when no conflict occurred)
    pub attempts: u32,
    /// When the operation completed
    pub published_at: DateTime<Utc>,
}

/// Applies push and promote mutations against a tag store.
pub struct PropagationEngine<'a, S: TagStore + ?Sized> {
    store: &'a S,
    max_attempts: u32,
}

impl<'a, S: TagStore + ?Sized> PropagationEngine<'a, S> {
    /// Create an engine with the default attempt budget.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the maximum number of publish attempts (at least 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Record `tag` at `env_path`.
    ///
    /// # Errors
    ///
    /// - [`PropagateError::Store`] with the store's error, including
    ///   `PublishConflict` once the attempt budget is exhausted
    pub fn push(
        &self,
        creds: &Credentials,
        repo_url: &str,
        env_path: &str,
        tag: &Tag,
    ) -> Result<PublishReceipt, PropagateError> {
        tracing::info!(store = self.store.name(), path = env_path, tag = %tag, "push");

        self.publish_with_retry(creds, repo_url, env_path, || {
            let snapshot = self.store.read_tag(creds, repo_url, env_path)?;
            tracing::debug!(
                path = env_path,
                current = snapshot.tag.as_ref().map(Tag::as_str),
                revision = snapshot.revision.short(12),
                "read destination"
            );
            let message = format!("lodestar: push {} to {}", tag, env_path);
            Ok((tag.clone(), snapshot.revision, message))
        })
    }

    /// Copy the tag recorded at `src_path` to `dest_path`.
    ///
    /// The source document is never modified.
    ///
    /// # Errors
    ///
    /// - [`PropagateError::SourceNotFound`] if `src_path` does not exist
    /// - [`PropagateError::SourceTagEmpty`] if `src_path` holds no tag
    /// - [`PropagateError::Store`] for every other store failure
    pub fn promote(
        &self,
        creds: &Credentials,
        repo_url: &str,
        src_path: &str,
        dest_path: &str,
    ) -> Result<PublishReceipt, PropagateError> {
        tracing::info!(store = self.store.name(), src = src_path, dest = dest_path, "promote");

        self.publish_with_retry(creds, repo_url, dest_path, || {
            let snapshot = match self.store.read_tag(creds, repo_url, src_path) {
                Ok(snapshot) => snapshot,
                Err(StoreError::PathNotFound { .. }) => {
                    return Err(PropagateError::SourceNotFound {
                        path: src_path.to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            };

            let tag = snapshot.tag.ok_or_else(|| PropagateError::SourceTagEmpty {
                path: src_path.to_string(),
            })?;
            tracing::debug!(
                path = src_path,
                tag = %tag,
                revision = snapshot.revision.short(12),
                "read source"
            );

            let message = format!("lodestar: promote {} from {} to {}", tag, src_path, dest_path);
            Ok((tag, snapshot.revision, message))
        })
    }

    /// Run `prepare` then publish, retrying the pair on conflict.
    ///
    /// `prepare` yields the tag to write, the revision it was decided
    /// against, and the change description.
    fn publish_with_retry<F>(
        &self,
        creds: &Credentials,
        repo_url: &str,
        path: &str,
        mut prepare: F,
    ) -> Result<PublishReceipt, PropagateError>
    where
        F: FnMut() -> Result<(Tag, Revision, String), PropagateError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (tag, expected, message) = prepare()?;

            let request = PublishRequest {
                path,
                tag: &tag,
                expected: &expected,
                message: &message,
            };

            match self.store.write_tag_and_publish(creds, repo_url, &request) {
                Ok(published) => {
                    tracing::info!(
                        path,
                        tag = %tag,
                        revision = published.revision.short(12),
                        outcome = %published.outcome,
                        attempts = attempt,
                        "publish complete"
                    );
                    return Ok(PublishReceipt {
                        path: path.to_string(),
                        tag,
                        revision: published.revision,
                        outcome: published.outcome,
                        attempts: attempt,
                        published_at: Utc::now(),
                    });
                }
                Err(e) if e.is_conflict() && attempt < self.max_attempts => {
                    tracing::warn!(
                        path,
                        attempt,
                        max_attempts = self.max_attempts,
                        "publish conflict, re-reading"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
