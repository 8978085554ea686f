//! store::mock
//!
//! Mock tag store implementation for deterministic testing.
//!
//! # Design
//!
//! The mock store keeps documents in memory as `path -> tag` and a single
//! monotonically increasing revision for the whole repository. Every
//! successful publish bumps the revision, so `write_tag_and_publish`
//! enforces the same compare-and-swap contract as the git store.
//!
//! Tests can configure:
//! - a failure for one primitive ([`FailOn`])
//! - concurrent writers that land between a read and the next publish
//!   ([`MockTagStore::with_concurrent_writes`])
//!
//! # Example
//!
//! ```
//! use lodestar::core::types::{Credentials, Tag};
//! use lodestar::store::mock::MockTagStore;
//! use lodestar::store::{PublishRequest, TagStore};
//!
//! let store = MockTagStore::new().with_file("envs/dev.yaml", Some("v1"));
//! let creds = Credentials::new("ci", "token");
//!
//! let snapshot = store.read_tag(&creds, "mock://repo", "envs/dev.yaml").unwrap();
//! assert_eq!(snapshot.tag.as_ref().map(Tag::as_str), Some("v1"));
//!
//! let tag = Tag::new("v2").unwrap();
//! store.write_tag_and_publish(&creds, "mock://repo", &PublishRequest {
//!     path: "envs/dev.yaml",
//!     tag: &tag,
//!     expected: &snapshot.revision,
//!     message: "push v2",
//! }).unwrap();
//!
//! assert_eq!(store.tag_at("envs/dev.yaml").as_deref(), Some("v2"));
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{
    PublishOutcome, PublishRequest, Published, Revision, StoreError, TagSnapshot, TagStore,
};
use crate::core::types::{Credentials, Tag};

/// Mock tag store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockTagStore {
    inner: Arc<Mutex<MockTagStoreInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockTagStoreInner {
    /// Documents by path; `None` means the document holds no tag.
    files: BTreeMap<String, Option<String>>,
    /// Current repository revision.
    revision: u64,
    /// Operation to fail on.
    fail_on: Option<FailOn>,
    /// Concurrent writes still to inject before publishes.
    pending_interference: u32,
    /// What an injected concurrent writer records, if anything.
    interloper: Option<(String, String)>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail every read_tag with the given error.
    ReadTag(StoreError),
    /// Fail read_tag for one path with the given error.
    ReadTagAt(String, StoreError),
    /// Fail every write_tag_and_publish with the given error.
    WriteTag(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ReadTag {
        repo_url: String,
        path: String,
    },
    WriteTag {
        repo_url: String,
        path: String,
        tag: String,
        expected: String,
        message: String,
    },
}

impl MockTagStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTagStoreInner {
                files: BTreeMap::new(),
                revision: 1,
                fail_on: None,
                pending_interference: 0,
                interloper: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Add a document, optionally holding a tag.
    pub fn with_file(self, path: &str, tag: Option<&str>) -> Self {
        self.lock()
            .files
            .insert(path.to_string(), tag.map(String::from));
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Inject `count` concurrent writes.
    ///
    /// Each of the next `count` publish attempts is preceded by another
    /// writer's commit: the repository revision advances, and if
    /// `interloper` is given that writer records `(path, tag)`.
    pub fn with_concurrent_writes(self, count: u32, interloper: Option<(&str, &str)>) -> Self {
        {
            let mut inner = self.lock();
            inner.pending_interference = count;
            inner.interloper = interloper.map(|(p, t)| (p.to_string(), t.to_string()));
        }
        self
    }

    /// Current tag at `path` (for test verification).
    pub fn tag_at(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).cloned().flatten()
    }

    /// Current repository revision.
    pub fn revision(&self) -> Revision {
        revision_of(self.lock().revision)
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Number of publish attempts recorded.
    pub fn write_count(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::WriteTag { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockTagStoreInner> {
        // A panic while holding the lock only happens inside a failing test.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MockTagStore {
    fn default() -> Self {
        Self::new()
    }
}

fn revision_of(n: u64) -> Revision {
    Revision::new(format!("rev-{}", n))
}

impl TagStore for MockTagStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn read_tag(
        &self,
        _creds: &Credentials,
        repo_url: &str,
        path: &str,
    ) -> Result<TagSnapshot, StoreError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::ReadTag {
            repo_url: repo_url.to_string(),
            path: path.to_string(),
        });

        match &inner.fail_on {
            Some(FailOn::ReadTag(e)) => return Err(e.clone()),
            Some(FailOn::ReadTagAt(p, e)) if p == path => return Err(e.clone()),
            _ => {}
        }

        let raw = inner
            .files
            .get(path)
            .ok_or_else(|| StoreError::PathNotFound {
                path: path.to_string(),
            })?
            .clone();

        let tag = raw
            .filter(|t| !t.is_empty())
            .map(Tag::new)
            .transpose()
            .map_err(|e| StoreError::MalformedDocument {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Ok(TagSnapshot {
            path: path.to_string(),
            tag,
            revision: revision_of(inner.revision),
        })
    }

    fn write_tag_and_publish(
        &self,
        _creds: &Credentials,
        repo_url: &str,
        request: &PublishRequest<'_>,
    ) -> Result<Published, StoreError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::WriteTag {
            repo_url: repo_url.to_string(),
            path: request.path.to_string(),
            tag: request.tag.to_string(),
            expected: request.expected.to_string(),
            message: request.message.to_string(),
        });

        if let Some(FailOn::WriteTag(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        if inner.pending_interference > 0 {
            inner.pending_interference -= 1;
            inner.revision += 1;
            if let Some((path, tag)) = inner.interloper.clone() {
                inner.files.insert(path, Some(tag));
            }
        }

        let current = revision_of(inner.revision);
        if &current != request.expected {
            return Err(StoreError::PublishConflict {
                expected: request.expected.to_string(),
                actual: current.to_string(),
            });
        }

        let slot = inner
            .files
            .get_mut(request.path)
            .ok_or_else(|| StoreError::PathNotFound {
                path: request.path.to_string(),
            })?;

        if slot.as_deref() == Some(request.tag.as_str()) {
            return Ok(Published {
                revision: current,
                outcome: PublishOutcome::Unchanged,
            });
        }

        *slot = Some(request.tag.to_string());
        inner.revision += 1;

        Ok(Published {
            revision: revision_of(inner.revision),
            outcome: PublishOutcome::Published,
        })
    }
}
