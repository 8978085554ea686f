//! engine
//!
//! Orchestrates push and promote: Locate -> Load -> Resolve -> Lock -> Propagate.
//!
//! # Architecture
//!
//! - [`runner`] turns a validated per-invocation request into engine calls.
//!   It locates and loads the app config, resolves environment names to
//!   document paths, and holds the publish lock for the repository.
//! - [`propagate`] owns the read/write/publish protocol against a
//!   [`TagStore`](crate::store::TagStore), including the bounded retry on
//!   publish conflicts.
//!
//! # Invariants
//!
//! - Every precondition (config, graph, names, src != dest) is checked
//!   before the first remote call
//! - Errors are propagated unmodified; only `PublishConflict` is retried
//! - A failed publish never leaves a half-written change visible
//!
//! # Example
//!
//! ```ignore
//! use lodestar::engine::{AppSource, PushRequest, Runner};
//!
//! let runner = Runner::new(&store, &paths).with_max_attempts(3);
//! let report = runner.push(PushRequest {
//!     source: AppSource::Registered("api".into()),
//!     environment: "dev".into(),
//!     tag: Tag::new("v2")?,
//!     credentials,
//! })?;
//! ```

pub mod propagate;
pub mod runner;

pub use propagate::{PropagationEngine, PublishReceipt};
pub use runner::{load_app, AppSource, PromoteRequest, PushRequest, Report, Runner};

use std::path::PathBuf;

use thiserror::Error;

use crate::core::app::LoadError;
use crate::core::ops::LockError;
use crate::core::registry::RegistryError;
use crate::core::resolve::ResolveError;
use crate::store::StoreError;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// State directory override.
    pub home: Option<PathBuf>,
}

/// Errors from push and promote.
#[derive(Debug, Error)]
pub enum PropagateError {
    /// The target app was not identified unambiguously.
    #[error("ambiguous target: {0}")]
    AmbiguousTarget(String),

    /// The app config could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The app name could not be resolved to a config file.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An environment name could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Promote named the same environment as source and destination.
    #[error("cannot promote environment '{name}' to itself")]
    SameEnvironment { name: String },

    /// The source document does not exist in the repository.
    #[error("source '{path}' not found in repository")]
    SourceNotFound { path: String },

    /// The source document holds no tag.
    #[error("source '{path}' holds no tag to promote")]
    SourceTagEmpty { path: String },

    /// The backing repository reported a failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The local publish lock could not be taken.
    #[error(transparent)]
    Lock(#[from] LockError),
}
