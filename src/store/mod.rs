//! store
//!
//! Access to the repository that records environment tags.
//!
//! # Architecture
//!
//! The [`TagStore`] trait defines the two primitives the propagation engine
//! needs: read a tag with the revision it came from, and publish a new tag
//! conditional on that revision. Implementations:
//!
//! - [`GitTagStore`] - remote git repository via libgit2
//! - [`mock::MockTagStore`] - in-memory store for deterministic tests
//!
//! [`document`] holds the YAML codec shared by implementations.

pub mod document;
pub mod git;
pub mod mock;
mod traits;

pub use git::{GitStoreOptions, GitTagStore};
pub use traits::{
    PublishOutcome, PublishRequest, Published, Revision, StoreError, TagSnapshot, TagStore,
};
