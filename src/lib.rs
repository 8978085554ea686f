//! Lodestar - Help guide your applications through their environments
//!
//! Lodestar moves a deployable artifact's version tag through an ordered
//! set of environments (dev, staging, prod, ...), where each environment's
//! desired tag is recorded in a YAML document inside a git repository that
//! deployment tooling reads from.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Locate → Load → Resolve → Lock → Propagate
//! - [`core`] - Domain types, app config schema, environment resolution, settings
//! - [`store`] - Access to the backing repository (git, mock)
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! Lodestar maintains the following invariants:
//!
//! 1. No remote change is attempted until every local precondition holds
//! 2. A tag change is published atomically or not at all
//! 3. A publish never overwrites a change it did not observe
//! 4. Credentials are never persisted or logged

pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
pub mod ui;
