//! core
//!
//! Core domain types, schemas, and lookups for Lodestar.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Tag, EnvName, Credentials
//! - [`app`] - App configuration schema and loading
//! - [`resolve`] - Environment lookup within an environment graph
//! - [`registry`] - Name-to-path registry of known apps
//! - [`config`] - Global settings schema and loading
//! - [`paths`] - Centralized path routing for local state
//! - [`ops`] - Publish locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Schemas are strict and self-describing
//! - Nothing in `core` talks to the backing repository

pub mod app;
pub mod config;
pub mod ops;
pub mod paths;
pub mod registry;
pub mod resolve;
pub mod types;
