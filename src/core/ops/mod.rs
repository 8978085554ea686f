//! core::ops
//!
//! Local coordination for publish operations.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive per-repository publish lock

pub mod lock;

pub use lock::{LockError, PublishLock};
