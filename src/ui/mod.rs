//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so that quiet mode
//! and stream selection (stdout for results, stderr for diagnostics) are
//! handled in one place.

pub mod output;
