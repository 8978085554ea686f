//! cli
//!
//! Command-line interface layer for Lodestar.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT talk to the backing repository directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Each invocation builds its own request
//! values from the parsed arguments; nothing is shared between commands.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Run a parsed command line.
///
/// This is the main entry point called from `main.rs`, after logging has
/// been configured from the same flags.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = engine::Context {
        debug: cli.debug,
        quiet: cli.quiet,
        home: cli.home.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
