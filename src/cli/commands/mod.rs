//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Converts its argument struct into an engine request
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT talk to the backing repository directly. `list` and
//! `show` are read-only and never reach the engine.

mod completion;
mod list;
mod promote;
mod push;
mod show;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use list::list;
pub use promote::promote;
pub use push::push;
pub use show::show;

use anyhow::{Context as _, Result};

use crate::cli::args::{AppAction, Command, CredentialArgs};
use crate::core::config::Config;
use crate::core::paths::LodestarPaths;
use crate::core::types::Credentials;
use crate::engine::{Context, Report};
use crate::store::PublishOutcome;
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::App { action } => match action {
            AppAction::Push(args) => push::push(ctx, args),
            AppAction::Promote(args) => promote::promote(ctx, args),
            AppAction::List { json } => list::list(ctx, json),
            AppAction::Show { name } => show::show(ctx, &name),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Resolve the local state directory.
fn home_paths(ctx: &Context) -> Result<LodestarPaths> {
    LodestarPaths::resolve(ctx.home.as_deref())
        .context("cannot determine home directory; pass --home or set LODESTAR_HOME")
}

/// Resolve the state directory and load settings.
fn load_settings(ctx: &Context) -> Result<(LodestarPaths, Config)> {
    let paths = home_paths(ctx)?;
    let config = Config::load(&paths).context("failed to load settings")?;
    match config.loaded_from() {
        Some(path) => tracing::debug!(path = %path.display(), "loaded settings"),
        None => tracing::debug!("no settings file; using defaults"),
    }
    Ok((paths, config))
}

fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Credentials::new(args.username, args.token)
    }
}

/// Describe a completed push or promote.
fn describe(report: &Report) -> String {
    let receipt = &report.receipt;

    let mut line = match (receipt.outcome, &report.source_environment) {
        (PublishOutcome::Unchanged, _) => format!(
            "{} already records {} ({}); nothing to publish",
            report.environment, receipt.tag, receipt.path
        ),
        (PublishOutcome::Published, Some(src)) => format!(
            "Promoted {} from {} to {} ({}) at {}",
            receipt.tag,
            src,
            report.environment,
            receipt.path,
            receipt.revision.short(7)
        ),
        (PublishOutcome::Published, None) => format!(
            "Pushed {} to {} ({}) at {}",
            receipt.tag,
            report.environment,
            receipt.path,
            receipt.revision.short(7)
        ),
    };

    if receipt.attempts > 1 {
        line.push_str(&format!(" after {} attempts", receipt.attempts));
    }
    line
}

fn print_report(report: &Report, verbosity: Verbosity) {
    tracing::debug!(
        app = %report.app,
        published_at = %report.receipt.published_at.to_rfc3339(),
        "operation finished"
    );
    output::success(describe(report), verbosity);
}
