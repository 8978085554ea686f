//! promote command - Copy a tag from one environment to another

use anyhow::{Context as _, Result};

use super::{load_settings, print_report, verbosity};
use crate::cli::args::PromoteArgs;
use crate::engine::{AppSource, Context, PromoteRequest, Runner};
use crate::store::{GitStoreOptions, GitTagStore};

/// Promote the source environment's tag to the destination.
pub fn promote(ctx: &Context, args: PromoteArgs) -> Result<()> {
    let (paths, settings) = load_settings(ctx)?;

    let source = AppSource::from_flags(args.target.name, args.target.config_path)?;
    let context = format!("failed to promote {} to {}", args.src_env, args.dest_env);

    let store = GitTagStore::new(GitStoreOptions::from_config(&settings));
    let report = Runner::new(&store, &paths)
        .with_max_attempts(settings.max_attempts())
        .promote(PromoteRequest {
            source,
            src_env: args.src_env,
            dest_env: args.dest_env,
            credentials: args.credentials.into(),
        })
        .context(context)?;

    print_report(&report, verbosity(ctx));
    Ok(())
}
