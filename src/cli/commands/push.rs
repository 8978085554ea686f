//! push command - Record a new tag in one environment

use anyhow::{Context as _, Result};

use super::{load_settings, print_report, verbosity};
use crate::cli::args::PushArgs;
use crate::core::types::Tag;
use crate::engine::{AppSource, Context, PushRequest, Runner};
use crate::store::{GitStoreOptions, GitTagStore};

/// Push a tag to an app environment.
pub fn push(ctx: &Context, args: PushArgs) -> Result<()> {
    let (paths, settings) = load_settings(ctx)?;

    let tag = Tag::new(args.tag).context("invalid --tag")?;
    let environment = args.environment;
    let source = AppSource::from_flags(args.target.name, args.target.config_path)?;

    let store = GitTagStore::new(GitStoreOptions::from_config(&settings));
    let report = Runner::new(&store, &paths)
        .with_max_attempts(settings.max_attempts())
        .push(PushRequest {
            source,
            environment: environment.clone(),
            tag: tag.clone(),
            credentials: args.credentials.into(),
        })
        .with_context(|| format!("failed to push {} to {}", tag, environment))?;

    print_report(&report, verbosity(ctx));
    Ok(())
}
