//! show command - Print a registered app's configuration file

use std::fs;

use anyhow::{Context as _, Result};

use super::home_paths;
use crate::core::registry::{Registry, RegistryKind};
use crate::engine::Context;
use crate::ui::output;

/// Print the configuration document of the app registered as `name`.
pub fn show(ctx: &Context, name: &str) -> Result<()> {
    let paths = home_paths(ctx)?;
    let registry = Registry::new(paths);

    let path = registry.resolve(RegistryKind::App.as_str(), name)?;
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;

    output::data(contents.trim_end());
    Ok(())
}
