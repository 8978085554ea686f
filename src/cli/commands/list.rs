//! list command - List registered apps

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::{home_paths, verbosity};
use crate::core::app;
use crate::core::registry::{Registry, RegistryKind};
use crate::engine::Context;
use crate::ui::output;

/// One registered app, as listed.
#[derive(Debug, Serialize)]
struct AppSummary {
    name: String,
    repo_url: String,
    environments: Vec<String>,
}

/// List all registered apps.
///
/// Apps whose config cannot be loaded are reported as warnings and skipped.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let verbosity = verbosity(ctx);
    let paths = home_paths(ctx)?;
    let registry = Registry::new(paths.clone());

    let names = registry
        .list(RegistryKind::App)
        .context("failed to list registered apps")?;

    let mut apps = Vec::with_capacity(names.len());
    for name in names {
        match summarize(&registry, &name) {
            Ok(summary) => apps.push(summary),
            Err(e) => output::warn(format!("skipping app '{}': {:#}", name, e), verbosity),
        }
    }

    if json {
        output::data(serde_json::to_string_pretty(&apps)?);
        return Ok(());
    }

    if apps.is_empty() {
        output::print(
            format!("No apps registered in {}", paths.app_dir().display()),
            verbosity,
        );
        return Ok(());
    }

    let rows: Vec<Vec<String>> = apps
        .into_iter()
        .map(|a| vec![a.name, a.repo_url, a.environments.join(",")])
        .collect();
    output::data(output::format_columns(&rows));
    Ok(())
}

fn summarize(registry: &Registry, name: &str) -> Result<AppSummary> {
    let path = registry.resolve(RegistryKind::App.as_str(), name)?;
    load_summary(name, &path)
}

fn load_summary(name: &str, path: &Path) -> Result<AppSummary> {
    let config = app::load(path)?;
    Ok(AppSummary {
        name: name.to_string(),
        repo_url: config.app_info.repo_url.clone(),
        environments: config.env_names().into_iter().map(String::from).collect(),
    })
}
