//! core::resolve
//!
//! Environment lookup within an app's environment graph.
//!
//! # Design
//!
//! Single- and dual-name lookups share one scanner: a single ordered pass
//! over the graph that fills one slot per requested name and stops as soon
//! as every slot is filled. First match wins for each slot; loading already
//! rejects duplicate names, so for loaded configs "first" is "only".
//!
//! When both names of a pair are equal, both slots resolve to the same
//! record. Whether that is meaningful is the caller's decision (promote
//! rejects it).

use thiserror::Error;

use super::app::{EnvironmentRecord, LodestarAppConfig};

/// Errors from environment resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The app defines no environments.
    #[error("no environments are provided for {app}")]
    EmptyEnvironmentGraph { app: String },

    /// No environment with the given name exists.
    #[error("environment '{name}' not found in {app} (available: {available})")]
    EnvironmentNotFound {
        name: String,
        app: String,
        available: String,
    },
}

impl ResolveError {
    /// The missing environment name, if this is a not-found error.
    pub fn missing_name(&self) -> Option<&str> {
        match self {
            ResolveError::EnvironmentNotFound { name, .. } => Some(name),
            ResolveError::EmptyEnvironmentGraph { .. } => None,
        }
    }
}

/// Fail with `EmptyEnvironmentGraph` when the app has no environments.
pub fn require_environments(config: &LodestarAppConfig) -> Result<(), ResolveError> {
    if config.env_graph.is_empty() {
        return Err(ResolveError::EmptyEnvironmentGraph {
            app: config.app_info.name.clone(),
        });
    }
    Ok(())
}

/// Find the environment named `name`.
///
/// # Errors
///
/// - [`ResolveError::EnvironmentNotFound`] if no environment matches
pub fn find_env<'a>(
    config: &'a LodestarAppConfig,
    name: &str,
) -> Result<&'a EnvironmentRecord, ResolveError> {
    let [slot] = scan(config, [name]);
    slot.ok_or_else(|| not_found(config, name))
}

/// Find the source and destination environments in a single pass.
///
/// # Errors
///
/// - [`ResolveError::EnvironmentNotFound`] naming the source if it is
///   missing, otherwise naming the destination
pub fn find_env_pair<'a>(
    config: &'a LodestarAppConfig,
    src: &str,
    dest: &str,
) -> Result<(&'a EnvironmentRecord, &'a EnvironmentRecord), ResolveError> {
    match scan(config, [src, dest]) {
        [Some(s), Some(d)] => Ok((s, d)),
        [None, _] => Err(not_found(config, src)),
        [_, None] => Err(not_found(config, dest)),
    }
}

/// Scan the graph once, filling one slot per requested name.
fn scan<'a, const N: usize>(
    config: &'a LodestarAppConfig,
    names: [&str; N],
) -> [Option<&'a EnvironmentRecord>; N] {
    let mut slots: [Option<&'a EnvironmentRecord>; N] = [None; N];

    for env in &config.env_graph {
        for (slot, name) in slots.iter_mut().zip(names.iter()) {
            if slot.is_none() && env.name == *name {
                *slot = Some(env);
            }
        }
        if slots.iter().all(Option::is_some) {
            break;
        }
    }

    slots
}

fn not_found(config: &LodestarAppConfig, name: &str) -> ResolveError {
    ResolveError::EnvironmentNotFound {
        name: name.to_string(),
        app: config.app_info.name.clone(),
        available: config.env_names().join(", "),
    }
}
