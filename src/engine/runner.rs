//! engine::runner
//!
//! Runner - the single entry point for push and promote.
//!
//! # Architecture
//!
//! ```text
//! Locate config -> Load -> Require environments -> Resolve names -> Lock -> Propagate
//! ```
//!
//! Requests are plain values built fresh by the front-end for every
//! invocation. The app config is located through one path-producing
//! strategy ([`AppSource`]) so explicit paths and registered names share
//! the same loading and validation.
//!
//! # Invariants
//!
//! - No remote call happens until every local precondition holds
//! - The publish lock is held only around the propagation step

use std::path::PathBuf;

use super::propagate::{PropagationEngine, PublishReceipt};
use super::PropagateError;
use crate::core::app::{self, LodestarAppConfig};
use crate::core::config::DEFAULT_MAX_ATTEMPTS;
use crate::core::ops::PublishLock;
use crate::core::paths::LodestarPaths;
use crate::core::registry::{Registry, RegistryKind};
use crate::core::resolve::{find_env, find_env_pair, require_environments};
use crate::core::types::{Credentials, EnvName, Tag};
use crate::store::TagStore;

/// Where an app config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSource {
    /// An explicit config file path.
    ConfigPath(PathBuf),
    /// A name registered under `<home>/app/`.
    Registered(String),
}

impl AppSource {
    /// Build from the `--name` / `--config-path` flag pair.
    ///
    /// # Errors
    ///
    /// - [`PropagateError::AmbiguousTarget`] unless exactly one is given
    pub fn from_flags(
        name: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, PropagateError> {
        match (name, config_path) {
            (Some(name), None) => Ok(AppSource::Registered(name)),
            (None, Some(path)) => Ok(AppSource::ConfigPath(path)),
            (None, None) => Err(PropagateError::AmbiguousTarget(
                "one of --name or --config-path is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(PropagateError::AmbiguousTarget(
                "--name and --config-path cannot be used together".to_string(),
            )),
        }
    }

    /// Produce the config file path.
    pub fn locate(&self, registry: &Registry) -> Result<PathBuf, PropagateError> {
        match self {
            AppSource::ConfigPath(path) => Ok(path.clone()),
            AppSource::Registered(name) => Ok(registry.resolve(RegistryKind::App.as_str(), name)?),
        }
    }
}

/// Locate, load, and check that the app defines at least one environment.
///
/// # Errors
///
/// - [`PropagateError::Registry`] if a registered name cannot be resolved
/// - [`PropagateError::Load`] if the config cannot be read or parsed
/// - [`PropagateError::Resolve`] with `EmptyEnvironmentGraph`
pub fn load_app(
    source: &AppSource,
    registry: &Registry,
) -> Result<LodestarAppConfig, PropagateError> {
    let path = source.locate(registry)?;
    let config = app::load(&path)?;
    require_environments(&config)?;
    Ok(config)
}

/// Input for a push.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub source: AppSource,
    pub environment: String,
    pub tag: Tag,
    pub credentials: Credentials,
}

/// Input for a promote.
#[derive(Debug, Clone)]
pub struct PromoteRequest {
    pub source: AppSource,
    pub src_env: String,
    pub dest_env: String,
    pub credentials: Credentials,
}

/// Outcome of a push or promote, for presentation.
#[derive(Debug, Clone)]
pub struct Report {
    /// App name from the config
    pub app: String,
    /// Environment that was written
    pub environment: EnvName,
    /// Environment the tag was copied from (promote only)
    pub source_environment: Option<EnvName>,
    pub receipt: PublishReceipt,
}

/// Runs push and promote requests against a tag store.
pub struct Runner<'a, S: TagStore + ?Sized> {
    store: &'a S,
    paths: &'a LodestarPaths,
    registry: Registry,
    max_attempts: u32,
}

impl<'a, S: TagStore + ?Sized> Runner<'a, S> {
    pub fn new(store: &'a S, paths: &'a LodestarPaths) -> Self {
        Self {
            store,
            paths,
            registry: Registry::new(paths.clone()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the publish attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Record a tag in one environment.
    pub fn push(&self, request: PushRequest) -> Result<Report, PropagateError> {
        let config = load_app(&request.source, &self.registry)?;
        let env = find_env(&config, &request.environment)?;
        let repo_url = config.app_info.repo_url.as_str();

        tracing::debug!(
            app = %config.app_info.name,
            env = %env.name,
            path = %env.src_path,
            "resolved push target"
        );

        let _lock = PublishLock::acquire(self.paths, repo_url)?;
        let receipt = self
            .engine()
            .push(&request.credentials, repo_url, &env.src_path, &request.tag)?;

        Ok(Report {
            app: config.app_info.name.clone(),
            environment: env.name.clone(),
            source_environment: None,
            receipt,
        })
    }

    /// Copy the tag from one environment to another.
    ///
    /// # Errors
    ///
    /// - [`PropagateError::SameEnvironment`] if source and destination
    ///   resolve to the same environment
    pub fn promote(&self, request: PromoteRequest) -> Result<Report, PropagateError> {
        let config = load_app(&request.source, &self.registry)?;
        let (src, dest) = find_env_pair(&config, &request.src_env, &request.dest_env)?;

        if src.name == dest.name {
            return Err(PropagateError::SameEnvironment {
                name: src.name.to_string(),
            });
        }

        let repo_url = config.app_info.repo_url.as_str();
        tracing::debug!(
            app = %config.app_info.name,
            src = %src.name,
            dest = %dest.name,
            "resolved promote targets"
        );

        let _lock = PublishLock::acquire(self.paths, repo_url)?;
        let receipt = self.engine().promote(
            &request.credentials,
            repo_url,
            &src.src_path,
            &dest.src_path,
        )?;

        Ok(Report {
            app: config.app_info.name.clone(),
            environment: dest.name.clone(),
            source_environment: Some(src.name.clone()),
            receipt,
        })
    }

    fn engine(&self) -> PropagationEngine<'a, S> {
        PropagationEngine::new(self.store).with_max_attempts(self.max_attempts)
    }
}
