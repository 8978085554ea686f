//! store::git
//!
//! Tag store backed by a remote git repository, using git2.
//!
//! # Architecture
//!
//! This module is the **only** place that imports `git2`. Each backing
//! repository is cloned once per invocation into a temporary bare
//! workspace; later operations against the same URL fetch instead of
//! re-cloning.
//!
//! Publishing never touches a working tree:
//!
//! 1. Fetch and compare the branch tip with the expected revision
//! 2. Build the new tree in memory from the tip's tree plus the new blob
//! 3. Commit on top of the tip and push without force
//!
//! A push is only accepted by the remote as a fast-forward of the tip we
//! built on, which gives compare-and-swap semantics on the remote branch.
//! If the push fails for any reason the local branch ref is restored, so
//! nothing half-written survives in the workspace either.
//!
//! # Credentials
//!
//! HTTPS user/token credentials are offered once per network operation.
//! If the remote asks again, the credentials were rejected and the
//! operation fails with [`StoreError::AuthenticationFailed`] rather than
//! looping.

use std::cell::{Cell, RefCell};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use git2::build::RepoBuilder;
use git2::{
    Cred, ErrorClass, ErrorCode, FetchOptions, IndexEntry, IndexTime, PushOptions,
    RemoteCallbacks, Repository, Signature,
};
use tempfile::TempDir;

use super::document;
use super::traits::{
    PublishOutcome, PublishRequest, Published, Revision, StoreError, TagSnapshot, TagStore,
};
use crate::core::config::{Config, DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME, DEFAULT_TAG_KEY};
use crate::core::types::{Credentials, Tag};

/// Remote name inside workspaces.
const REMOTE: &str = "origin";

/// Options controlling how the git store reads and publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStoreOptions {
    /// Branch to publish to; `None` follows the remote's HEAD
    pub branch: Option<String>,
    /// Commit author name
    pub author_name: String,
    /// Commit author email
    pub author_email: String,
    /// Dotted key of the tag inside environment documents
    pub tag_key: String,
}

impl Default for GitStoreOptions {
    fn default() -> Self {
        Self {
            branch: None,
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
            tag_key: DEFAULT_TAG_KEY.to_string(),
        }
    }
}

impl GitStoreOptions {
    /// Build options from loaded settings.
    pub fn from_config(config: &Config) -> Self {
        Self {
            branch: config.branch().map(String::from),
            author_name: config.author_name().to_string(),
            author_email: config.author_email().to_string(),
            tag_key: config.tag_key().to_string(),
        }
    }
}

/// A temporary bare clone of one backing repository.
struct Workspace {
    /// Keeps the clone alive; removed on drop.
    _dir: TempDir,
    repo: Repository,
    branch: String,
}

impl Workspace {
    /// Clone `url` into a fresh temporary directory.
    fn create(creds: &Credentials, url: &str, branch: Option<&str>) -> Result<Self, StoreError> {
        let dir = tempfile::Builder::new()
            .prefix("lodestar-")
            .tempdir()
            .map_err(|e| StoreError::Internal(format!("cannot create workspace: {}", e)))?;

        tracing::debug!(url, workspace = %dir.path().display(), "cloning backing repository");

        let auth_offered = Cell::new(false);
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks(creds, &auth_offered));

        let repo = RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch)
            .clone(url, &dir.path().join("repo.git"))
            .map_err(|e| transport_error(e, auth_offered.get()))?;

        let explicit = branch.is_some();
        let branch = match branch {
            Some(b) => b.to_string(),
            None => default_branch(&repo)?,
        };

        let workspace = Self {
            _dir: dir,
            repo,
            branch,
        };
        // Only the remote's default branch gets a local ref from the clone.
        if explicit {
            workspace.fetch(creds).map_err(|e| match e {
                StoreError::Internal(_) => StoreError::BranchNotFound(workspace.branch.clone()),
                other => other,
            })?;
        }
        workspace.tip_id()?;
        Ok(workspace)
    }

    fn branch_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    /// Bring the workspace's branch up to date with the remote.
    fn fetch(&self, creds: &Credentials) -> Result<(), StoreError> {
        let mut remote = self.repo.find_remote(REMOTE).map_err(internal)?;

        let auth_offered = Cell::new(false);
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks(creds, &auth_offered));

        let refspec = format!("+{0}:{0}", self.branch_ref());
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch), None)
            .map_err(|e| transport_error(e, auth_offered.get()))?;

        tracing::debug!(branch = %self.branch, "fetched backing repository");
        Ok(())
    }

    fn tip_id(&self) -> Result<git2::Oid, StoreError> {
        let reference = self.repo.find_reference(&self.branch_ref()).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                StoreError::BranchNotFound(self.branch.clone())
            } else {
                internal(e)
            }
        })?;
        reference
            .target()
            .ok_or_else(|| StoreError::BranchNotFound(self.branch.clone()))
    }

    /// Read the document at `path` from the tip commit.
    ///
    /// Returns the tip, the document's file mode, and its contents.
    fn read_document(&self, path: &str) -> Result<(git2::Commit<'_>, i32, String), StoreError> {
        let tip = self
            .repo
            .find_commit(self.tip_id()?)
            .map_err(internal)?;
        let tree = tip.tree().map_err(internal)?;

        let entry = tree.get_path(Path::new(path)).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                StoreError::PathNotFound {
                    path: path.to_string(),
                }
            } else {
                internal(e)
            }
        })?;
        let mode = entry.filemode();

        let blob = self.repo.find_blob(entry.id()).map_err(|_| StoreError::MalformedDocument {
            path: path.to_string(),
            message: "not a file".to_string(),
        })?;
        let contents =
            String::from_utf8(blob.content().to_vec()).map_err(|_| StoreError::MalformedDocument {
                path: path.to_string(),
                message: "not valid UTF-8".to_string(),
            })?;

        Ok((tip, mode, contents))
    }

    /// Point the local branch at `oid` unconditionally.
    fn set_branch(&self, oid: git2::Oid, message: &str) -> Result<(), StoreError> {
        self.repo
            .reference(&self.branch_ref(), oid, true, message)
            .map(|_| ())
            .map_err(internal)
    }

    /// Push the local branch to the remote without force.
    fn push(&self, creds: &Credentials, expected: &Revision) -> Result<(), StoreError> {
        let mut remote = self.repo.find_remote(REMOTE).map_err(internal)?;

        let auth_offered = Cell::new(false);
        let rejection: RefCell<Option<String>> = RefCell::new(None);

        let result = {
            let mut cb = callbacks(creds, &auth_offered);
            cb.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    *rejection.borrow_mut() = Some(format!("{}: {}", refname, message));
                }
                Ok(())
            });

            let mut push = PushOptions::new();
            push.remote_callbacks(cb);

            let refspec = format!("{0}:{0}", self.branch_ref());
            remote.push(&[refspec.as_str()], Some(&mut push))
        };

        if let Err(e) = result {
            return Err(match transport_error(e, auth_offered.get()) {
                StoreError::PublishConflict { .. } => StoreError::PublishConflict {
                    expected: expected.to_string(),
                    actual: "remote branch moved".to_string(),
                },
                other => other,
            });
        }

        if let Some(message) = rejection.into_inner() {
            return Err(StoreError::PublishConflict {
                expected: expected.to_string(),
                actual: format!("remote rejected update ({})", message),
            });
        }

        Ok(())
    }
}

/// Tag store publishing through a remote git repository.
///
/// Workspaces are cached per repository URL for the lifetime of the store.
pub struct GitTagStore {
    options: GitStoreOptions,
    workspaces: Mutex<HashMap<String, Workspace>>,
}

impl std::fmt::Debug for GitTagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitTagStore")
            .field("options", &self.options)
            .finish()
    }
}

impl GitTagStore {
    /// Create a store with the given options.
    pub fn new(options: GitStoreOptions) -> Self {
        Self {
            options,
            workspaces: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against an up-to-date workspace for `url`.
    fn with_workspace<T>(
        &self,
        creds: &Credentials,
        url: &str,
        f: impl FnOnce(&Workspace) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut cache = self
            .workspaces
            .lock()
            .map_err(|_| StoreError::Internal("workspace cache poisoned".to_string()))?;

        match cache.entry(url.to_string()) {
            Entry::Occupied(entry) => {
                let workspace = entry.into_mut();
                workspace.fetch(creds)?;
                f(workspace)
            }
            Entry::Vacant(entry) => {
                let workspace = Workspace::create(creds, url, self.options.branch.as_deref())?;
                f(entry.insert(workspace))
            }
        }
    }
}

impl TagStore for GitTagStore {
    fn name(&self) -> &'static str {
        "git"
    }

    fn read_tag(
        &self,
        creds: &Credentials,
        repo_url: &str,
        path: &str,
    ) -> Result<TagSnapshot, StoreError> {
        self.with_workspace(creds, repo_url, |ws| {
            let (tip, _, contents) = ws.read_document(path)?;
            let raw = document::get_tag(&contents, &self.options.tag_key).map_err(|message| {
                StoreError::MalformedDocument {
                    path: path.to_string(),
                    message,
                }
            })?;
            let tag = raw
                .map(Tag::new)
                .transpose()
                .map_err(|e| StoreError::MalformedDocument {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;

            let revision = Revision::new(tip.id().to_string());
            tracing::debug!(
                path,
                revision = %revision.short(7),
                tag = ?tag.as_ref().map(Tag::as_str),
                "read tag"
            );

            Ok(TagSnapshot {
                path: path.to_string(),
                tag,
                revision,
            })
        })
    }

    fn write_tag_and_publish(
        &self,
        creds: &Credentials,
        repo_url: &str,
        request: &PublishRequest<'_>,
    ) -> Result<Published, StoreError> {
        self.with_workspace(creds, repo_url, |ws| {
            let (tip, mode, contents) = ws.read_document(request.path)?;
            let tip_id = tip.id();

            if tip_id.to_string() != request.expected.as_str() {
                return Err(StoreError::PublishConflict {
                    expected: request.expected.to_string(),
                    actual: tip_id.to_string(),
                });
            }

            let updated = document::set_tag(&contents, &self.options.tag_key, request.tag.as_str())
                .map_err(|message| StoreError::MalformedDocument {
                    path: request.path.to_string(),
                    message,
                })?;

            let Some(updated) = updated else {
                tracing::debug!(path = request.path, "tag already recorded, nothing to publish");
                return Ok(Published {
                    revision: request.expected.clone(),
                    outcome: PublishOutcome::Unchanged,
                });
            };

            let commit_id = commit_document(
                ws,
                &tip,
                request.path,
                mode,
                &updated,
                request.message,
                &self.options,
            )?;

            ws.set_branch(commit_id, request.message)?;
            if let Err(e) = ws.push(creds, request.expected) {
                if let Err(reset) = ws.set_branch(tip_id, "lodestar: discard unpublished change") {
                    tracing::warn!(error = %reset, "failed to restore workspace branch");
                }
                return Err(e);
            }

            let revision = Revision::new(commit_id.to_string());
            tracing::info!(
                path = request.path,
                tag = %request.tag,
                revision = %revision.short(7),
                "published tag"
            );

            Ok(Published {
                revision,
                outcome: PublishOutcome::Published,
            })
        })
    }
}

/// Create a commit on top of `parent` replacing the blob at `path`.
///
/// The commit is written to the object database only; no ref is moved.
fn commit_document(
    ws: &Workspace,
    parent: &git2::Commit<'_>,
    path: &str,
    mode: i32,
    contents: &str,
    message: &str,
    options: &GitStoreOptions,
) -> Result<git2::Oid, StoreError> {
    let repo = &ws.repo;
    let blob_id = repo.blob(contents.as_bytes()).map_err(internal)?;

    let mut index = git2::Index::new().map_err(internal)?;
    index
        .read_tree(&parent.tree().map_err(internal)?)
        .map_err(internal)?;
    index
        .add(&IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: mode as u32,
            uid: 0,
            gid: 0,
            file_size: contents.len() as u32,
            id: blob_id,
            flags: 0,
            flags_extended: 0,
            path: path.as_bytes().to_vec(),
        })
        .map_err(internal)?;

    let tree_id = index.write_tree_to(repo).map_err(internal)?;
    let tree = repo.find_tree(tree_id).map_err(internal)?;

    let signature =
        Signature::now(&options.author_name, &options.author_email).map_err(internal)?;

    repo.commit(None, &signature, &signature, message, &tree, &[parent])
        .map_err(internal)
}

/// Build remote callbacks that offer `creds` once.
fn callbacks<'a>(creds: &'a Credentials, auth_offered: &'a Cell<bool>) -> RemoteCallbacks<'a> {
    let mut cb = RemoteCallbacks::new();
    cb.credentials(move |_url, _username_from_url, _allowed| {
        if auth_offered.replace(true) {
            return Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Http,
                "credentials were rejected",
            ));
        }
        Cred::userpass_plaintext(creds.username(), creds.token())
    });
    cb
}

/// Determine the branch the remote's HEAD points at.
fn default_branch(repo: &Repository) -> Result<String, StoreError> {
    let head = repo
        .find_reference("HEAD")
        .map_err(|_| StoreError::BranchNotFound("HEAD".to_string()))?;
    let target = head
        .symbolic_target()
        .ok_or_else(|| StoreError::BranchNotFound("HEAD".to_string()))?;
    target
        .strip_prefix("refs/heads/")
        .map(String::from)
        .ok_or_else(|| StoreError::BranchNotFound(target.to_string()))
}

/// Classify an error from a network operation.
fn transport_error(err: git2::Error, auth_offered: bool) -> StoreError {
    let message = err.message().to_string();

    if err.code() == ErrorCode::Auth
        || (auth_offered
            && err.class() == ErrorClass::Http
            && (message.contains("401") || message.contains("403")))
    {
        return StoreError::AuthenticationFailed(message);
    }

    if err.code() == ErrorCode::NotFastForward {
        return StoreError::PublishConflict {
            expected: String::new(),
            actual: message,
        };
    }

    match err.class() {
        ErrorClass::Net
        | ErrorClass::Http
        | ErrorClass::Ssh
        | ErrorClass::Ssl
        | ErrorClass::Os
        | ErrorClass::Callback => StoreError::RepositoryUnreachable(message),
        _ if err.code() == ErrorCode::NotFound => StoreError::RepositoryUnreachable(message),
        _ => StoreError::Internal(message),
    }
}

fn internal(err: git2::Error) -> StoreError {
    StoreError::Internal(err.message().to_string())
}
