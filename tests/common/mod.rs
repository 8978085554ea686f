//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{IndexEntry, IndexTime, Oid, Repository, Signature};
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

/// A bare repository standing in for the remote backing repository.
pub struct RemoteRepo {
    dir: TempDir,
}

impl RemoteRepo {
    /// Create a remote with `files` committed on `main`.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = Repository::init_bare(dir.path()).expect("failed to init bare repo");
        commit_files(&repo, "refs/heads/main", files, "initial");
        repo.set_head("refs/heads/main").expect("failed to set HEAD");
        Self { dir }
    }

    pub fn url(&self) -> String {
        self.dir.path().to_str().expect("utf-8 temp path").to_string()
    }

    pub fn repo(&self) -> Repository {
        Repository::open_bare(self.dir.path()).expect("failed to open remote")
    }

    /// Commit id at the tip of `branch`.
    pub fn tip(&self, branch: &str) -> Oid {
        self.repo()
            .refname_to_id(&format!("refs/heads/{}", branch))
            .expect("branch exists")
    }

    /// Contents of `path` at the tip of `branch`.
    pub fn read(&self, branch: &str, path: &str) -> String {
        let repo = self.repo();
        let commit = repo.find_commit(self.tip(branch)).unwrap();
        let entry = commit.tree().unwrap().get_path(Path::new(path)).unwrap();
        let blob = repo.find_blob(entry.id()).unwrap();
        String::from_utf8(blob.content().to_vec()).unwrap()
    }

    /// Commit as another writer would.
    pub fn commit(&self, branch: &str, files: &[(&str, &str)], message: &str) -> Oid {
        commit_files(&self.repo(), &format!("refs/heads/{}", branch), files, message)
    }

    /// Create `branch` pointing at the tip of `main`.
    pub fn branch(&self, branch: &str) {
        let repo = self.repo();
        let tip = repo.find_commit(self.tip("main")).unwrap();
        repo.branch(branch, &tip, false).unwrap();
    }

    /// Hold git's lock on `branch` so the remote rejects updates to it.
    ///
    /// Returns the lock file; remove it to let updates through again.
    pub fn lock_branch(&self, branch: &str) -> PathBuf {
        let path = self.dir.path().join(format!("refs/heads/{}.lock", branch));
        fs::write(&path, "").expect("failed to create ref lock");
        path
    }
}

/// Commit `files` on top of `refname` (or as a root commit).
pub fn commit_files(
    repo: &Repository,
    refname: &str,
    files: &[(&str, &str)],
    message: &str,
) -> Oid {
    let parent = repo
        .refname_to_id(refname)
        .ok()
        .map(|id| repo.find_commit(id).unwrap());

    let mut index = git2::Index::new().unwrap();
    if let Some(parent) = &parent {
        index.read_tree(&parent.tree().unwrap()).unwrap();
    }
    for (path, contents) in files {
        let id = repo.blob(contents.as_bytes()).unwrap();
        index
            .add(&IndexEntry {
                ctime: IndexTime::new(0, 0),
                mtime: IndexTime::new(0, 0),
                dev: 0,
                ino: 0,
                mode: 0o100644,
                uid: 0,
                gid: 0,
                file_size: contents.len() as u32,
                id,
                flags: 0,
                flags_extended: 0,
                path: path.as_bytes().to_vec(),
            })
            .unwrap();
    }
    let tree = repo.find_tree(index.write_tree_to(repo).unwrap()).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some(refname), &sig, &sig, message, &tree, &parents)
        .unwrap()
}
