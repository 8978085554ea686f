//! Integration tests for the git-backed tag store.
//!
//! These tests publish into real bare repositories on the local
//! filesystem, so they exercise the full clone → fetch → commit → push
//! path without network access.

use std::fs;

use lodestar::core::types::{Credentials, Tag};
use lodestar::engine::{PropagateError, PropagationEngine};
use lodestar::store::{
    GitStoreOptions, GitTagStore, PublishOutcome, PublishRequest, StoreError, TagStore,
};

mod common;

use common::RemoteRepo;

fn standard_remote() -> RemoteRepo {
    RemoteRepo::new(&[
        ("envs/dev.yaml", "name: api\ntag: v1\n"),
        ("envs/prod.yaml", "name: api\ntag: v0\n"),
        ("README.md", "# environments\n"),
    ])
}

fn creds() -> Credentials {
    Credentials::new("ci", "secret")
}

fn tag(s: &str) -> Tag {
    Tag::new(s).unwrap()
}

fn store() -> GitTagStore {
    GitTagStore::new(GitStoreOptions::default())
}

// =============================================================================
// read_tag
// =============================================================================

#[test]
fn read_tag_reports_tip_revision() {
    let remote = standard_remote();
    let snapshot = store()
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();

    assert_eq!(snapshot.tag.as_ref().map(Tag::as_str), Some("v1"));
    assert_eq!(snapshot.revision.as_str(), remote.tip("main").to_string());
}

#[test]
fn read_tag_missing_path() {
    let remote = standard_remote();
    let result = store().read_tag(&creds(), &remote.url(), "envs/qa.yaml");
    assert!(matches!(result, Err(StoreError::PathNotFound { .. })));
}

#[test]
fn read_tag_empty_value() {
    let remote = RemoteRepo::new(&[("envs/dev.yaml", "name: api\ntag: \"\"\n")]);
    let snapshot = store()
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    assert!(snapshot.tag.is_none());
}

#[test]
fn read_tag_malformed_document() {
    let remote = RemoteRepo::new(&[("envs/dev.yaml", "tag: [v1, v2]\n")]);
    let result = store().read_tag(&creds(), &remote.url(), "envs/dev.yaml");
    assert!(matches!(result, Err(StoreError::MalformedDocument { .. })));
}

#[test]
fn read_tag_unquoted_number_is_malformed() {
    for value in ["1.10", "1e3", "0x1F"] {
        let doc = format!("tag: {}\n", value);
        let remote = RemoteRepo::new(&[("envs/dev.yaml", doc.as_str())]);
        let result = store().read_tag(&creds(), &remote.url(), "envs/dev.yaml");
        assert!(
            matches!(result, Err(StoreError::MalformedDocument { .. })),
            "tag: {} read as {:?}",
            value,
            result
        );
    }
}

#[test]
fn read_tag_sees_later_commits() {
    let remote = standard_remote();
    let store = store();
    store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();

    remote.commit("main", &[("envs/dev.yaml", "tag: v7\n")], "external");

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    assert_eq!(snapshot.tag.as_ref().map(Tag::as_str), Some("v7"));
}

// =============================================================================
// write_tag_and_publish
// =============================================================================

#[test]
fn publish_creates_one_commit() {
    let remote = standard_remote();
    let before = remote.tip("main");
    let store = store();

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    let v2 = tag("v2");
    let published = store
        .write_tag_and_publish(
            &creds(),
            &remote.url(),
            &PublishRequest {
                path: "envs/dev.yaml",
                tag: &v2,
                expected: &snapshot.revision,
                message: "push v2",
            },
        )
        .unwrap();

    assert_eq!(published.outcome, PublishOutcome::Published);
    let after = remote.tip("main");
    assert_eq!(published.revision.as_str(), after.to_string());

    let repo = remote.repo();
    let commit = repo.find_commit(after).unwrap();
    assert_eq!(commit.parent_id(0).unwrap(), before);
    assert_eq!(commit.message(), Some("push v2"));
    assert_eq!(commit.author().name(), Some("lodestar"));

    let dev = remote.read("main", "envs/dev.yaml");
    assert!(dev.contains("tag: v2"));
    assert!(dev.contains("name: api"));
    assert_eq!(remote.read("main", "envs/prod.yaml"), "name: api\ntag: v0\n");
    assert_eq!(remote.read("main", "README.md"), "# environments\n");
}

#[test]
fn publish_same_tag_is_unchanged() {
    let remote = standard_remote();
    let before = remote.tip("main");
    let store = store();

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    let v1 = tag("v1");
    let published = store
        .write_tag_and_publish(
            &creds(),
            &remote.url(),
            &PublishRequest {
                path: "envs/dev.yaml",
                tag: &v1,
                expected: &snapshot.revision,
                message: "push v1",
            },
        )
        .unwrap();

    assert_eq!(published.outcome, PublishOutcome::Unchanged);
    assert_eq!(remote.tip("main"), before);
}

#[test]
fn publish_on_stale_revision_conflicts() {
    let remote = standard_remote();
    let store = store();

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    let external = remote.commit(
        "main",
        &[("envs/dev.yaml", "name: api\ntag: v5\n")],
        "external",
    );

    let v2 = tag("v2");
    let result = store.write_tag_and_publish(
        &creds(),
        &remote.url(),
        &PublishRequest {
            path: "envs/dev.yaml",
            tag: &v2,
            expected: &snapshot.revision,
            message: "push v2",
        },
    );

    assert!(matches!(result, Err(StoreError::PublishConflict { .. })));
    assert_eq!(remote.tip("main"), external);
    assert_eq!(remote.read("main", "envs/dev.yaml"), "name: api\ntag: v5\n");
}

#[test]
fn publish_rejected_by_remote_leaves_nothing_behind() {
    let remote = standard_remote();
    let before = remote.tip("main");
    let store = store();
    let v2 = tag("v2");

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    let lock = remote.lock_branch("main");
    let result = store.write_tag_and_publish(
        &creds(),
        &remote.url(),
        &PublishRequest {
            path: "envs/dev.yaml",
            tag: &v2,
            expected: &snapshot.revision,
            message: "push v2",
        },
    );

    assert!(matches!(result, Err(StoreError::PublishConflict { .. })));
    assert_eq!(remote.tip("main"), before);
    assert_eq!(remote.read("main", "envs/dev.yaml"), "name: api\ntag: v1\n");

    fs::remove_file(lock).unwrap();

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();
    assert_eq!(snapshot.tag.as_ref().map(Tag::as_str), Some("v1"));
    assert_eq!(snapshot.revision.as_str(), before.to_string());

    let published = store
        .write_tag_and_publish(
            &creds(),
            &remote.url(),
            &PublishRequest {
                path: "envs/dev.yaml",
                tag: &v2,
                expected: &snapshot.revision,
                message: "push v2",
            },
        )
        .unwrap();
    assert_eq!(published.outcome, PublishOutcome::Published);
    let remote_repo = remote.repo();
    let commit = remote_repo.find_commit(remote.tip("main")).unwrap();
    assert_eq!(commit.parent_id(0).unwrap(), before);
    assert!(remote.read("main", "envs/dev.yaml").contains("tag: v2"));
}

#[test]
fn publish_missing_path() {
    let remote = standard_remote();
    let store = store();
    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/dev.yaml")
        .unwrap();

    let v2 = tag("v2");
    let result = store.write_tag_and_publish(
        &creds(),
        &remote.url(),
        &PublishRequest {
            path: "envs/qa.yaml",
            tag: &v2,
            expected: &snapshot.revision,
            message: "push v2",
        },
    );
    assert!(matches!(result, Err(StoreError::PathNotFound { .. })));
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn nested_tag_key() {
    let remote = RemoteRepo::new(&[(
        "envs/dev.yaml",
        "image:\n  repository: api\n  tag: v1\n",
    )]);
    let store = GitTagStore::new(GitStoreOptions {
        tag_key: "image.tag".to_string(),
        ..GitStoreOptions::default()
    });

    let receipt = PropagationEngine::new(&store)
        .push(&creds(), &remote.url(), "envs/dev.yaml", &tag("v2"))
        .unwrap();
    assert_eq!(receipt.outcome, PublishOutcome::Published);

    let dev = remote.read("main", "envs/dev.yaml");
    assert!(dev.contains("repository: api"));
    assert!(dev.contains("tag: v2"));
}

#[test]
fn configured_branch() {
    let remote = standard_remote();
    remote.branch("release");
    let main_before = remote.tip("main");

    let store = GitTagStore::new(GitStoreOptions {
        branch: Some("release".to_string()),
        author_name: "Release Bot".to_string(),
        ..GitStoreOptions::default()
    });
    PropagationEngine::new(&store)
        .push(&creds(), &remote.url(), "envs/prod.yaml", &tag("v3"))
        .unwrap();

    assert_eq!(remote.tip("main"), main_before);
    assert!(remote.read("release", "envs/prod.yaml").contains("tag: v3"));

    let repo = remote.repo();
    let commit = repo.find_commit(remote.tip("release")).unwrap();
    assert_eq!(commit.author().name(), Some("Release Bot"));
}

#[test]
fn missing_branch() {
    let remote = standard_remote();
    let store = GitTagStore::new(GitStoreOptions {
        branch: Some("nope".to_string()),
        ..GitStoreOptions::default()
    });
    let result = store.read_tag(&creds(), &remote.url(), "envs/dev.yaml");
    assert!(matches!(result, Err(StoreError::BranchNotFound(_))));
}

// =============================================================================
// Engine over git
// =============================================================================

#[test]
fn push_then_promote() {
    let remote = standard_remote();
    let store = store();
    let engine = PropagationEngine::new(&store);

    engine
        .push(&creds(), &remote.url(), "envs/dev.yaml", &tag("v2"))
        .unwrap();
    let receipt = engine
        .promote(&creds(), &remote.url(), "envs/dev.yaml", "envs/prod.yaml")
        .unwrap();

    assert_eq!(receipt.tag.as_str(), "v2");
    assert_eq!(receipt.revision.as_str(), remote.tip("main").to_string());

    let snapshot = store
        .read_tag(&creds(), &remote.url(), "envs/prod.yaml")
        .unwrap();
    assert_eq!(snapshot.tag.as_ref().map(Tag::as_str), Some("v2"));

    let message = remote
        .repo()
        .find_commit(remote.tip("main"))
        .unwrap()
        .message()
        .map(String::from);
    assert_eq!(
        message.as_deref(),
        Some("lodestar: promote v2 from envs/dev.yaml to envs/prod.yaml")
    );
}

#[test]
fn promote_empty_source_leaves_destination() {
    let remote = RemoteRepo::new(&[
        ("envs/dev.yaml", "name: api\n"),
        ("envs/prod.yaml", "name: api\ntag: v0\n"),
    ]);
    let before = remote.tip("main");

    let err = PropagationEngine::new(&store())
        .promote(&creds(), &remote.url(), "envs/dev.yaml", "envs/prod.yaml")
        .unwrap_err();

    assert!(matches!(err, PropagateError::SourceTagEmpty { .. }));
    assert_eq!(remote.tip("main"), before);
}

#[test]
fn promote_unquoted_number_source_leaves_destination() {
    for value in ["1.10", "1e3", "0x1F"] {
        let dev = format!("name: api\ntag: {}\n", value);
        let remote = RemoteRepo::new(&[
            ("envs/dev.yaml", dev.as_str()),
            ("envs/prod.yaml", "name: api\ntag: v0\n"),
        ]);
        let before = remote.tip("main");

        let err = PropagationEngine::new(&store())
            .promote(&creds(), &remote.url(), "envs/dev.yaml", "envs/prod.yaml")
            .unwrap_err();

        assert!(
            matches!(err, PropagateError::Store(StoreError::MalformedDocument { .. })),
            "tag: {} gave {:?}",
            value,
            err
        );
        assert_eq!(remote.tip("main"), before);
        assert_eq!(remote.read("main", "envs/prod.yaml"), "name: api\ntag: v0\n");
    }
}

#[test]
fn promote_quoted_number_copies_verbatim() {
    for value in ["1.10", "1e3", "0x1F"] {
        let dev = format!("name: api\ntag: \"{}\"\n", value);
        let remote = RemoteRepo::new(&[
            ("envs/dev.yaml", dev.as_str()),
            ("envs/prod.yaml", "name: api\ntag: v0\n"),
        ]);
        let store = store();

        let receipt = PropagationEngine::new(&store)
            .promote(&creds(), &remote.url(), "envs/dev.yaml", "envs/prod.yaml")
            .unwrap();
        assert_eq!(receipt.tag.as_str(), value);

        let snapshot = store
            .read_tag(&creds(), &remote.url(), "envs/prod.yaml")
            .unwrap();
        assert_eq!(snapshot.tag.as_ref().map(Tag::as_str), Some(value));
    }
}
