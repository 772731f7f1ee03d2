//! Contract between the session layer and a remote object store.
//!
//! The store exposes whole-object primitives only: trees are replaced
//! wholesale, never patched. Implementations own their wire transcoding, so
//! leaf content crosses this boundary as raw bytes.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Remote object id (a git sha in every current implementation).
pub type ObjectId = String;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "blob")]
    Leaf,
    #[serde(rename = "tree")]
    Subtree,
    /// Submodule pointer. Carried through rebuilds as-is.
    #[serde(rename = "commit")]
    Gitlink,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leaf => "blob",
            Self::Subtree => "tree",
            Self::Gitlink => "commit",
        }
    }
}

/// One entry of a tree listing. `path` is relative to the tree that was
/// listed; recursive listings use full slash-separated paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    pub kind: EntryKind,
    pub remote_ref: ObjectId,
    pub remote_url: String,
}

#[derive(Debug, Clone)]
pub struct RemoteTree {
    pub root_ref: ObjectId,
    pub root_url: String,
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Clone)]
pub struct RemoteLeaf {
    pub remote_ref: ObjectId,
    pub remote_url: String,
    pub content: Vec<u8>,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct RemoteCommit {
    pub commit_id: ObjectId,
    pub tree_id: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
    pub url: String,
}

/// A branch reference and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReference {
    pub name: String,
    pub head_commit: ObjectId,
    pub url: String,
}

/// Where a new tree entry gets its object from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// An object that already exists in the store.
    Ref(ObjectId),
    /// Leaf content the store writes as a new object.
    Content(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTreeEntry {
    pub path: String,
    pub mode: String,
    pub kind: EntryKind,
    pub source: EntrySource,
}

impl From<&TreeEntry> for NewTreeEntry {
    fn from(entry: &TreeEntry) -> Self {
        Self {
            path: entry.path.clone(),
            mode: entry.mode.clone(),
            kind: entry.kind,
            source: EntrySource::Ref(entry.remote_ref.clone()),
        }
    }
}

/// Request/response primitives of the remote store. Stateless: every call
/// stands on its own and none are retried.
pub trait RemoteStore: Send + Sync {
    /// Resolve `branch` to its head commit. Fails with
    /// [`RemoteError::ReferenceNotFound`] unless exactly one ref matches.
    fn get_reference(
        &self,
        branch: &str,
    ) -> impl Future<Output = RemoteResult<RemoteReference>> + Send;

    fn get_commit(&self, commit_id: &str)
    -> impl Future<Output = RemoteResult<RemoteCommit>> + Send;

    /// List a tree. `recursive = false` returns only direct children.
    fn get_tree(
        &self,
        tree_id: &str,
        recursive: bool,
    ) -> impl Future<Output = RemoteResult<RemoteTree>> + Send;

    fn get_leaf(&self, object_id: &str) -> impl Future<Output = RemoteResult<RemoteLeaf>> + Send;

    /// Write a tree. Without `base_tree` the result holds exactly `entries`;
    /// with one, `entries` are merged onto the base by path.
    fn create_tree(
        &self,
        entries: &[NewTreeEntry],
        base_tree: Option<&str>,
    ) -> impl Future<Output = RemoteResult<RemoteTree>> + Send;

    fn create_commit(
        &self,
        message: &str,
        tree_id: &str,
        parents: &[ObjectId],
    ) -> impl Future<Output = RemoteResult<RemoteCommit>> + Send;

    /// Point `branch` at `commit_id`. Without `force`, a move that is not a
    /// fast-forward fails with [`RemoteError::Conflict`].
    fn update_reference(
        &self,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> impl Future<Output = RemoteResult<RemoteReference>> + Send;
}
