use std::path::{Path, PathBuf};

use gix::object::tree::EntryKind;
use gix::ObjectId;
use tracing::{debug, info};

use gitdata_core::{
    EntryKind as RemoteKind, EntrySource, NewTreeEntry, ObjectId as RemoteId, RemoteCommit,
    RemoteError, RemoteLeaf, RemoteReference, RemoteResult, RemoteStore, RemoteTree, TreeEntry,
};

use crate::error::{GitStorageError, Result};
use crate::ops::{self, gix_err};
use crate::branch_ref;

/// A git repository on local disk serving as the remote object store.
///
/// Every call opens the repository afresh, so the store holds no handles and
/// sees writes made by other processes.
#[derive(Debug, Clone)]
pub struct LocalGitStore {
    repo_path: PathBuf,
}

impl LocalGitStore {
    /// Use an existing repository.
    pub fn open(repo_path: &Path) -> Result<Self> {
        ops::open_repo(repo_path)?;
        Ok(Self {
            repo_path: repo_path.to_path_buf(),
        })
    }

    /// Create a bare repository at `repo_path`.
    pub fn init_bare(repo_path: &Path) -> Result<Self> {
        gix::init_bare(repo_path).map_err(gix_err)?;
        info!(path = %repo_path.display(), "Initialized bare repository");
        Ok(Self {
            repo_path: repo_path.to_path_buf(),
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn object_url(&self, id: impl std::fmt::Display) -> String {
        format!("file://{}/objects/{id}", self.repo_path.display())
    }

    fn reference(&self, ref_name: &str, head: ObjectId) -> RemoteReference {
        RemoteReference {
            name: ref_name.to_string(),
            head_commit: head.to_string(),
            url: format!("file://{}/{ref_name}", self.repo_path.display()),
        }
    }

    /// Commit `files` onto `branch`, creating the branch when missing.
    ///
    /// Existing paths are overwritten; everything else in the branch tip is
    /// kept.
    pub fn seed_branch(&self, branch: &str, files: &[(&str, &[u8])], message: &str) -> Result<RemoteId> {
        let repo = ops::open_repo(&self.repo_path)?;
        let ref_name = branch_ref(branch);
        let tip = ops::find_ref_tip(&repo, &ref_name)?.map(|id| id.detach());
        let base_tree_id = match tip {
            Some(commit_id) => ops::commit_tree_id(&repo, commit_id)?,
            None => ObjectId::empty_tree(repo.object_hash()),
        };

        let mut editor = repo.edit_tree(base_tree_id).map_err(gix_err)?;
        for (path, body) in files {
            let blob = repo.write_blob(body).map_err(gix_err)?.detach();
            editor.upsert(*path, EntryKind::Blob, blob).map_err(gix_err)?;
        }
        let tree_id = editor.write().map_err(gix_err)?.detach();
        let commit_id = ops::create_commit(&repo, &ref_name, tree_id, tip, message)?;

        info!(branch, commit = %commit_id, files = files.len(), "Seeded branch");
        Ok(commit_id.to_string())
    }

    /// Content of `path` at the tip of `branch`, if present.
    pub fn read_at_branch(&self, branch: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let repo = ops::open_repo(&self.repo_path)?;
        let Some(tip) = ops::find_ref_tip(&repo, &branch_ref(branch))? else {
            return Ok(None);
        };
        let tree_id = ops::commit_tree_id(&repo, tip.detach())?;
        let found = ops::list_tree(&repo, tree_id, true)?
            .into_iter()
            .find(|e| e.path == path && !matches!(e.kind, EntryKind::Tree | EntryKind::Commit));
        match found {
            Some(entry) => Ok(Some(ops::read_blob(&repo, entry.id)?)),
            None => Ok(None),
        }
    }

    /// Move `branch` to `commit_id` unconditionally, as an out-of-band writer would.
    pub fn force_branch(&self, branch: &str, commit_id: &str) -> Result<()> {
        let repo = ops::open_repo(&self.repo_path)?;
        let ref_name = branch_ref(branch);
        let current = ops::find_ref_tip(&repo, &ref_name)?
            .ok_or_else(|| GitStorageError::NotFound(ref_name.clone()))?
            .detach();
        let new_tip = ops::parse_id(commit_id)?;
        ops::replace_ref_tip(&repo, &ref_name, current, new_tip, "force update")
    }

    fn listing(&self, repo: &gix::Repository, tree_id: ObjectId, recursive: bool) -> Result<RemoteTree> {
        let entries = ops::list_tree(repo, tree_id, recursive)?
            .into_iter()
            .map(|entry| TreeEntry {
                remote_url: self.object_url(entry.id),
                mode: ops::mode_string(entry.kind).to_string(),
                kind: remote_kind(entry.kind),
                remote_ref: entry.id.to_string(),
                path: entry.path,
            })
            .collect();
        Ok(RemoteTree {
            root_ref: tree_id.to_string(),
            root_url: self.object_url(tree_id),
            entries,
        })
    }

    fn get_commit_sync(&self, commit_id: &str) -> Result<RemoteCommit> {
        let repo = ops::open_repo(&self.repo_path)?;
        let id = ops::parse_id(commit_id)?;
        let commit = repo
            .find_commit(id)
            .map_err(|_| GitStorageError::NotFound(commit_id.to_string()))?;
        let message = String::from_utf8_lossy(commit.message_raw_sloppy().as_ref()).into_owned();
        let tree_id = commit.tree_id().map_err(gix_err)?.detach();
        let parents = commit.parent_ids().map(|p| p.detach().to_string()).collect();
        Ok(RemoteCommit {
            commit_id: id.to_string(),
            tree_id: tree_id.to_string(),
            parents,
            message,
            url: self.object_url(id),
        })
    }

    fn create_tree_sync(&self, entries: &[NewTreeEntry], base_tree: Option<&str>) -> Result<RemoteTree> {
        let repo = ops::open_repo(&self.repo_path)?;
        let base_id = match base_tree {
            Some(id) => ops::parse_id(id)?,
            None => ObjectId::empty_tree(repo.object_hash()),
        };

        let mut editor = repo.edit_tree(base_id).map_err(gix_err)?;
        for entry in entries {
            let id = match &entry.source {
                EntrySource::Ref(id) => ops::parse_id(id)?,
                EntrySource::Content(body) => repo.write_blob(body).map_err(gix_err)?.detach(),
            };
            let kind = match entry.kind {
                RemoteKind::Subtree => EntryKind::Tree,
                RemoteKind::Gitlink => EntryKind::Commit,
                RemoteKind::Leaf => ops::kind_for_mode(&entry.mode),
            };
            editor.upsert(entry.path.as_str(), kind, id).map_err(gix_err)?;
        }
        let tree_id = editor.write().map_err(gix_err)?.detach();

        debug!(tree = %tree_id, entries = entries.len(), base = ?base_tree, "Wrote tree");
        self.listing(&repo, tree_id, false)
    }

    fn create_commit_sync(&self, message: &str, tree_id: &str, parents: &[RemoteId]) -> RemoteResult<RemoteCommit> {
        let repo = ops::open_repo(&self.repo_path)?;
        let tree = ops::parse_id(tree_id)?;
        let parent_ids = parents
            .iter()
            .map(|p| ops::parse_id(p))
            .collect::<Result<Vec<_>>>()?;

        if let [parent] = parent_ids.as_slice() {
            if ops::commit_tree_id(&repo, *parent)? == tree {
                return Err(RemoteError::Conflict {
                    status: 409,
                    message: format!("commit would be empty: tree {tree} matches parent {parent}"),
                });
            }
        }

        let commit_id = ops::write_commit(&repo, tree, &parent_ids, message)?;
        debug!(commit = %commit_id, tree = %tree, "Wrote commit");
        Ok(RemoteCommit {
            commit_id: commit_id.to_string(),
            tree_id: tree.to_string(),
            parents: parents.to_vec(),
            message: message.to_string(),
            url: self.object_url(commit_id),
        })
    }

    fn update_reference_sync(&self, branch: &str, commit_id: &str, force: bool) -> RemoteResult<RemoteReference> {
        let repo = ops::open_repo(&self.repo_path)?;
        let ref_name = branch_ref(branch);
        let current = ops::find_ref_tip(&repo, &ref_name)?
            .ok_or_else(|| RemoteError::ReferenceNotFound(branch.to_string()))?
            .detach();
        let new_tip = ops::parse_id(commit_id)?;

        if !force && !ops::is_ancestor(&repo, current, new_tip)? {
            return Err(RemoteError::Conflict {
                status: 422,
                message: "Update is not a fast forward".to_string(),
            });
        }

        // Compare-and-swap on the tip read above; losing the race is a conflict.
        ops::replace_ref_tip(&repo, &ref_name, current, new_tip, &format!("update {branch}"))
            .map_err(|e| RemoteError::Conflict {
                status: 409,
                message: e.to_string(),
            })?;

        info!(branch, old_tip = %current, new_tip = %new_tip, "Updated reference");
        Ok(self.reference(&ref_name, new_tip))
    }
}

fn remote_kind(kind: EntryKind) -> RemoteKind {
    match kind {
        EntryKind::Tree => RemoteKind::Subtree,
        EntryKind::Commit => RemoteKind::Gitlink,
        EntryKind::Blob | EntryKind::BlobExecutable | EntryKind::Link => RemoteKind::Leaf,
    }
}

impl RemoteStore for LocalGitStore {
    async fn get_reference(&self, branch: &str) -> RemoteResult<RemoteReference> {
        let repo = ops::open_repo(&self.repo_path)?;
        let ref_name = branch_ref(branch);
        match ops::find_ref_tip(&repo, &ref_name)? {
            Some(tip) => Ok(self.reference(&ref_name, tip.detach())),
            None => Err(RemoteError::ReferenceNotFound(branch.to_string())),
        }
    }

    async fn get_commit(&self, commit_id: &str) -> RemoteResult<RemoteCommit> {
        Ok(self.get_commit_sync(commit_id)?)
    }

    async fn get_tree(&self, tree_id: &str, recursive: bool) -> RemoteResult<RemoteTree> {
        let repo = ops::open_repo(&self.repo_path)?;
        let id = ops::parse_id(tree_id)?;
        Ok(self.listing(&repo, id, recursive)?)
    }

    async fn get_leaf(&self, object_id: &str) -> RemoteResult<RemoteLeaf> {
        let repo = ops::open_repo(&self.repo_path)?;
        let id = ops::parse_id(object_id)?;
        let content = ops::read_blob(&repo, id)?;
        Ok(RemoteLeaf {
            remote_ref: id.to_string(),
            remote_url: self.object_url(id),
            size: content.len() as u64,
            content,
        })
    }

    async fn create_tree(
        &self,
        entries: &[NewTreeEntry],
        base_tree: Option<&str>,
    ) -> RemoteResult<RemoteTree> {
        Ok(self.create_tree_sync(entries, base_tree)?)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_id: &str,
        parents: &[RemoteId],
    ) -> RemoteResult<RemoteCommit> {
        self.create_commit_sync(message, tree_id, parents)
    }

    async fn update_reference(
        &self,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> RemoteResult<RemoteReference> {
        self.update_reference_sync(branch, commit_id, force)
    }
}
