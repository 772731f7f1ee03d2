use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use gitdata_core::path;
use gitdata_core::{
    ContentCodec, EntryKind, EntrySource, Error, Leaf, LeafObject, NewTreeEntry, ObjectId,
    RemoteError, RemoteReference, RemoteStore, Result,
};
use gitdata_runtime_config::SessionSettings;

use crate::reconcile;
use crate::tree_cache::TreeCache;

/// Which repository branch a session works against, and how its commits
/// are labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Prepended to every commit message, separated by one space.
    pub commit_prefix: String,
}

impl SessionIdentity {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            commit_prefix: String::new(),
        }
    }

    pub fn with_commit_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.commit_prefix = prefix.into();
        self
    }

    pub fn commit_message(&self, message: &str) -> String {
        if self.commit_prefix.is_empty() {
            message.to_string()
        } else {
            format!("{} {}", self.commit_prefix, message)
        }
    }
}

impl From<&SessionSettings> for SessionIdentity {
    fn from(settings: &SessionSettings) -> Self {
        Self::new(&settings.owner, &settings.repo, &settings.branch)
            .with_commit_prefix(&settings.commit_prefix)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    leaves: HashMap<String, Leaf>,
    /// `None` until resolved, and again after a commit or a failed delete.
    tree: Option<TreeCache>,
    last_head_commit: Option<ObjectId>,
}

/// A file-system-like view of one branch.
///
/// Reads populate a leaf cache and a flattened tree cache; edits stay local
/// until [`commit`](Self::commit) writes them as a single commit on the
/// branch. Every operation holds the session lock for its whole duration, so
/// concurrent callers observe them one at a time.
pub struct RepoSession<S> {
    store: S,
    identity: SessionIdentity,
    state: Mutex<SessionState>,
}

impl<S: RemoteStore> RepoSession<S> {
    pub fn new(store: S, identity: SessionIdentity) -> Self {
        Self {
            store,
            identity,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the leaf for `path`, decoded by its extension.
    pub async fn read_file(&self, path: &str) -> Result<Leaf> {
        let path = checked_path(path)?;
        self.read_file_as(path, ContentCodec::for_path(path)).await
    }

    /// Return the leaf for `path`, decoded with `codec` if it has to be
    /// fetched. A cached leaf keeps the codec it was loaded with.
    pub async fn read_file_as(&self, path: &str, codec: ContentCodec) -> Result<Leaf> {
        let path = checked_path(path)?;
        let mut state = self.state.lock().await;
        if let Some(leaf) = state.leaves.get(path) {
            debug!(path, "Leaf cache hit");
            return Ok(leaf.clone());
        }
        self.load_leaf(&mut state, path, codec)
            .await?
            .ok_or_else(|| Error::FileNotFound(path.to_string()))
    }

    /// Return the leaf for `path`, creating an empty dirty one when the
    /// branch has no such file.
    pub async fn create_file(&self, path: &str) -> Result<Leaf> {
        let path = checked_path(path)?;
        self.create_file_as(path, ContentCodec::for_path(path)).await
    }

    pub async fn create_file_as(&self, path: &str, codec: ContentCodec) -> Result<Leaf> {
        let path = checked_path(path)?;
        let mut state = self.state.lock().await;
        if let Some(leaf) = state.leaves.get(path) {
            return Ok(leaf.clone());
        }
        if let Some(leaf) = self.load_leaf(&mut state, path, codec).await? {
            return Ok(leaf);
        }

        let leaf = LeafObject::created(path, codec);
        state.leaves.insert(path.to_string(), leaf.clone());
        debug!(path, "Created local file");
        Ok(leaf)
    }

    /// Remove `path` from the session.
    ///
    /// The cached leaf, if any, is destroyed. A file present in the tree is
    /// removed from it and every ancestor tree is rewritten remotely; the
    /// branch itself only moves on the next commit.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let path = checked_path(path)?;
        let mut state = self.state.lock().await;

        let cached = state.leaves.remove(path);
        if let Some(leaf) = &cached {
            leaf.destroy();
        }

        let cache = self.resolve_tree(&mut state).await?;
        if cache.leaf(path).is_none() {
            if cached.is_some() {
                debug!(path, "Deleted uncommitted file");
                return Ok(());
            }
            return Err(Error::FileNotFound(path.to_string()));
        }

        match reconcile::remove_file(&self.store, cache, path).await {
            Ok(written) => {
                info!(path, trees_written = written, "Deleted file");
                Ok(())
            }
            Err(e) => {
                // Ancestors may be half rebuilt; re-resolve on next access.
                state.tree = None;
                warn!(path, "Delete failed while rebuilding trees: {e}");
                Err(e)
            }
        }
    }

    /// Write every cached leaf as one commit on the branch.
    ///
    /// The new tree is merged onto the cached root, so deletions and
    /// untouched files carry over. The branch moves without force: if it
    /// advanced since the tree was resolved the remote conflict is returned
    /// unchanged and the session keeps its caches. On success the tree cache
    /// is dropped and every leaf becomes clean.
    pub async fn commit(&self, message: &str) -> Result<RemoteReference> {
        let mut state = self.state.lock().await;
        let base_tree = self.resolve_tree(&mut state).await?.root_ref().to_string();

        let mut leaves: Vec<&Leaf> = state.leaves.values().collect();
        leaves.sort_by(|a, b| a.path().cmp(b.path()));
        let entries: Vec<NewTreeEntry> = leaves
            .iter()
            .map(|leaf| NewTreeEntry {
                path: leaf.path().to_string(),
                mode: leaf.mode(),
                kind: EntryKind::Leaf,
                source: EntrySource::Content(leaf.content()),
            })
            .collect();

        let tree = self.store.create_tree(&entries, Some(&base_tree)).await?;
        let message = self.identity.commit_message(message);
        let parents: Vec<ObjectId> = state.last_head_commit.iter().cloned().collect();
        let commit = self
            .store
            .create_commit(&message, &tree.root_ref, &parents)
            .await
            .map_err(|e| self.surface(e))?;
        let reference = self
            .store
            .update_reference(&self.identity.branch, &commit.commit_id, false)
            .await
            .map_err(|e| self.surface(e))?;

        state.tree = None;
        state.last_head_commit = Some(commit.commit_id.clone());
        for leaf in state.leaves.values() {
            leaf.reset_original();
        }

        info!(
            branch = %self.identity.branch,
            commit = %commit.commit_id,
            files = entries.len(),
            "Committed"
        );
        Ok(reference)
    }

    /// Drop every cache. Leaves handed out earlier are destroyed.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        for leaf in state.leaves.values() {
            leaf.destroy();
        }
        let dropped = state.leaves.len();
        *state = SessionState::default();
        info!(leaves = dropped, "Invalidated session caches");
    }

    /// Whether `path` names a file, cached or on the branch.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let path = checked_path(path)?;
        let mut state = self.state.lock().await;
        if state.leaves.contains_key(path) {
            return Ok(true);
        }
        Ok(self.resolve_tree(&mut state).await?.leaf(path).is_some())
    }

    /// Every file visible to the session, sorted: the tree's files plus
    /// cached leaves not yet committed.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().await;
        let mut files: Vec<String> = self
            .resolve_tree(&mut state)
            .await?
            .leaf_paths()
            .map(str::to_string)
            .collect();
        files.extend(state.leaves.keys().cloned());
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Head commit the session last resolved or produced.
    pub async fn last_head_commit(&self) -> Option<ObjectId> {
        self.state.lock().await.last_head_commit.clone()
    }

    /// Copy of the cached tree, or `None` when it is not resolved.
    pub async fn tree_snapshot(&self) -> Option<TreeCache> {
        self.state.lock().await.tree.clone()
    }

    /// Paths of the cached leaves, sorted.
    pub async fn cached_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().await.leaves.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn surface(&self, e: RemoteError) -> Error {
        if e.is_conflict() {
            warn!(branch = %self.identity.branch, "Commit rejected by remote: {e}");
        }
        e.into()
    }

    /// Fetch, decode and cache the leaf at `path`. `Ok(None)` when the tree
    /// has no file there.
    async fn load_leaf(
        &self,
        state: &mut SessionState,
        path: &str,
        codec: ContentCodec,
    ) -> Result<Option<Leaf>> {
        let Some(entry) = self.resolve_tree(state).await?.leaf(path).cloned() else {
            return Ok(None);
        };

        let remote = self.store.get_leaf(&entry.remote_ref).await?;
        // Fail on undecodable content before anything is cached.
        codec.decode(path, &remote.content)?;

        let leaf = LeafObject::hydrated(
            path,
            codec,
            entry.mode,
            remote.remote_ref,
            remote.remote_url,
            remote.content,
        );
        state.leaves.insert(path.to_string(), leaf.clone());
        debug!(path, size = remote.size, "Loaded file");
        Ok(Some(leaf))
    }

    /// Return the tree cache, resolving branch, commit and recursive root
    /// listing first when it is empty.
    async fn resolve_tree<'a>(&self, state: &'a mut SessionState) -> Result<&'a mut TreeCache> {
        let cache = match state.tree.take() {
            Some(cache) => cache,
            None => {
                let reference = self.store.get_reference(&self.identity.branch).await?;
                let commit = self.store.get_commit(&reference.head_commit).await?;
                let tree = self.store.get_tree(&commit.tree_id, true).await?;
                debug!(
                    branch = %self.identity.branch,
                    commit = %commit.commit_id,
                    entries = tree.entries.len(),
                    "Resolved tree"
                );
                state.last_head_commit = Some(commit.commit_id);
                TreeCache::from_remote(tree)
            }
        };
        Ok(state.tree.insert(cache))
    }
}

fn checked_path(path: &str) -> Result<&str> {
    let path = path::normalize(path);
    if path.is_empty() {
        return Err(Error::EmptyPath);
    }
    Ok(path)
}

impl<S> std::fmt::Debug for RepoSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoSession")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
