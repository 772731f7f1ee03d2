use std::sync::atomic::{AtomicUsize, Ordering};

use crate::remote::*;

/// Per-primitive call counts recorded by [`CountingStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_reference: usize,
    pub get_commit: usize,
    pub get_tree: usize,
    pub get_leaf: usize,
    pub create_tree: usize,
    pub create_commit: usize,
    pub update_reference: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.get_reference
            + self.get_commit
            + self.get_tree
            + self.get_leaf
            + self.create_tree
            + self.create_commit
            + self.update_reference
    }
}

/// Wraps a store and counts every call that passes through it.
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    get_reference: AtomicUsize,
    get_commit: AtomicUsize,
    get_tree: AtomicUsize,
    get_leaf: AtomicUsize,
    create_tree: AtomicUsize,
    create_commit: AtomicUsize,
    update_reference: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            get_reference: AtomicUsize::new(0),
            get_commit: AtomicUsize::new(0),
            get_tree: AtomicUsize::new(0),
            get_leaf: AtomicUsize::new(0),
            create_tree: AtomicUsize::new(0),
            create_commit: AtomicUsize::new(0),
            update_reference: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn counts(&self) -> CallCounts {
        CallCounts {
            get_reference: self.get_reference.load(Ordering::SeqCst),
            get_commit: self.get_commit.load(Ordering::SeqCst),
            get_tree: self.get_tree.load(Ordering::SeqCst),
            get_leaf: self.get_leaf.load(Ordering::SeqCst),
            create_tree: self.create_tree.load(Ordering::SeqCst),
            create_commit: self.create_commit.load(Ordering::SeqCst),
            update_reference: self.update_reference.load(Ordering::SeqCst),
        }
    }
}

impl<S: RemoteStore> RemoteStore for CountingStore<S> {
    async fn get_reference(&self, branch: &str) -> RemoteResult<RemoteReference> {
        self.get_reference.fetch_add(1, Ordering::SeqCst);
        self.inner.get_reference(branch).await
    }

    async fn get_commit(&self, commit_id: &str) -> RemoteResult<RemoteCommit> {
        self.get_commit.fetch_add(1, Ordering::SeqCst);
        self.inner.get_commit(commit_id).await
    }

    async fn get_tree(&self, tree_id: &str, recursive: bool) -> RemoteResult<RemoteTree> {
        self.get_tree.fetch_add(1, Ordering::SeqCst);
        self.inner.get_tree(tree_id, recursive).await
    }

    async fn get_leaf(&self, object_id: &str) -> RemoteResult<RemoteLeaf> {
        self.get_leaf.fetch_add(1, Ordering::SeqCst);
        self.inner.get_leaf(object_id).await
    }

    async fn create_tree(
        &self,
        entries: &[NewTreeEntry],
        base_tree: Option<&str>,
    ) -> RemoteResult<RemoteTree> {
        self.create_tree.fetch_add(1, Ordering::SeqCst);
        self.inner.create_tree(entries, base_tree).await
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_id: &str,
        parents: &[ObjectId],
    ) -> RemoteResult<RemoteCommit> {
        self.create_commit.fetch_add(1, Ordering::SeqCst);
        self.inner.create_commit(message, tree_id, parents).await
    }

    async fn update_reference(
        &self,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> RemoteResult<RemoteReference> {
        self.update_reference.fetch_add(1, Ordering::SeqCst);
        self.inner.update_reference(branch, commit_id, force).await
    }
}
