//! Rebuilding ancestor trees after a file leaves the cached tree.

use tracing::debug;

use gitdata_core::path;
use gitdata_core::{
    DIRECTORY_MODE, EntryKind, EntrySource, NewTreeEntry, RemoteStore, Result, TreeEntry,
};

use crate::tree_cache::TreeCache;

/// Remove `file_path` from `cache` and write fresh trees for every ancestor,
/// deepest first, so the cached root no longer reaches the file.
///
/// Each ancestor is written from its complete child list without a base
/// tree. A directory left without children is dropped from the cache instead
/// of being written. Returns the number of trees written.
pub(crate) async fn remove_file<S: RemoteStore>(
    store: &S,
    cache: &mut TreeCache,
    file_path: &str,
) -> Result<usize> {
    cache.remove(file_path);

    let mut written = 0;
    for dir in path::ancestors(file_path) {
        let children = child_entries(cache, dir);

        if children.is_empty() && !dir.is_empty() {
            cache.remove(dir);
            debug!(dir, "Dropped emptied directory");
            continue;
        }

        let tree = store.create_tree(&children, None).await?;
        written += 1;

        if dir.is_empty() {
            debug!(root = %tree.root_ref, "Rebuilt root tree");
            cache.set_root(tree.root_ref, tree.root_url);
        } else {
            debug!(dir, tree = %tree.root_ref, "Rebuilt directory tree");
            cache.insert(TreeEntry {
                path: dir.to_string(),
                mode: DIRECTORY_MODE.to_string(),
                kind: EntryKind::Subtree,
                remote_ref: tree.root_ref,
                remote_url: tree.root_url,
            });
        }
    }

    Ok(written)
}

/// Direct children of `dir`, renamed to their basename and pointing at their
/// existing objects.
fn child_entries(cache: &TreeCache, dir: &str) -> Vec<NewTreeEntry> {
    cache
        .direct_children(dir)
        .map(|entry| NewTreeEntry {
            path: path::basename(&entry.path).to_string(),
            mode: entry.mode.clone(),
            kind: entry.kind,
            source: EntrySource::Ref(entry.remote_ref.clone()),
        })
        .collect()
}
