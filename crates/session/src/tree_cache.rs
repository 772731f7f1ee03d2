use std::collections::BTreeMap;

use gitdata_core::path;
use gitdata_core::{EntryKind, ObjectId, RemoteTree, TreeEntry};

/// Local mirror of a remote tree, flattened to full paths.
///
/// Directories are implied by path segmentation; subtree entries exist only
/// to carry their remote ids.
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    root_ref: ObjectId,
    root_url: String,
    entries: BTreeMap<String, TreeEntry>,
}

impl TreeCache {
    /// Build from a recursive listing of the root tree.
    pub fn from_remote(tree: RemoteTree) -> Self {
        let entries = tree
            .entries
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
        Self {
            root_ref: tree.root_ref,
            root_url: tree.root_url,
            entries,
        }
    }

    pub fn root_ref(&self) -> &str {
        &self.root_ref
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn set_root(&mut self, root_ref: ObjectId, root_url: String) {
        self.root_ref = root_ref;
        self.root_url = root_url;
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    /// The entry at `path` if it is a file.
    pub fn leaf(&self, path: &str) -> Option<&TreeEntry> {
        self.entries
            .get(path)
            .filter(|entry| entry.kind == EntryKind::Leaf)
    }

    /// Insert or replace the entry keyed by its path.
    pub fn insert(&mut self, entry: TreeEntry) -> Option<TreeEntry> {
        self.entries.insert(entry.path.clone(), entry)
    }

    pub fn remove(&mut self, path: &str) -> Option<TreeEntry> {
        self.entries.remove(path)
    }

    /// Entries exactly one segment below `dir` (`""` is the root).
    pub fn direct_children<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a TreeEntry> + 'a {
        self.entries
            .values()
            .filter(move |entry| path::is_direct_child(dir, &entry.path))
    }

    /// Paths of every file, in path order.
    pub fn leaf_paths(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(|entry| entry.kind == EntryKind::Leaf)
            .map(|entry| entry.path.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitdata_core::{DIRECTORY_MODE, FILE_MODE};

    fn entry(path: &str, kind: EntryKind, id: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            mode: match kind {
                EntryKind::Subtree => DIRECTORY_MODE.to_string(),
                _ => FILE_MODE.to_string(),
            },
            kind,
            remote_ref: id.to_string(),
            remote_url: String::new(),
        }
    }

    fn sample() -> TreeCache {
        TreeCache::from_remote(RemoteTree {
            root_ref: "root".into(),
            root_url: "root-url".into(),
            entries: vec![
                entry("Readme.md", EntryKind::Leaf, "r"),
                entry("lib", EntryKind::Subtree, "l"),
                entry("lib/repo.js", EntryKind::Leaf, "lr"),
                entry("lib/util", EntryKind::Subtree, "lu"),
                entry("lib/util/path.js", EntryKind::Leaf, "lup"),
                entry("libs.txt", EntryKind::Leaf, "ls"),
            ],
        })
    }

    #[test]
    fn leaf_lookup_ignores_subtrees() {
        let cache = sample();
        assert!(cache.leaf("lib/repo.js").is_some());
        assert!(cache.leaf("lib").is_none());
        assert!(cache.get("lib").is_some());
        assert!(cache.leaf("missing").is_none());
    }

    #[test]
    fn direct_children_stop_at_one_segment() {
        let cache = sample();
        let root: Vec<&str> = cache.direct_children("").map(|e| e.path.as_str()).collect();
        assert_eq!(root, vec!["Readme.md", "lib", "libs.txt"]);

        let lib: Vec<&str> = cache.direct_children("lib").map(|e| e.path.as_str()).collect();
        assert_eq!(lib, vec!["lib/repo.js", "lib/util"]);

        assert_eq!(cache.direct_children("lib/util/path.js").count(), 0);
    }

    #[test]
    fn insert_replaces_by_path() {
        let mut cache = sample();
        let before = cache.len();
        let old = cache.insert(entry("lib", EntryKind::Subtree, "l2"));
        assert_eq!(old.map(|e| e.remote_ref), Some("l".to_string()));
        assert_eq!(cache.len(), before);
        assert_eq!(cache.get("lib").map(|e| e.remote_ref.as_str()), Some("l2"));
    }

    #[test]
    fn leaf_paths_are_sorted_files_only() {
        let cache = sample();
        let leaves: Vec<&str> = cache.leaf_paths().collect();
        assert_eq!(
            leaves,
            vec!["Readme.md", "lib/repo.js", "lib/util/path.js", "libs.txt"]
        );
        assert_eq!(cache.root_ref(), "root");
    }
}
