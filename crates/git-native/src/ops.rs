use std::collections::{HashSet, VecDeque};
use std::path::Path;

use gix::object::tree::EntryKind;
use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};
use gix::{ObjectId, Repository};

use crate::error::{GitStorageError, Result};

/// Wrap any gix-compatible error into [`GitStorageError::Gix`].
pub fn gix_err(e: impl std::error::Error + Send + Sync + 'static) -> GitStorageError {
    GitStorageError::Gix(Box::new(e))
}

/// Open the git repository at `repo_path` (bare or with a work tree).
///
/// Returns [`GitStorageError::NotARepo`] when neither `.git` nor a bare
/// `HEAD` file is present.
pub fn open_repo(repo_path: &Path) -> Result<Repository> {
    let repo = gix::open(repo_path).map_err(|e| {
        if repo_path.join(".git").exists() || repo_path.join("HEAD").exists() {
            gix_err(e)
        } else {
            GitStorageError::NotARepo(repo_path.to_path_buf())
        }
    })?;
    Ok(repo)
}

/// Parse a hex object id, treating malformed ids as missing objects.
pub fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::from_hex(id.as_bytes()).map_err(|_| GitStorageError::NotFound(id.to_string()))
}

/// Find the tip commit of a ref, returning `None` if the ref doesn't exist.
pub fn find_ref_tip<'r>(repo: &'r Repository, ref_name: &str) -> Result<Option<gix::Id<'r>>> {
    match repo.try_find_reference(ref_name).map_err(gix_err)? {
        Some(reference) => {
            let id = reference.into_fully_peeled_id().map_err(gix_err)?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Get the tree [`ObjectId`] from a commit.
pub fn commit_tree_id(repo: &Repository, commit_id: ObjectId) -> Result<ObjectId> {
    let commit = repo
        .find_object(commit_id)
        .map_err(|_| GitStorageError::NotFound(commit_id.to_string()))?
        .try_into_commit()
        .map_err(gix_err)?;
    let tree_id = commit.tree_id().map_err(gix_err)?;
    Ok(tree_id.detach())
}

/// Parent ids of a commit, in order.
pub fn commit_parents(repo: &Repository, commit_id: ObjectId) -> Result<Vec<ObjectId>> {
    let commit = repo
        .find_commit(commit_id)
        .map_err(|_| GitStorageError::NotFound(commit_id.to_string()))?;
    Ok(commit.parent_ids().map(|id| id.detach()).collect())
}

/// Raw bytes of a blob.
pub fn read_blob(repo: &Repository, blob_id: ObjectId) -> Result<Vec<u8>> {
    let blob = repo
        .find_object(blob_id)
        .map_err(|_| GitStorageError::NotFound(blob_id.to_string()))?
        .try_into_blob()
        .map_err(gix_err)?;
    Ok(blob.data.clone())
}

/// Build the default committer/author signature.
pub fn make_signature() -> gix::actor::Signature {
    gix::actor::Signature {
        name: "gitdata".into(),
        email: "gitdata@localhost".into(),
        time: gix::date::Time::now_local_or_utc(),
    }
}

/// Write a commit object without touching any ref.
pub fn write_commit(
    repo: &Repository,
    tree_id: ObjectId,
    parents: &[ObjectId],
    message: &str,
) -> Result<ObjectId> {
    let sig = make_signature();
    let commit = gix::objs::Commit {
        message: message.into(),
        tree: tree_id,
        author: sig.clone(),
        committer: sig,
        encoding: None,
        parents: parents.to_vec().into(),
        extra_headers: Default::default(),
    };
    Ok(repo.write_object(&commit).map_err(gix_err)?.detach())
}

/// Create a commit on `ref_name`, optionally with a parent.
///
/// The ref is updated atomically: it must either not exist (when `parent` is
/// `None`) or point to `parent` (when `Some`).
pub fn create_commit(
    repo: &Repository,
    ref_name: &str,
    tree_id: ObjectId,
    parent: Option<ObjectId>,
    message: &str,
) -> Result<ObjectId> {
    let parents: Vec<ObjectId> = parent.into_iter().collect();
    let commit_id = write_commit(repo, tree_id, &parents, message)?;

    let expected = match parents.first() {
        Some(p) => PreviousValue::ExistingMustMatch(gix::refs::Target::Object(*p)),
        None => PreviousValue::MustNotExist,
    };
    edit_ref(repo, ref_name, expected, commit_id, message)?;
    Ok(commit_id)
}

/// Replace a ref target with `new_tip`, requiring the current tip to match
/// `expected_tip`.
pub fn replace_ref_tip(
    repo: &Repository,
    ref_name: &str,
    expected_tip: ObjectId,
    new_tip: ObjectId,
    message: &str,
) -> Result<()> {
    edit_ref(
        repo,
        ref_name,
        PreviousValue::ExistingMustMatch(gix::refs::Target::Object(expected_tip)),
        new_tip,
        message,
    )
}

fn edit_ref(
    repo: &Repository,
    ref_name: &str,
    expected: PreviousValue,
    new_tip: ObjectId,
    message: &str,
) -> Result<()> {
    repo.edit_references([RefEdit {
        change: Change::Update {
            log: LogChange {
                mode: RefLog::AndReference,
                force_create_reflog: false,
                message: message.into(),
            },
            expected,
            new: gix::refs::Target::Object(new_tip),
        },
        name: ref_name
            .try_into()
            .map_err(|e: gix::validate::reference::name::Error| gix_err(e))?,
        deref: false,
    }])
    .map_err(gix_err)?;
    Ok(())
}

/// Whether `ancestor` is reachable from `descendant` through parent links.
/// A commit counts as its own ancestor.
pub fn is_ancestor(repo: &Repository, ancestor: ObjectId, descendant: ObjectId) -> Result<bool> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([descendant]);
    while let Some(id) = queue.pop_front() {
        if id == ancestor {
            return Ok(true);
        }
        if !seen.insert(id) {
            continue;
        }
        queue.extend(commit_parents(repo, id)?);
    }
    Ok(false)
}

/// One entry of a tree listing, owned.
#[derive(Debug, Clone)]
pub struct ListedEntry {
    pub path: String,
    pub kind: EntryKind,
    pub id: ObjectId,
}

/// List the entries of a tree, depth-first in pre-order when `recursive`.
///
/// Paths are relative to `tree_id`.
pub fn list_tree(repo: &Repository, tree_id: ObjectId, recursive: bool) -> Result<Vec<ListedEntry>> {
    let mut out = Vec::new();
    list_tree_into(repo, tree_id, "", recursive, &mut out)?;
    Ok(out)
}

fn list_tree_into(
    repo: &Repository,
    tree_id: ObjectId,
    prefix: &str,
    recursive: bool,
    out: &mut Vec<ListedEntry>,
) -> Result<()> {
    let tree = repo
        .find_tree(tree_id)
        .map_err(|_| GitStorageError::NotFound(tree_id.to_string()))?;
    let children: Vec<ListedEntry> = {
        let decoded = tree.decode().map_err(gix_err)?;
        decoded
            .entries
            .iter()
            .map(|entry| ListedEntry {
                path: gitdata_core::path::join(prefix, &entry.filename.to_string()),
                kind: entry.mode.kind(),
                id: entry.oid.to_owned(),
            })
            .collect()
    };

    for child in children {
        let descend = recursive && matches!(child.kind, EntryKind::Tree);
        let (path, id) = (child.path.clone(), child.id);
        out.push(child);
        if descend {
            list_tree_into(repo, id, &path, true, out)?;
        }
    }
    Ok(())
}

/// Git mode string for an entry kind, in the zero-padded form remote APIs use.
pub fn mode_string(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Tree => "040000",
        EntryKind::Blob => "100644",
        EntryKind::BlobExecutable => "100755",
        EntryKind::Link => "120000",
        EntryKind::Commit => "160000",
    }
}

/// Entry kind for a mode string; unknown modes fall back to a plain blob.
pub fn kind_for_mode(mode: &str) -> EntryKind {
    match mode.trim_start_matches('0') {
        "40000" => EntryKind::Tree,
        "100755" => EntryKind::BlobExecutable,
        "120000" => EntryKind::Link,
        "160000" => EntryKind::Commit,
        _ => EntryKind::Blob,
    }
}
