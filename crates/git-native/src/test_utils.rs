use gix::object::tree::EntryKind;
use gix::ObjectId;

use crate::ops;

pub const TEST_BRANCH: &str = "main";
pub const TEST_BRANCH_REF: &str = "refs/heads/main";

/// Initialize a bare repository for testing.
///
/// Creates `main` with one commit holding `README` and `lib/util.js`.
pub fn init_test_repo(dir: &std::path::Path) -> ObjectId {
    let repo = gix::init_bare(dir).expect("git init failed");
    let empty = ObjectId::empty_tree(repo.object_hash());

    let readme = repo.write_blob(b"test repo").expect("write blob").detach();
    let util = repo
        .write_blob(b"exports.basename = s => s")
        .expect("write blob")
        .detach();

    let mut editor = repo.edit_tree(empty).expect("edit tree");
    editor
        .upsert("README", EntryKind::Blob, readme)
        .expect("upsert README");
    editor
        .upsert("lib/util.js", EntryKind::Blob, util)
        .expect("upsert lib/util.js");
    let tree = editor.write().expect("write tree").detach();

    ops::create_commit(&repo, TEST_BRANCH_REF, tree, None, "init").expect("initial commit")
}
