pub mod error;
pub mod ops;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{GitStorageError, Result};
pub use store::LocalGitStore;

/// Prefix of branch refs.
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Full ref name for a branch.
pub fn branch_ref(branch: &str) -> String {
    format!("{HEADS_PREFIX}{branch}")
}
