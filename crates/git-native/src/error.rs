use std::path::PathBuf;

use gitdata_core::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum GitStorageError {
    #[error("not a git repository: {0}")]
    NotARepo(PathBuf),

    #[error("git error: {0}")]
    Gix(Box<dyn std::error::Error + Send + Sync>),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GitStorageError>;

impl From<GitStorageError> for RemoteError {
    fn from(e: GitStorageError) -> Self {
        match e {
            GitStorageError::NotFound(id) => RemoteError::NotFound(id),
            other => RemoteError::transport(other),
        }
    }
}
