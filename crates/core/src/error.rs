/// Failure reported by a [`RemoteStore`](crate::RemoteStore) implementation.
///
/// Status codes are carried exactly as the remote reported them.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("reference {0} not found")]
    ReferenceNotFound(String),

    #[error("object not found: {0}")]
    NotFound(String),

    /// Non-fast-forward ref update or a commit the remote refuses as empty.
    #[error("conflict ({status}): {message}")]
    Conflict { status: u16, message: String },

    #[error("{status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Wrap any transport-level error.
    pub fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(e))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Conflict { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) | Self::ReferenceNotFound(_) => Some(404),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("reference {0} not found")]
    ReferenceNotFound(String),

    #[error("cannot modify {0}: object was destroyed")]
    ObjectDestroyed(String),

    #[error("invalid content in {path}: {reason}")]
    InvalidContent { path: String, reason: String },

    #[error(transparent)]
    Remote(RemoteError),
}

impl Error {
    /// Remote status code behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote(e) => e.status(),
            _ => None,
        }
    }

    /// True when the remote rejected a ref update or an empty commit.
    ///
    /// Callers are expected to `invalidate()` the session and replay their
    /// edits against fresh state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_conflict())
    }
}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::ReferenceNotFound(branch) => Self::ReferenceNotFound(branch),
            other => Self::Remote(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_not_found_maps_to_local_kind() {
        let err: Error = RemoteError::ReferenceNotFound("mast".into()).into();
        assert!(matches!(err, Error::ReferenceNotFound(ref b) if b == "mast"));
        assert_eq!(err.to_string(), "reference mast not found");
    }

    #[test]
    fn conflict_keeps_remote_status() {
        let err: Error = RemoteError::Conflict {
            status: 422,
            message: "Update is not a fast forward".into(),
        }
        .into();
        assert!(err.is_conflict());
        assert_eq!(err.status(), Some(422));
        assert!(!Error::EmptyPath.is_conflict());
        assert_eq!(Error::EmptyPath.status(), None);
    }

    #[test]
    fn plain_status_is_not_a_conflict() {
        let err: Error = RemoteError::Status {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert!(!err.is_conflict());
        assert_eq!(err.status(), Some(502));
    }
}
