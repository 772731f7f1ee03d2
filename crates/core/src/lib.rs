pub mod codec;
pub mod error;
pub mod leaf;
pub mod path;
pub mod remote;

pub use codec::ContentCodec;
pub use error::{Error, RemoteError, Result};
pub use leaf::{Leaf, LeafObject};
pub use remote::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Git mode string for a regular file.
pub const FILE_MODE: &str = "100644";

/// Git mode string for a directory (subtree).
pub const DIRECTORY_MODE: &str = "040000";
