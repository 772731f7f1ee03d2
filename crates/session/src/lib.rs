//! Treat a branch of a remote git repository like a small file system.
//!
//! A [`RepoSession`] reads files through the remote's Git Data primitives,
//! keeps edits in memory and writes them back as one commit per
//! [`RepoSession::commit`] call.

mod reconcile;
pub mod session;
pub mod tree_cache;

use std::time::Duration;

use anyhow::Result;

pub use gitdata_api_client::GitHubClient;
pub use gitdata_core::{ContentCodec, Error, Leaf, LeafObject, RemoteError, RemoteStore};
pub use gitdata_runtime_config::GitDataConfig;
pub use session::{RepoSession, SessionIdentity};
pub use tree_cache::TreeCache;

/// Open a session against the GitHub API described by `config`.
///
/// An empty token is filled from `GITDATA_TOKEN` or `GITHUB_TOKEN`.
pub fn connect(config: &GitDataConfig) -> Result<RepoSession<GitHubClient>> {
    connect_with_env(config, |key| std::env::var(key).ok())
}

fn connect_with_env(
    config: &GitDataConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RepoSession<GitHubClient>> {
    let mut config = config.clone();
    config.apply_env_overrides_from(lookup);
    config.validate()?;
    let client = GitHubClient::new(
        &config.remote.api_url,
        &config.remote.token,
        &config.session.owner,
        &config.session.repo,
        Duration::from_secs(config.remote.timeout_secs),
        &config.remote.user_agent,
    )?;
    Ok(RepoSession::new(client, SessionIdentity::from(&config.session)))
}
