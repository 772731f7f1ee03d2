//! Configuration for git-data sessions.
//!
//! A session is bound to one repository branch on one remote. Both halves
//! live in `gitdata.toml`; every field has a default so partial files load.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "gitdata.toml";

/// Environment variables consulted, in order, when no token is configured.
pub const TOKEN_ENV_VARS: &[&str] = &["GITDATA_TOKEN", "GITHUB_TOKEN"];

/// Top-level configuration (persisted as `gitdata.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GitDataConfig {
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Prepended, followed by a space, to every commit message.
    #[serde(default)]
    pub commit_prefix: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            commit_prefix: String::new(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "gitdata".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}

impl GitDataConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse gitdata config")
    }

    /// Fill an empty token from the environment.
    /// Returns true when any field was updated.
    pub fn apply_env_overrides(&mut self) -> bool {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> bool {
        if !self.remote.token.is_empty() {
            return false;
        }
        for key in TOKEN_ENV_VARS {
            if let Some(token) = lookup(key).filter(|t| !t.trim().is_empty()) {
                self.remote.token = token.trim().to_string();
                return true;
            }
        }
        false
    }

    /// Check that the config names a repository and carries credentials.
    pub fn validate(&self) -> Result<()> {
        if self.session.owner.trim().is_empty() {
            bail!("session.owner must be set");
        }
        if self.session.repo.trim().is_empty() {
            bail!("session.repo must be set");
        }
        if self.session.branch.trim().is_empty() {
            bail!("session.branch must be set");
        }
        if self.remote.token.trim().is_empty() {
            bail!(
                "remote.token must be set (or export one of {})",
                TOKEN_ENV_VARS.join(", ")
            );
        }
        Ok(())
    }
}

/// Load config from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<GitDataConfig> {
    if !path.exists() {
        return Ok(GitDataConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read gitdata config at {}", path.display()))?;
    let config: GitDataConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse gitdata config at {}", path.display()))?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &GitDataConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize gitdata config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write gitdata config at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let cfg = GitDataConfig::default();
        assert_eq!(cfg.remote.api_url, "https://api.github.com");
        assert_eq!(cfg.remote.timeout_secs, 30);
        assert_eq!(cfg.session.branch, "main");
        assert!(cfg.session.commit_prefix.is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = GitDataConfig::from_toml_str(
            r#"
[session]
owner = "nucleartide"
repo = "git-data-test"
commit_prefix = "[automated]"
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.session.owner, "nucleartide");
        assert_eq!(cfg.session.repo, "git-data-test");
        assert_eq!(cfg.session.branch, "main");
        assert_eq!(cfg.session.commit_prefix, "[automated]");
        assert_eq!(cfg.remote, RemoteSettings::default());
    }

    #[test]
    fn env_token_fills_only_empty_token() {
        let mut cfg = GitDataConfig::default();
        let changed = cfg.apply_env_overrides_from(|key| match key {
            "GITHUB_TOKEN" => Some("ghp_fallback".to_string()),
            _ => None,
        });
        assert!(changed);
        assert_eq!(cfg.remote.token, "ghp_fallback");

        let changed = cfg.apply_env_overrides_from(|_| Some("other".to_string()));
        assert!(!changed);
        assert_eq!(cfg.remote.token, "ghp_fallback");
    }

    #[test]
    fn gitdata_token_wins_over_github_token() {
        let mut cfg = GitDataConfig::default();
        cfg.apply_env_overrides_from(|key| Some(format!("from-{key}")));
        assert_eq!(cfg.remote.token, "from-GITDATA_TOKEN");
    }

    #[test]
    fn validate_requires_repo_identity_and_token() {
        let mut cfg = GitDataConfig::default();
        assert!(cfg.validate().is_err());

        cfg.session.owner = "nucleartide".into();
        cfg.session.repo = "git-data.js".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("remote.token"), "{err}");

        cfg.remote.token = "asdf".into();
        cfg.validate().expect("complete config validates");
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut cfg = GitDataConfig::default();
        cfg.session.owner = "nucleartide".into();
        cfg.session.repo = "git-data.js".into();
        cfg.session.branch = "release/v1".into();
        cfg.remote.timeout_secs = 5;
        save_config(&path, &cfg).expect("save config");

        let loaded = load_config(&path).expect("load config");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config(&tmp.path().join(CONFIG_FILE_NAME)).expect("load");
        assert_eq!(cfg, GitDataConfig::default());
    }
}
