//! Request and response bodies of the GitHub Git Data API.

use serde::{Deserialize, Serialize};

use gitdata_core::EntryKind;

#[derive(Debug, Clone, Deserialize)]
pub struct GitObjectRef {
    pub sha: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub object: GitObjectRef,
}

/// `GET git/refs/heads/{branch}` answers with a list when the name only
/// matches refs by prefix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefLookup {
    Exact(GitRef),
    Partial(Vec<GitRef>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub message: String,
    pub tree: GitObjectRef,
    #[serde(default)]
    pub parents: Vec<GitObjectRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitTreeItem {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitTree {
    pub sha: String,
    #[serde(default)]
    pub url: String,
    pub tree: Vec<GitTreeItem>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitBlob {
    pub sha: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTreeItem {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTreeRequest {
    pub tree: Vec<NewTreeItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBlobRequest {
    pub content: String,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRefRequest {
    pub sha: String,
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
