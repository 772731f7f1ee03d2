use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use gitdata_core::{
    EntrySource, NewTreeEntry, ObjectId, RemoteCommit, RemoteError, RemoteLeaf, RemoteReference,
    RemoteResult, RemoteStore, RemoteTree, TreeEntry,
};

use crate::encoding::{self, decode_content, encode_content, ref_path};
use crate::wire::*;

/// Typed client for the GitHub Git Data API, bound to one repository.
///
/// Stateless apart from connection reuse: every [`RemoteStore`] call maps to
/// exactly one HTTP request (two when a leaf must be uploaded as a blob
/// first) and nothing is retried.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `owner/repo` at `base_url`.
    pub fn new(
        base_url: &str,
        token: &str,
        owner: &str,
        repo: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        if token.trim().is_empty() {
            bail!("must pass in a GitHub access token");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self::with_client(client, base_url, token, owner, repo))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/git{}",
            self.base_url,
            encoding::segment(&self.owner),
            encoding::segment(&self.repo),
            path
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> RemoteResult<T> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(RemoteError::transport)?;
        parse_response(resp).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: &B,
    ) -> RemoteResult<T> {
        debug!(%method, %url, "send");
        let resp = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(body)
            .send()
            .await
            .map_err(RemoteError::transport)?;
        parse_response(resp).await
    }

    /// Upload raw bytes as a blob, returning its sha.
    pub async fn create_blob(&self, raw: &[u8]) -> RemoteResult<ObjectId> {
        let body = CreateBlobRequest {
            content: encode_content(raw),
            encoding: "base64",
        };
        let created: GitObjectRef = self
            .send_json(reqwest::Method::POST, self.url("/blobs"), &body)
            .await?;
        Ok(created.sha)
    }

    async fn tree_item(&self, entry: &NewTreeEntry) -> RemoteResult<NewTreeItem> {
        let (sha, content) = match &entry.source {
            EntrySource::Ref(sha) => (Some(sha.clone()), None),
            EntrySource::Content(raw) => match std::str::from_utf8(raw) {
                Ok(text) => (None, Some(text.to_string())),
                // Inline tree content must be text; binary goes through a blob.
                Err(_) => (Some(self.create_blob(raw).await?), None),
            },
        };
        Ok(NewTreeItem {
            path: entry.path.clone(),
            mode: entry.mode.clone(),
            kind: entry.kind,
            sha,
            content,
        })
    }
}

fn tree_from_wire(tree: GitTree) -> RemoteResult<RemoteTree> {
    if tree.truncated {
        return Err(RemoteError::InvalidResponse(format!(
            "tree {} listing was truncated",
            tree.sha
        )));
    }
    let entries = tree
        .tree
        .into_iter()
        .map(|item| TreeEntry {
            path: item.path,
            mode: item.mode,
            kind: item.kind,
            remote_ref: item.sha,
            remote_url: item.url.unwrap_or_default(),
        })
        .collect();
    Ok(RemoteTree {
        root_ref: tree.sha,
        root_url: tree.url,
        entries,
    })
}

fn commit_from_wire(commit: GitCommit) -> RemoteCommit {
    RemoteCommit {
        commit_id: commit.sha,
        tree_id: commit.tree.sha,
        parents: commit.parents.into_iter().map(|p| p.sha).collect(),
        message: commit.message,
        url: commit.url,
    }
}

fn reference_from_wire(git_ref: GitRef) -> RemoteReference {
    RemoteReference {
        name: git_ref.name,
        head_commit: git_ref.object.sha,
        url: git_ref.url,
    }
}

/// Ref lookups report a missing branch as `ReferenceNotFound`.
fn missing_ref(branch: &str, e: RemoteError) -> RemoteError {
    match e {
        RemoteError::NotFound(_) => RemoteError::ReferenceNotFound(branch.to_string()),
        other => other,
    }
}

impl RemoteStore for GitHubClient {
    async fn get_reference(&self, branch: &str) -> RemoteResult<RemoteReference> {
        let url = self.url(&format!("/refs/heads/{}", ref_path(branch)));
        let lookup: RefLookup = self.get(url).await.map_err(|e| missing_ref(branch, e))?;
        let wanted = format!("refs/heads/{branch}");
        match lookup {
            RefLookup::Exact(git_ref) if git_ref.name == wanted => Ok(reference_from_wire(git_ref)),
            _ => Err(RemoteError::ReferenceNotFound(branch.to_string())),
        }
    }

    async fn get_commit(&self, commit_id: &str) -> RemoteResult<RemoteCommit> {
        let commit: GitCommit = self.get(self.url(&format!("/commits/{commit_id}"))).await?;
        Ok(commit_from_wire(commit))
    }

    async fn get_tree(&self, tree_id: &str, recursive: bool) -> RemoteResult<RemoteTree> {
        let mut url = self.url(&format!("/trees/{tree_id}"));
        if recursive {
            url.push_str("?recursive=1");
        }
        tree_from_wire(self.get(url).await?)
    }

    async fn get_leaf(&self, object_id: &str) -> RemoteResult<RemoteLeaf> {
        let blob: GitBlob = self.get(self.url(&format!("/blobs/{object_id}"))).await?;
        let content = decode_content(&blob.content, &blob.encoding)?;
        Ok(RemoteLeaf {
            remote_ref: blob.sha,
            remote_url: blob.url,
            size: blob.size,
            content,
        })
    }

    async fn create_tree(
        &self,
        entries: &[NewTreeEntry],
        base_tree: Option<&str>,
    ) -> RemoteResult<RemoteTree> {
        let mut tree = Vec::with_capacity(entries.len());
        for entry in entries {
            tree.push(self.tree_item(entry).await?);
        }
        let body = CreateTreeRequest {
            tree,
            base_tree: base_tree.map(str::to_string),
        };
        let created: GitTree = self
            .send_json(reqwest::Method::POST, self.url("/trees"), &body)
            .await?;
        tree_from_wire(created)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_id: &str,
        parents: &[ObjectId],
    ) -> RemoteResult<RemoteCommit> {
        let body = CreateCommitRequest {
            message: message.to_string(),
            tree: tree_id.to_string(),
            parents: parents.to_vec(),
        };
        let created: GitCommit = self
            .send_json(reqwest::Method::POST, self.url("/commits"), &body)
            .await?;
        Ok(commit_from_wire(created))
    }

    async fn update_reference(
        &self,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> RemoteResult<RemoteReference> {
        let body = UpdateRefRequest {
            sha: commit_id.to_string(),
            force,
        };
        let url = self.url(&format!("/refs/heads/{}", ref_path(branch)));
        let updated: GitRef = self
            .send_json(reqwest::Method::PATCH, url, &body)
            .await
            .map_err(|e| missing_ref(branch, e))?;
        Ok(reference_from_wire(updated))
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error carrying the status and the API's message.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> RemoteResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(status_error(status.as_u16(), body));
    }
    resp.json()
        .await
        .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

fn status_error(status: u16, body: String) -> RemoteError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.clone());
    match status {
        409 | 422 => RemoteError::Conflict { status, message },
        404 => RemoteError::NotFound(message),
        _ => RemoteError::Status { status, body },
    }
}
