use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::codec::{self, Content, ContentCodec};
use crate::error::{Error, Result};
use crate::FILE_MODE;

/// Shared handle to a cached file. Repeated reads of one path hand out
/// clones of the same `Arc`, so edits made through one handle are seen by
/// every other holder and by the next commit.
pub type Leaf = Arc<LeafObject>;

/// One file of the mirrored tree.
///
/// Tracks the content last known to match the remote (`original_content`)
/// next to the current local content. A leaf is dirty when the two differ or
/// when it was created locally and never committed.
#[derive(Debug)]
pub struct LeafObject {
    path: String,
    codec: ContentCodec,
    state: Mutex<LeafState>,
}

#[derive(Debug)]
struct LeafState {
    content: Vec<u8>,
    original: Vec<u8>,
    remote_ref: String,
    remote_url: String,
    mode: String,
    destroyed: bool,
    forced_dirty: bool,
}

impl LeafObject {
    /// Build a leaf from content fetched from the remote store.
    pub fn hydrated(
        path: impl Into<String>,
        codec: ContentCodec,
        mode: impl Into<String>,
        remote_ref: impl Into<String>,
        remote_url: impl Into<String>,
        content: Vec<u8>,
    ) -> Leaf {
        Arc::new(Self {
            path: path.into(),
            codec,
            state: Mutex::new(LeafState {
                original: content.clone(),
                content,
                remote_ref: remote_ref.into(),
                remote_url: remote_url.into(),
                mode: mode.into(),
                destroyed: false,
                forced_dirty: false,
            }),
        })
    }

    /// Build an empty leaf that does not exist remotely yet.
    pub fn created(path: impl Into<String>, codec: ContentCodec) -> Leaf {
        Arc::new(Self {
            path: path.into(),
            codec,
            state: Mutex::new(LeafState {
                content: Vec::new(),
                original: Vec::new(),
                remote_ref: String::new(),
                remote_url: String::new(),
                mode: FILE_MODE.to_string(),
                destroyed: false,
                forced_dirty: true,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, LeafState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutable_state(&self) -> Result<MutexGuard<'_, LeafState>> {
        let state = self.state();
        if state.destroyed {
            return Err(Error::ObjectDestroyed(self.path.clone()));
        }
        Ok(state)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn codec(&self) -> ContentCodec {
        self.codec
    }

    pub fn mode(&self) -> String {
        self.state().mode.clone()
    }

    /// Remote object id; empty for leaves created locally.
    pub fn remote_ref(&self) -> String {
        self.state().remote_ref.clone()
    }

    pub fn remote_url(&self) -> String {
        self.state().remote_url.clone()
    }

    /// Current raw content.
    pub fn content(&self) -> Vec<u8> {
        self.state().content.clone()
    }

    /// Content as last known to match the remote store.
    pub fn original_content(&self) -> Vec<u8> {
        self.state().original.clone()
    }

    pub fn size(&self) -> usize {
        self.state().content.len()
    }

    /// Current content run through this leaf's codec.
    pub fn decoded(&self) -> Result<Content> {
        let raw = self.content();
        self.codec.decode(&self.path, &raw)
    }

    pub fn original_decoded(&self) -> Result<Content> {
        let raw = self.original_content();
        self.codec.decode(&self.path, &raw)
    }

    pub fn text(&self) -> Result<String> {
        codec::decode_text(&self.path, &self.content())
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        codec::decode_json(&self.path, &self.content())
    }

    pub fn original_json(&self) -> Result<serde_json::Value> {
        codec::decode_json(&self.path, &self.original_content())
    }

    pub fn set_content(&self, content: impl Into<Vec<u8>>) -> Result<()> {
        let mut state = self.mutable_state()?;
        state.content = content.into();
        Ok(())
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        self.set_content(text.as_bytes())
    }

    pub fn set_json(&self, value: &serde_json::Value) -> Result<()> {
        self.set_content(codec::encode_json(value))
    }

    pub fn set_decoded(&self, content: &Content) -> Result<()> {
        self.set_content(self.codec.encode(content))
    }

    pub fn is_dirty(&self) -> bool {
        let state = self.state();
        state.forced_dirty || state.content != state.original
    }

    /// Flag the leaf dirty even when its content is unchanged.
    pub fn mark_dirty(&self) -> Result<()> {
        self.mutable_state()?.forced_dirty = true;
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Mark the leaf dead. Every later mutation fails with
    /// [`Error::ObjectDestroyed`]; reads keep returning the last content.
    pub fn destroy(&self) {
        let mut state = self.state();
        if !state.destroyed {
            debug!(path = %self.path, "Destroyed leaf");
        }
        state.destroyed = true;
    }

    /// Adopt the current content as the new remote baseline.
    pub fn reset_original(&self) {
        let mut state = self.state();
        state.original = state.content.clone();
        state.forced_dirty = false;
    }
}
