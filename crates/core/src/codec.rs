use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{Error, Result};

/// How a leaf's raw bytes are presented to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentCodec {
    /// UTF-8 text.
    #[default]
    Plain,
    /// JSON document, written back tab-indented with a trailing newline.
    Json,
}

/// Decoded leaf content.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Json(serde_json::Value),
}

impl ContentCodec {
    /// Pick the codec for a path: `.json` files get [`ContentCodec::Json`].
    pub fn for_path(path: &str) -> Self {
        if path.ends_with(".json") {
            Self::Json
        } else {
            Self::Plain
        }
    }

    pub fn decode(&self, path: &str, raw: &[u8]) -> Result<Content> {
        match self {
            Self::Plain => decode_text(path, raw).map(Content::Text),
            Self::Json => decode_json(path, raw).map(Content::Json),
        }
    }

    pub fn encode(&self, content: &Content) -> Vec<u8> {
        match content {
            Content::Text(text) => text.as_bytes().to_vec(),
            Content::Json(value) => encode_json(value),
        }
    }
}

pub(crate) fn decode_text(path: &str, raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec()).map_err(|e| Error::InvalidContent {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn decode_json(path: &str, raw: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(raw).map_err(|e| Error::InvalidContent {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn encode_json(value: &serde_json::Value) -> Vec<u8> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    let written = value.serialize(&mut ser);
    debug_assert!(written.is_ok(), "serializing a Value into memory failed: {written:?}");
    out.push(b'\n');
    out
}
