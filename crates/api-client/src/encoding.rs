//! Transcoding between raw leaf bytes and the API's wire forms.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use gitdata_core::RemoteError;

/// Decode blob content as returned by `GET git/blobs/{sha}`.
///
/// Base64 payloads arrive wrapped at 60 columns; whitespace is dropped before
/// decoding.
pub fn decode_content(content: &str, encoding: &str) -> Result<Vec<u8>, RemoteError> {
    match encoding {
        "base64" => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map_err(|e| RemoteError::InvalidResponse(format!("bad base64 blob: {e}")))
        }
        "utf-8" | "utf8" | "" => Ok(content.as_bytes().to_vec()),
        other => Err(RemoteError::InvalidResponse(format!(
            "unsupported blob encoding: {other}"
        ))),
    }
}

pub fn encode_content(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Percent-encode one URL path segment.
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode a ref path segment by segment, keeping `/` separators.
pub fn ref_path(branch: &str) -> String {
    branch.split('/').map(segment).collect::<Vec<_>>().join("/")
}
