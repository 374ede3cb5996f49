//! File Encoding
//!
//! Converts a user-selected file into a self-describing base64 data URL
//! usable directly as an image source, and decodes such URLs back to
//! bytes. Any readable file is accepted as-is; no size or MIME-type
//! restriction is enforced here.

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Guess a media type from the file extension. Unknown extensions fall
/// back to `application/octet-stream`.
fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Read `path` in full and encode it as a `data:` URL.
///
/// This is the codec's only suspend point: the caller awaits it before
/// the base image field is considered set.
pub async fn encode_data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read file: {}", path.display()))?;

    Ok(format!(
        "data:{};base64,{}",
        media_type_for(path),
        STANDARD.encode(&bytes)
    ))
}

/// True if `s` is a syntactically valid base64 data URL as produced by
/// [`encode_data_url`].
pub fn is_data_url(s: &str) -> bool {
    decode_data_url(s).is_ok()
}

/// Decode a data URL back to its original bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .context("not a data URL (missing data: prefix)")?;
    let (_, payload) = rest
        .split_once(";base64,")
        .context("not a base64 data URL (missing ;base64, marker)")?;
    STANDARD
        .decode(payload)
        .context("data URL payload is not valid base64")
}
