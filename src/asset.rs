use std::path::Path;
use std::sync::Arc;

use crate::error::{ThiepError, ThiepResult};

/// Decoded template art in straight (non-premultiplied) RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major straight RGBA8, tightly packed.
    pub rgba8: Arc<Vec<u8>>,
}

/// Decode template image bytes (PNG, JPEG, ...) into a [`PreparedImage`].
///
/// Corrupt or truncated bytes fail with an asset-load error; no partial
/// image is ever produced.
pub fn decode_image(bytes: &[u8]) -> ThiepResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ThiepError::asset_load(format!("decode template image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PreparedImage {
        width,
        height,
        rgba8: Arc::new(rgba.into_raw()),
    })
}

/// Read and decode a template asset resolved against `assets_root`.
pub fn load_image(assets_root: &Path, asset_ref: &str) -> ThiepResult<PreparedImage> {
    let rel = normalize_rel_path(asset_ref)?;
    let path = assets_root.join(&rel);
    let bytes = std::fs::read(&path).map_err(|e| {
        ThiepError::asset_load(format!("read template asset '{}': {e}", path.display()))
    })?;
    decode_image(&bytes)
}

/// Normalize and validate registry-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and
/// rejects absolute paths or parent traversals (`..`).
pub fn normalize_rel_path(asset_ref: &str) -> ThiepResult<String> {
    let s = asset_ref.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ThiepError::validation("asset paths must be relative"));
    }

    let mut parts = Vec::new();
    for part in s.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part == ".." {
            return Err(ThiepError::validation("asset paths must not contain '..'"));
        }
        parts.push(part);
    }
    if parts.is_empty() {
        return Err(ThiepError::validation("asset path must name a file"));
    }

    Ok(parts.join("/"))
}
