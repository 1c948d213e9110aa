use std::io::Cursor;

use crate::error::{ThiepError, ThiepResult};
use crate::surface::Surface;

/// Encode a surface as lossless PNG bytes.
///
/// Deterministic: identical surfaces encode to identical byte streams. The
/// alpha channel is preserved as-is.
pub fn encode_png(surface: &Surface) -> ThiepResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(
        surface.width(),
        surface.height(),
        surface.rgba8().to_vec(),
    )
    .ok_or_else(|| ThiepError::encode("surface buffer does not match its dimensions"))?;

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| ThiepError::encode(format!("write png: {e}")))?;
    Ok(bytes)
}

/// Decode PNG bytes back into a surface.
pub fn decode_png(bytes: &[u8]) -> ThiepResult<Surface> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| ThiepError::encode(format!("read png: {e}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Surface::from_rgba8(width, height, rgba.into_raw())
}
