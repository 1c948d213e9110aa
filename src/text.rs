use std::path::Path;

use rusttype::{Font, Scale, point};

use crate::color::Rgba8;
use crate::error::{ThiepError, ThiepResult};
use crate::surface::Surface;
use crate::template::TextBaseline;

/// A parsed font face tagged with the family name it was registered under.
///
/// Loaded once at startup; the compositor draws every template with this
/// face (single configured family).
#[derive(Clone)]
pub struct LoadedFont {
    family: String,
    font: Font<'static>,
}

impl LoadedFont {
    pub fn from_bytes(family: impl Into<String>, bytes: Vec<u8>) -> ThiepResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| ThiepError::asset_load("font bytes did not parse as a font face"))?;
        Ok(Self {
            family: family.into(),
            font,
        })
    }

    pub fn from_path(family: impl Into<String>, path: &Path) -> ThiepResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| ThiepError::asset_load(format!("read font '{}': {e}", path.display())))?;
        Self::from_bytes(family, bytes)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub(crate) fn font(&self) -> &Font<'static> {
        &self.font
    }
}

/// Advance width of `text` at `size_px`, kerning applied.
///
/// This is the measure centered alignment divides, matching canvas
/// `measureText` semantics rather than the inked bounding box.
pub fn measure_width(font: &LoadedFont, text: &str, size_px: f32) -> f32 {
    let scale = Scale::uniform(size_px);
    let glyphs: Vec<_> = font.font().layout(text, scale, point(0.0, 0.0)).collect();
    match glyphs.last() {
        Some(g) => g.position().x + g.unpositioned().h_metrics().advance_width,
        None => 0.0,
    }
}

/// Vertical distance from the anchor row to the glyph baseline for the given
/// baseline policy.
///
/// `Middle` centers the em box on the anchor row: the baseline sits
/// `(ascent + descent) / 2` below it (descent is negative).
pub fn baseline_shift(font: &LoadedFont, size_px: f32, baseline: TextBaseline) -> f32 {
    match baseline {
        TextBaseline::Alphabetic => 0.0,
        TextBaseline::Middle => {
            let m = font.font().v_metrics(Scale::uniform(size_px));
            (m.ascent + m.descent) / 2.0
        }
    }
}

/// Draw one glyph run with its baseline at `(left_x, baseline_y)`, blending
/// antialiasing coverage over the surface.
///
/// Glyphs that fall outside the surface clip at its edges; a run wider than
/// the surface draws whatever fits and discards the rest.
pub(crate) fn draw_run(
    surface: &mut Surface,
    font: &LoadedFont,
    text: &str,
    size_px: f32,
    left_x: f32,
    baseline_y: f32,
    color: Rgba8,
) {
    let scale = Scale::uniform(size_px);
    let width = i32::try_from(surface.width()).unwrap_or(i32::MAX);
    let height = i32::try_from(surface.height()).unwrap_or(i32::MAX);
    let row_stride = surface.width() as usize * 4;

    for glyph in font.font().layout(text, scale, point(left_x, baseline_y)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        let data = surface.rgba8_mut();
        glyph.draw(|gx, gy, coverage| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let i = py as usize * row_stride + px as usize * 4;
            blend_px(&mut data[i..i + 4], color, coverage);
        });
    }
}

/// Straight-alpha source-over of `color` scaled by glyph coverage.
fn blend_px(dst: &mut [u8], color: Rgba8, coverage: f32) {
    let sa = f32::from(color.a) / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let inv = 1.0 - sa;
    dst[0] = (f32::from(color.r) * sa + f32::from(dst[0]) * inv).round() as u8;
    dst[1] = (f32::from(color.g) * sa + f32::from(dst[1]) * inv).round() as u8;
    dst[2] = (f32::from(color.b) * sa + f32::from(dst[2]) * inv).round() as u8;
    dst[3] = ((sa + f32::from(dst[3]) / 255.0 * inv) * 255.0).round() as u8;
}
