use kurbo::Point;

use crate::asset::PreparedImage;
use crate::error::{ThiepError, ThiepResult};
use crate::surface::Surface;
use crate::template::{TemplateDescriptor, TextAlign, XAnchor};
use crate::text::{self, LoadedFont};

/// Renders a guest name onto template art per its descriptor.
///
/// One compositor serves every registered template; layout differences live
/// entirely in the descriptor data.
pub struct Compositor {
    font: LoadedFont,
}

impl Compositor {
    pub fn new(font: LoadedFont) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &LoadedFont {
        &self.font
    }

    /// Anchor point for a name on an asset of the given native dimensions.
    ///
    /// `y` is `round(y_fraction * height)`, so the same fraction lands on the
    /// same relative row at any asset resolution.
    pub fn anchor_point(descriptor: &TemplateDescriptor, width: u32, height: u32) -> Point {
        let x = match descriptor.text_anchor.x {
            XAnchor::Absolute(x) => x,
            XAnchor::Centered => f64::from(width) / 2.0,
        };
        let y = (f64::from(height) * descriptor.text_anchor.y_fraction).round();
        Point::new(x, y)
    }

    /// Compose a fresh surface: the asset blitted at origin, unscaled, with
    /// `guest_name` drawn at the descriptor's anchor.
    ///
    /// The name is drawn in a single pass with no wrapping, truncation, or
    /// auto-fit; a long name extends past the nominal text box and clips at
    /// the surface edge. Known cosmetic limitation, kept as-is.
    #[tracing::instrument(skip(self, asset, descriptor), fields(template = %descriptor.id))]
    pub fn compose(
        &self,
        asset: &PreparedImage,
        descriptor: &TemplateDescriptor,
        guest_name: &str,
    ) -> ThiepResult<Surface> {
        let name = guest_name.trim();
        if name.is_empty() {
            return Err(ThiepError::validation("guest name must be non-empty"));
        }
        descriptor.validate()?;

        if descriptor.font.family != self.font.family() {
            tracing::debug!(
                requested = %descriptor.font.family,
                loaded = %self.font.family(),
                "descriptor font family differs from the loaded face"
            );
        }

        // Surface dimensions are pixel-exact copies of the asset; downstream
        // consumers rely on never being letterboxed or pre-scaled.
        let mut surface =
            Surface::from_rgba8(asset.width, asset.height, asset.rgba8.as_ref().clone())?;

        let anchor = Self::anchor_point(descriptor, asset.width, asset.height);
        let size_px = descriptor.font.size_px;

        let left_x = match descriptor.text_align {
            TextAlign::Left => anchor.x as f32,
            TextAlign::Center => {
                anchor.x as f32 - text::measure_width(&self.font, name, size_px) / 2.0
            }
        };
        let baseline_y =
            anchor.y as f32 + text::baseline_shift(&self.font, size_px, descriptor.text_baseline);

        text::draw_run(
            &mut surface,
            &self.font,
            name,
            size_px,
            left_x,
            baseline_y,
            descriptor.color,
        );
        Ok(surface)
    }
}
