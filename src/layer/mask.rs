//! Avatar mask shapes and the destination-in composite.
//!
//! The mask is a rounded rectangle covering the whole canvas. A circle is the
//! degenerate case where the corner radius is half the size. The same
//! `<rect>` markup is rasterized for PNG/JPEG output and reused as the
//! `<clipPath>` of the SVG output, so both paths clip identically.

use image::RgbaImage;

use super::svg::render_svg;
use crate::error::FrameResult;
use crate::request::RenderRequest;

/// Id of the clip path emitted into SVG output.
pub const CLIP_PATH_ID: &str = "avatarClip";

/// A canvas-sized rounded rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskShape {
    pub size: u32,
    pub radius: u32,
}

impl MaskShape {
    /// Creates a mask, clamping the radius to half the size.
    pub fn new(size: u32, radius: u32) -> Self {
        Self {
            size,
            radius: radius.min(size / 2),
        }
    }

    /// The mask described by a validated request.
    pub fn for_request(request: &RenderRequest) -> Self {
        Self::new(request.size, request.corner_radius)
    }

    /// Returns true when the mask keeps every pixel.
    pub fn is_full(&self) -> bool {
        self.radius == 0
    }

    /// The `<rect>` element describing this mask.
    pub fn rect_markup(&self, fill: Option<&str>) -> String {
        let fill = fill.map(|f| format!(r#" fill="{f}""#)).unwrap_or_default();
        format!(
            r#"<rect x="0" y="0" width="{s}" height="{s}" rx="{r}" ry="{r}"{fill}/>"#,
            s = self.size,
            r = self.radius,
        )
    }

    /// The `<clipPath>` definition used by SVG output.
    pub fn clip_path_markup(&self) -> String {
        format!(
            r#"<clipPath id="{CLIP_PATH_ID}">{}</clipPath>"#,
            self.rect_markup(None)
        )
    }

    /// Rasterizes the mask; coverage is carried in the alpha channel.
    pub fn rasterize(&self) -> FrameResult<RgbaImage> {
        let svg = format!(
            r#"<svg width="{s}" height="{s}" xmlns="http://www.w3.org/2000/svg">{rect}</svg>"#,
            s = self.size,
            rect = self.rect_markup(Some("#fff")),
        );
        render_svg(&svg, self.size)
    }

    /// Clips `target` to this mask in place.
    pub fn apply(&self, target: &mut RgbaImage) -> FrameResult<()> {
        if self.is_full() {
            return Ok(());
        }
        let mask = self.rasterize()?;
        apply_destination_in(target, &mask);
        Ok(())
    }
}

/// Destination-in composite: keeps `target` only where `mask` is opaque.
///
/// Each target alpha is multiplied by the mask alpha at the same position.
/// Target pixels outside the mask bounds become fully transparent.
pub fn apply_destination_in(target: &mut RgbaImage, mask: &RgbaImage) {
    for (x, y, pixel) in target.enumerate_pixels_mut() {
        let coverage = if x < mask.width() && y < mask.height() {
            mask.get_pixel(x, y)[3] as u16
        } else {
            0
        };
        let alpha = (pixel[3] as u16 * coverage + 127) / 255;
        if alpha == 0 {
            pixel.0 = [0, 0, 0, 0];
        } else {
            pixel.0[3] = alpha as u8;
        }
    }
}
