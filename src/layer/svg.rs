//! SVG rendering and markup utilities using resvg/usvg.
//!
//! This module provides the shared SVG rasterization used by the mask and the
//! text/emoji overlays, the alpha-over compositing used for every raster
//! layer, and a small builder for the inlined SVG output format.

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};

use crate::error::{FrameError, FrameResult};

/// Bold sans face shipped with the crate, so text renders on hosts without
/// any usable system font.
const BUNDLED_FONT: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/fonts/DejaVuSans-Bold.ttf"
));
const BUNDLED_FAMILY: &str = "DejaVu Sans";

/// Families tried, in order, for the generic `sans-serif` family.
const SANS_SERIF_CANDIDATES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "Noto Sans",
    BUNDLED_FAMILY,
];

struct Fonts {
    db: Arc<fontdb::Database>,
    sans_serif: String,
}

/// System fonts plus the bundled face, loaded once and shared by every render.
static FONTS: LazyLock<Fonts> = LazyLock::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    db.load_font_data(BUNDLED_FONT.to_vec());

    let sans_serif = sans_serif_family(&db);
    db.set_sans_serif_family(sans_serif.as_str());
    tracing::debug!(faces = db.len(), %sans_serif, "loaded fonts");

    Fonts {
        db: Arc::new(db),
        sans_serif,
    }
});

fn sans_serif_family(db: &fontdb::Database) -> String {
    SANS_SERIF_CANDIDATES
        .iter()
        .find(|name| {
            db.faces()
                .any(|face| face.families.iter().any(|(family, _)| family == *name))
        })
        .unwrap_or(&BUNDLED_FAMILY)
        .to_string()
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders an SVG document to an RGBA image.
///
/// The document is scaled uniformly so its larger dimension becomes `size`
/// pixels. Overlay and mask documents are always square and canvas-sized, so
/// in practice the scale is 1.
pub fn render_svg(svg_data: &str, size: u32) -> FrameResult<RgbaImage> {
    let opts = Options {
        font_family: FONTS.sans_serif.clone(),
        fontdb: FONTS.db.clone(),
        ..Options::default()
    };
    let tree = Tree::from_str(svg_data, &opts).map_err(|e| FrameError::svg(e.to_string()))?;

    let svg_size = tree.size();
    let scale = (size as f32) / svg_size.width().max(svg_size.height());
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| FrameError::svg(format!("cannot allocate {width}x{height} pixmap")))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
///
/// tiny_skia stores premultiplied alpha; the result is straight alpha.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination).
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;

        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }
        if src_pixel[3] == 0 {
            continue;
        }

        let dst_pixel = dest.get_pixel_mut(dx as u32, dy as u32);
        *dst_pixel = alpha_blend(*src_pixel, *dst_pixel);
    }
}

/// Composites `src` centered on `dest`.
pub fn composite_centered(dest: &mut RgbaImage, src: &RgbaImage) {
    let x = (dest.width() as i32 - src.width() as i32) / 2;
    let y = (dest.height() as i32 - src.height() as i32) / 2;
    composite_over(dest, src, x, y);
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Markup
// ============================================================================

/// Escapes text for use inside SVG element content or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats a coordinate without a trailing `.0` for whole numbers.
pub fn fmt_num(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Incrementally built square SVG document.
///
/// Definitions are keyed by id so layers sharing a filter or clip path only
/// emit it once.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    size: u32,
    defs: Vec<(String, String)>,
    body: String,
}

impl SvgDocument {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            defs: Vec::new(),
            body: String::new(),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Adds a `<defs>` entry unless one with the same id already exists.
    pub fn define(&mut self, id: &str, markup: impl Into<String>) {
        if !self.defs.iter().any(|(existing, _)| existing == id) {
            self.defs.push((id.to_string(), markup.into()));
        }
    }

    /// Appends markup to the document body.
    pub fn push(&mut self, markup: &str) {
        self.body.push_str(markup);
    }

    /// Closes the document.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.body.len() + 512);
        let _ = write!(
            out,
            r#"<svg width="{s}" height="{s}" viewBox="0 0 {s} {s}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            s = self.size
        );
        if !self.defs.is_empty() {
            out.push_str("<defs>");
            for (_, markup) in &self.defs {
                out.push_str(markup);
            }
            out.push_str("</defs>");
        }
        out.push_str(&self.body);
        out.push_str("</svg>");
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
