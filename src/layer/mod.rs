//! Layer infrastructure for framed-avatar composition.
//!
//! A render is a fixed stack of layers painted bottom to top onto a
//! canvas-sized RGBA image:
//!
//! ```text
//! Background (canvas mode)
//!     │
//!     ▼
//! ┌─────────┐
//! │ Avatar  │ ◄── resized, center-cropped, masked
//! └────┬────┘
//!      │
//!      ▼
//! ┌─────────┐
//! │  Frame  │ ◄── optional; letterboxed, resized, tinted
//! └────┬────┘
//!      │
//!      ▼
//! ┌─────────┐
//! │  Text   │ ◄── optional vector overlay
//! └────┬────┘
//!      │
//!      ▼
//! ┌─────────┐
//! │  Emoji  │ ◄── optional vector overlay
//! └─────────┘
//! ```
//!
//! Every layer implements [`LayerEffect`], which knows how to paint itself
//! onto a raster [`RenderContext`] and how to describe itself as SVG markup.
//! The two paths share the same prepared layers, so PNG/JPEG and SVG output
//! agree on geometry.

pub mod avatar;
pub mod frame;
pub mod mask;
pub mod overlay;
pub mod svg;
pub mod tint;

pub use avatar::AvatarLayer;
pub use frame::FrameLayer;
pub use mask::MaskShape;
pub use overlay::{EmojiOverlay, TextOverlay};
pub use svg::SvgDocument;
pub use tint::{tint_pixels, TintParams};

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::FrameResult;
use crate::request::CanvasMode;
use overlay::{TEXT_SHADOW_FILTER, TEXT_SHADOW_ID};

// ============================================================================
// Render Context
// ============================================================================

/// The canvas flowing through the raster pipeline.
pub struct RenderContext {
    /// The image being painted. Always square.
    pub canvas: RgbaImage,
}

impl RenderContext {
    /// Creates a canvas of `size`×`size` filled with the canvas mode's
    /// background.
    pub fn new(size: u32, canvas: CanvasMode) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(size, size, canvas.background()),
        }
    }

    pub fn size(&self) -> u32 {
        self.canvas.width()
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }
}

// ============================================================================
// Layer Trait
// ============================================================================

/// A self-contained, already prepared layer.
pub trait LayerEffect {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Paints the layer onto the raster canvas using alpha-over.
    fn composite(&self, ctx: &mut RenderContext) -> FrameResult<()>;

    /// Appends the layer's SVG markup (and any definitions it needs).
    fn write_svg(&self, doc: &mut SvgDocument) -> FrameResult<()>;
}

/// The solid canvas fill. Only contributes to SVG output, since
/// [`RenderContext::new`] already fills the raster canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundLayer(pub CanvasMode);

impl LayerEffect for BackgroundLayer {
    fn name(&self) -> &'static str {
        "background"
    }

    fn composite(&self, _ctx: &mut RenderContext) -> FrameResult<()> {
        Ok(())
    }

    fn write_svg(&self, doc: &mut SvgDocument) -> FrameResult<()> {
        if let Some(fill) = self.0.svg_fill() {
            doc.push(&format!(
                r#"<rect width="100%" height="100%" fill="{fill}"/>"#
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Layer Stack
// ============================================================================

/// The ordered set of layers for one render.
pub struct LayerStack {
    size: u32,
    background: BackgroundLayer,
    avatar: AvatarLayer,
    frame: Option<FrameLayer>,
    text: Option<TextOverlay>,
    emoji: Option<EmojiOverlay>,
}

impl LayerStack {
    pub fn new(size: u32, canvas: CanvasMode, avatar: AvatarLayer) -> Self {
        Self {
            size,
            background: BackgroundLayer(canvas),
            avatar,
            frame: None,
            text: None,
            emoji: None,
        }
    }

    pub fn with_frame(mut self, frame: Option<FrameLayer>) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_text(mut self, text: Option<TextOverlay>) -> Self {
        self.text = text;
        self
    }

    pub fn with_emoji(mut self, emoji: Option<EmojiOverlay>) -> Self {
        self.emoji = emoji;
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Active layers in paint order.
    pub fn layers(&self) -> Vec<&dyn LayerEffect> {
        let mut layers: Vec<&dyn LayerEffect> = vec![&self.background, &self.avatar];
        if let Some(frame) = &self.frame {
            layers.push(frame);
        }
        if let Some(text) = &self.text {
            layers.push(text);
        }
        if let Some(emoji) = &self.emoji {
            layers.push(emoji);
        }
        layers
    }

    /// Paints every layer onto a fresh canvas.
    pub fn composite(&self) -> FrameResult<RgbaImage> {
        let mut ctx = RenderContext::new(self.size, self.background.0);
        for layer in self.layers() {
            tracing::trace!(layer = layer.name(), "compositing layer");
            layer.composite(&mut ctx)?;
        }
        Ok(ctx.into_image())
    }

    /// Describes the stack as a standalone SVG document.
    pub fn to_svg(&self) -> FrameResult<String> {
        let mut doc = SvgDocument::new(self.size);
        doc.define(TEXT_SHADOW_ID, TEXT_SHADOW_FILTER);
        for layer in self.layers() {
            layer.write_svg(&mut doc)?;
        }
        Ok(doc.finish())
    }
}

/// Encodes an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> FrameResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::solid_png;
    use crate::asset::{AssetOrigin, ImageAsset};
    use crate::request::TextPosition;

    fn avatar(size: u32, radius: u32) -> AvatarLayer {
        let asset = ImageAsset::from_bytes(solid_png(32, 32, [0, 0, 255, 255]), AssetOrigin::Remote).unwrap();
        AvatarLayer::prepare(&asset, MaskShape::new(size, radius)).unwrap()
    }

    #[test]
    fn background_shows_through_masked_corners() {
        let stack = LayerStack::new(64, CanvasMode::Dark, avatar(64, 32));
        let image = stack.composite().unwrap();

        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(image.get_pixel(0, 0).0, [0x22, 0x22, 0x22, 0xFF]);
        assert_eq!(image.get_pixel(32, 32).0, [0, 0, 255, 255]);
    }

    #[test]
    fn transparent_canvas_keeps_corners_clear() {
        let stack = LayerStack::new(64, CanvasMode::Transparent, avatar(64, 32));
        let image = stack.composite().unwrap();
        assert_eq!(image.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn frame_is_painted_above_avatar() {
        let frame_asset = ImageAsset::from_bytes(solid_png(64, 64, [255, 0, 0, 255]), AssetOrigin::Frame).unwrap();
        let frame = FrameLayer::prepare(&frame_asset, 64, None).unwrap();

        let stack = LayerStack::new(64, CanvasMode::Light, avatar(64, 0)).with_frame(Some(frame));
        let image = stack.composite().unwrap();
        assert_eq!(image.get_pixel(32, 32).0, [255, 0, 0, 255]);
    }

    #[test]
    fn layers_are_listed_in_paint_order() {
        let text = overlay::build_text_overlay("hi", "#fff", 20, TextPosition::Bottom, 64);
        let stack = LayerStack::new(64, CanvasMode::Light, avatar(64, 0)).with_text(text);

        let names: Vec<_> = stack.layers().iter().map(|l| l.name()).collect();
        assert_eq!(names, ["background", "avatar", "text"]);
    }

    #[test]
    fn svg_orders_background_avatar_then_text() {
        let text = overlay::build_text_overlay("a < b", "#fff", 20, TextPosition::Top, 64);
        let stack = LayerStack::new(64, CanvasMode::Light, avatar(64, 32)).with_text(text);
        let svg = stack.to_svg().unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"<filter id="textShadow""#));
        assert!(svg.contains(r#"<clipPath id="avatarClip">"#));

        let background = svg.find(r#"fill="rgb(240, 240, 240)""#).unwrap();
        let image = svg.find("<image").unwrap();
        let text = svg.find("<text").unwrap();
        assert!(background < image && image < text);
        assert!(svg.contains("a &lt; b"));
    }

    #[test]
    fn transparent_svg_has_no_background_rect() {
        let stack = LayerStack::new(64, CanvasMode::Transparent, avatar(64, 0));
        let svg = stack.to_svg().unwrap();
        assert!(!svg.contains(r#"height="100%""#));
    }

    #[test]
    fn encode_png_round_trips_dimensions() {
        let bytes = encode_png(&RgbaImage::new(7, 5)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
    }
}
