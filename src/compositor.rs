//! The compositing engine.
//!
//! [`compose`] turns a validated [`RenderRequest`] plus the fetched avatar and
//! the theme frame into encoded output bytes. It is synchronous and CPU
//! bound; the server runs it on a blocking thread.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};

use crate::asset::ImageAsset;
use crate::error::FrameResult;
use crate::layer::overlay::{build_text_overlay, EmojiOverlay};
use crate::layer::{encode_png, AvatarLayer, FrameLayer, LayerStack, MaskShape};
use crate::request::{OutputFormat, RenderRequest};

/// JPEG quality used for `format=jpg`.
pub const JPEG_QUALITY: u8 = 90;

/// Encoded output of a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl RenderedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

// ============================================================================
// Compose
// ============================================================================

/// Renders a framed avatar.
///
/// `frame` is `None` only on the lenient path when the theme has no frame;
/// the avatar is then composited alone.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(
        identifier = %request.identifier,
        theme = %request.theme,
        size = request.size,
        avatar = ?avatar.origin(),
        avatar_width = avatar.size().width,
        avatar_height = avatar.size().height,
        framed = frame.is_some(),
    )
)]
pub fn compose(
    request: &RenderRequest,
    avatar: &ImageAsset,
    frame: Option<&ImageAsset>,
) -> FrameResult<RenderedImage> {
    let stack = build_stack(request, avatar, frame)?;

    let bytes = match request.format {
        OutputFormat::Png => encode_png(&stack.composite()?)?,
        OutputFormat::Jpg => encode_jpeg(&stack.composite()?)?,
        OutputFormat::Svg => stack.to_svg()?.into_bytes(),
    };
    tracing::debug!(format = ?request.format, bytes = bytes.len(), "composed");

    Ok(RenderedImage {
        bytes,
        format: request.format,
    })
}

/// Prepares every layer of the request.
pub fn build_stack(
    request: &RenderRequest,
    avatar: &ImageAsset,
    frame: Option<&ImageAsset>,
) -> FrameResult<LayerStack> {
    let size = request.size;
    let avatar = AvatarLayer::prepare(avatar, MaskShape::for_request(request))?;
    let frame = frame
        .map(|asset| FrameLayer::prepare(asset, size, request.accent_color))
        .transpose()?;

    let text = request
        .text
        .as_ref()
        .and_then(|t| build_text_overlay(&t.content, &t.color, t.size, t.position, size));
    let emoji = request
        .emoji
        .as_ref()
        .and_then(|e| EmojiOverlay::from_glyphs(&e.glyphs, e.size, e.position, size));

    Ok(LayerStack::new(size, request.canvas, avatar)
        .with_frame(frame)
        .with_text(text)
        .with_emoji(emoji))
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes as JPEG, flattening alpha onto white.
pub fn encode_jpeg(image: &RgbaImage) -> FrameResult<Vec<u8>> {
    let flattened = flatten_onto_white(image);
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    flattened.write_with_encoder(encoder)?;
    Ok(buffer)
}

fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let a = a as u32;
        let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::solid_png;
    use crate::asset::AssetOrigin;
    use crate::request::{AccentColor, CanvasMode, EmojiPosition, EmojiSpec, Shape, TextPosition, TextSpec};
    use image::{GenericImageView, Rgba};

    fn avatar() -> ImageAsset {
        ImageAsset::from_bytes(solid_png(120, 120, [30, 144, 255, 255]), AssetOrigin::Remote).unwrap()
    }

    /// A ring-shaped frame: opaque border, transparent middle.
    fn frame() -> ImageAsset {
        let ring = RgbaImage::from_fn(100, 100, |x, y| {
            if x < 10 || y < 10 || x >= 90 || y >= 90 {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        ImageAsset::from_bytes(encode_png(&ring).unwrap(), AssetOrigin::Frame).unwrap()
    }

    fn request(format: OutputFormat) -> RenderRequest {
        let mut request = RenderRequest::new("octocat", "base", 128);
        request.format = format;
        request
    }

    #[test]
    fn png_and_jpg_share_dimensions() {
        let png = compose(&request(OutputFormat::Png), &avatar(), Some(&frame())).unwrap();
        let jpg = compose(&request(OutputFormat::Jpg), &avatar(), Some(&frame())).unwrap();

        let png = image::load_from_memory(&png.bytes).unwrap();
        let jpg = image::load_from_memory(&jpg.bytes).unwrap();
        assert_eq!(png.dimensions(), (128, 128));
        assert_eq!(jpg.dimensions(), (128, 128));
    }

    #[test]
    fn identical_requests_produce_identical_png() {
        let req = request(OutputFormat::Png);
        let a = compose(&req, &avatar(), Some(&frame())).unwrap();
        let b = compose(&req, &avatar(), Some(&frame())).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.content_type(), "image/png");
    }

    #[test]
    fn accent_color_changes_output() {
        let plain = request(OutputFormat::Png);
        let mut tinted = plain.clone();
        tinted.accent_color = Some("#FF5733".parse::<AccentColor>().unwrap());

        let a = compose(&plain, &avatar(), Some(&frame())).unwrap();
        let b = compose(&tinted, &avatar(), Some(&frame())).unwrap();
        assert_ne!(a.bytes, b.bytes);
    }

    #[test]
    fn frame_border_covers_avatar() {
        let req = request(OutputFormat::Png).with_shape(Shape::Rect, Some(0));
        let out = compose(&req, &avatar(), Some(&frame())).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgba8();

        assert_eq!(img.get_pixel(2, 64).0, [200, 200, 200, 255]);
        assert_eq!(img.get_pixel(64, 64).0, [30, 144, 255, 255]);
    }

    #[test]
    fn missing_frame_composites_avatar_only() {
        let mut req = request(OutputFormat::Png);
        req.canvas = CanvasMode::Dark;
        let out = compose(&req, &avatar(), None).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgba8();

        assert_eq!(img.get_pixel(0, 0).0, [0x22, 0x22, 0x22, 0xFF]);
        assert_eq!(img.get_pixel(64, 64).0, [30, 144, 255, 255]);
    }

    #[test]
    fn transparent_jpg_is_flattened_onto_white() {
        let mut req = request(OutputFormat::Jpg);
        req.canvas = CanvasMode::Transparent;
        let out = compose(&req, &avatar(), None).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgb8();

        let [r, g, b] = img.get_pixel(0, 0).0;
        assert!(r > 240 && g > 240 && b > 240);
    }

    #[test]
    fn svg_inlines_layers() {
        let mut req = request(OutputFormat::Svg);
        req.text = Some(TextSpec {
            content: "Hello".into(),
            color: "#ffffff".into(),
            size: 20,
            position: TextPosition::Bottom,
        });
        req.emoji = Some(EmojiSpec {
            glyphs: vec!["🚀".into()],
            size: 40,
            position: EmojiPosition::Top,
        });

        let out = compose(&req, &avatar(), Some(&frame())).unwrap();
        assert_eq!(out.content_type(), "image/svg+xml");

        let svg = String::from_utf8(out.bytes).unwrap();
        assert!(svg.contains(r#"<clipPath id="avatarClip">"#));
        assert_eq!(svg.matches("data:image/png;base64,").count(), 2);
        assert!(svg.contains(">Hello</text>"));
        assert!(svg.contains("🚀"));
    }

    /// Number of pixels that differ between two PNG renders inside a region.
    fn changed_pixels(a: &RenderedImage, b: &RenderedImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        let a = image::load_from_memory(&a.bytes).unwrap().to_rgba8();
        let b = image::load_from_memory(&b.bytes).unwrap().to_rgba8();
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| a.get_pixel(x, y) != b.get_pixel(x, y))
            .count()
    }

    #[test]
    fn text_overlay_draws_into_raster_output() {
        let plain = request(OutputFormat::Png);
        let mut labelled = plain.clone();
        labelled.text = Some(TextSpec {
            content: "Hi".into(),
            color: "#ff0000".into(),
            size: 40,
            position: TextPosition::Center,
        });

        let a = compose(&plain, &avatar(), None).unwrap();
        let b = compose(&labelled, &avatar(), None).unwrap();

        // centered label, baseline near y = 84
        assert!(changed_pixels(&a, &b, 34..94, 44..100) > 100);
        assert_eq!(changed_pixels(&a, &b, 0..128, 0..20), 0, "nothing drawn near the top edge");
    }

    #[test]
    fn emoji_overlay_draws_into_raster_output() {
        let plain = request(OutputFormat::Png);
        let mut decorated = plain.clone();
        decorated.emoji = Some(EmojiSpec {
            glyphs: vec!["★".into()],
            size: 40,
            position: EmojiPosition::Top,
        });

        let a = compose(&plain, &avatar(), None).unwrap();
        let b = compose(&decorated, &avatar(), None).unwrap();

        // single glyph centered at (59, 45)
        assert!(changed_pixels(&a, &b, 39..79, 25..65) > 50);
        assert_eq!(changed_pixels(&a, &b, 0..128, 100..128), 0, "nothing drawn near the bottom edge");
    }

    #[test]
    fn flatten_blends_partial_alpha() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(&img);
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127]);
    }
}
