//! The decorative frame layer.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::svg::{composite_centered, SvgDocument};
use super::tint::{tint_pixels, TintParams};
use super::{encode_png, LayerEffect, RenderContext};
use crate::asset::ImageAsset;
use crate::error::FrameResult;
use crate::request::AccentColor;

/// The frame, letterboxed to a square, resized to the canvas and optionally
/// tinted.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayer {
    image: RgbaImage,
}

impl FrameLayer {
    pub fn prepare(asset: &ImageAsset, size: u32, accent: Option<AccentColor>) -> FrameResult<Self> {
        let decoded = asset.decode()?.to_rgba8();
        let square = pad_to_square(&decoded);
        let mut image = imageops::resize(&square, size, size, FilterType::Lanczos3);

        if let Some(color) = accent {
            tint_pixels(&mut image, &TintParams::accent(color));
        }

        Ok(Self { image })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Centers `image` on a transparent square whose side is its longer edge.
pub fn pad_to_square(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == height {
        return image.clone();
    }
    let side = width.max(height);
    let mut square = RgbaImage::new(side, side);
    let x = (side - width) / 2;
    let y = (side - height) / 2;
    imageops::replace(&mut square, image, x as i64, y as i64);
    square
}

impl LayerEffect for FrameLayer {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn composite(&self, ctx: &mut RenderContext) -> FrameResult<()> {
        composite_centered(&mut ctx.canvas, &self.image);
        Ok(())
    }

    fn write_svg(&self, doc: &mut SvgDocument) -> FrameResult<()> {
        let data = BASE64.encode(encode_png(&self.image)?);
        doc.push(&format!(
            r#"<image x="0" y="0" width="{s}" height="{s}" xlink:href="data:image/png;base64,{data}"/>"#,
            s = doc.size(),
        ));
        Ok(())
    }
}
