//! The masked avatar layer.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::FilterType;
use image::RgbaImage;

use super::mask::{MaskShape, CLIP_PATH_ID};
use super::svg::{composite_centered, SvgDocument};
use super::{encode_png, LayerEffect, RenderContext};
use crate::asset::ImageAsset;
use crate::error::FrameResult;

/// The avatar resized to the canvas and clipped to the mask shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarLayer {
    image: RgbaImage,
    mask: MaskShape,
}

impl AvatarLayer {
    /// Decodes the avatar, scales and center-crops it to `mask.size` square,
    /// then clips it to the mask.
    pub fn prepare(asset: &ImageAsset, mask: MaskShape) -> FrameResult<Self> {
        let decoded = asset.decode()?;
        let mut image = decoded
            .resize_to_fill(mask.size, mask.size, FilterType::Lanczos3)
            .to_rgba8();
        mask.apply(&mut image)?;
        Ok(Self { image, mask })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl LayerEffect for AvatarLayer {
    fn name(&self) -> &'static str {
        "avatar"
    }

    fn composite(&self, ctx: &mut RenderContext) -> FrameResult<()> {
        composite_centered(&mut ctx.canvas, &self.image);
        Ok(())
    }

    fn write_svg(&self, doc: &mut SvgDocument) -> FrameResult<()> {
        doc.define(CLIP_PATH_ID, self.mask.clip_path_markup());
        let data = BASE64.encode(encode_png(&self.image)?);
        doc.push(&format!(
            r#"<image x="0" y="0" width="{s}" height="{s}" xlink:href="data:image/png;base64,{data}" clip-path="url(#{CLIP_PATH_ID})"/>"#,
            s = doc.size(),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::solid_png;
    use crate::asset::AssetOrigin;

    #[test]
    fn non_square_avatar_is_cropped_to_square() {
        let asset = ImageAsset::from_bytes(solid_png(300, 120, [10, 20, 30, 255]), AssetOrigin::Remote).unwrap();
        let layer = AvatarLayer::prepare(&asset, MaskShape::new(64, 0)).unwrap();

        assert_eq!(layer.image().dimensions(), (64, 64));
        assert_eq!(layer.image().get_pixel(32, 32).0, [10, 20, 30, 255]);
    }

    #[test]
    fn circle_mask_is_applied() {
        let asset = ImageAsset::from_bytes(solid_png(64, 64, [200, 0, 0, 255]), AssetOrigin::Remote).unwrap();
        let layer = AvatarLayer::prepare(&asset, MaskShape::new(64, 32)).unwrap();

        assert_eq!(layer.image().get_pixel(0, 0)[3], 0);
        assert_eq!(layer.image().get_pixel(32, 32)[3], 255);
    }

    #[test]
    fn svg_markup_embeds_png_and_clip_path() {
        let asset = ImageAsset::from_bytes(solid_png(8, 8, [1, 1, 1, 255]), AssetOrigin::Remote).unwrap();
        let layer = AvatarLayer::prepare(&asset, MaskShape::new(64, 6)).unwrap();

        let mut doc = SvgDocument::new(64);
        layer.write_svg(&mut doc).unwrap();
        let svg = doc.finish();

        assert!(svg.contains(r#"<clipPath id="avatarClip">"#));
        assert!(svg.contains("data:image/png;base64,"));
        assert!(svg.contains(r#"clip-path="url(#avatarClip)""#));
    }
}
