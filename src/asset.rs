//! Encoded image assets handed to the compositing engine.
//!
//! Assets come either from the local theme store (frames, fallback) or from
//! the remote avatar source. They are immutable once read; decoding happens
//! lazily inside the compositing engine.

use std::io::Cursor;

use image::{DynamicImage, ImageReader};

use crate::error::FrameResult;

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Where an asset came from. Recorded on the render span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOrigin {
    /// Fetched from the remote avatar endpoint.
    Remote,
    /// A theme's `frame.png`.
    Frame,
    /// The bundled fallback avatar.
    Fallback,
}

/// Raw encoded image bytes plus their derived pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    size: SizePx,
    origin: AssetOrigin,
}

impl ImageAsset {
    /// Wraps encoded bytes, probing the header for the pixel dimensions.
    ///
    /// Fails if the format cannot be guessed or the header is unreadable.
    pub fn from_bytes(bytes: Vec<u8>, origin: AssetOrigin) -> FrameResult<Self> {
        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Self {
            bytes,
            size: SizePx::new(width, height),
            origin,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> SizePx {
        self.size
    }

    pub fn origin(&self) -> AssetOrigin {
        self.origin
    }

    /// Decodes the full image.
    pub fn decode(&self) -> FrameResult<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    /// Encodes a solid-color PNG of the given size.
    pub(crate) fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn from_bytes_probes_dimensions() {
        let asset = ImageAsset::from_bytes(solid_png(40, 20, [1, 2, 3, 255]), AssetOrigin::Frame)
            .unwrap();
        assert_eq!(asset.size(), SizePx::new(40, 20));
        assert_eq!(asset.origin(), AssetOrigin::Frame);

        let decoded = asset.decode().unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let result = ImageAsset::from_bytes(b"definitely not an image".to_vec(), AssetOrigin::Remote);
        assert!(result.is_err());
    }
}
