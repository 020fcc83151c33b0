//! Accent-color tinting of the frame layer.
//!
//! Tinting is a fixed two-step transform: a brightness/saturation modulation
//! in CIE LCh, followed by a per-channel multiply by the accent color.

use image::RgbaImage;
use palette::{IntoColor, Lch, Srgb};

use crate::request::AccentColor;

/// Parameters of the modulate-then-multiply transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TintParams {
    /// Lightness multiplier.
    pub brightness: f32,
    /// Chroma multiplier.
    pub saturation: f32,
    /// Multiplicative tint.
    pub color: AccentColor,
}

impl TintParams {
    pub const BRIGHTNESS: f32 = 1.1;
    pub const SATURATION: f32 = 1.3;

    /// The standard frame tint for an accent color.
    pub fn accent(color: AccentColor) -> Self {
        Self {
            brightness: Self::BRIGHTNESS,
            saturation: Self::SATURATION,
            color,
        }
    }
}

/// Applies the tint to every visible pixel in place. Alpha is untouched.
pub fn tint_pixels(image: &mut RgbaImage, params: &TintParams) {
    let tint = [params.color.r, params.color.g, params.color.b].map(|c| c as f32 / 255.0);

    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }

        let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        let modulated = modulate(rgb, params.brightness, params.saturation);

        pixel.0 = [
            to_u8(modulated.red * tint[0]),
            to_u8(modulated.green * tint[1]),
            to_u8(modulated.blue * tint[2]),
            a,
        ];
    }
}

/// Scales lightness and chroma of a color.
fn modulate(rgb: Srgb, brightness: f32, saturation: f32) -> Srgb {
    let mut lch: Lch = rgb.into_color();
    lch.l = (lch.l * brightness).min(100.0);
    lch.chroma *= saturation;
    lch.into_color()
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
