//! Typed render parameters and their validation.
//!
//! A [`RenderQuery`] is the raw, string-typed query string of the framed-avatar
//! endpoint as deserialized by serde. [`RenderQuery::into_request`] validates
//! it into a [`RenderRequest`], which upholds the invariants the compositing
//! engine relies on:
//!
//! - `size` is always within [`MIN_SIZE`]..=[`MAX_SIZE`]
//! - `corner_radius` is always `<= size / 2`
//! - [`Shape::Circle`] always has `corner_radius == size / 2`
//!
//! # Example
//!
//! ```
//! use framed_avatar::{RenderQuery, Shape};
//!
//! let query = RenderQuery {
//!     size: Some("2000".into()),
//!     shape: Some("rect".into()),
//!     ..RenderQuery::default()
//! };
//! let request = query.into_request("octocat").unwrap();
//! assert_eq!(request.size, 1024);
//! assert_eq!(request.shape, Shape::Rect);
//! assert_eq!(request.corner_radius, 102);
//! ```

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};
use crate::layer::overlay::parse_emoji_list;

/// Smallest output edge in pixels.
pub const MIN_SIZE: u32 = 64;
/// Largest output edge in pixels.
pub const MAX_SIZE: u32 = 1024;
/// Output edge used when none is requested.
pub const DEFAULT_SIZE: u32 = 256;

pub const DEFAULT_THEME: &str = "base";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";
pub const DEFAULT_TEXT_SIZE: u32 = 20;
pub const DEFAULT_EMOJI_SIZE: u32 = 40;

const TEXT_SIZE_RANGE: (u32, u32) = (8, 100);
const EMOJI_SIZE_RANGE: (u32, u32) = (16, 120);

// ============================================================================
// Enumerated parameters
// ============================================================================

/// Mask shape applied to the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Circle,
    Rounded,
    Rect,
}

impl FromStr for Shape {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Ok(Self::Circle),
            "rounded" => Ok(Self::Rounded),
            "rect" => Ok(Self::Rect),
            _ => Err(FrameError::validation(
                "shape",
                "Shape must be 'circle', 'rounded', or 'rect'.",
            )),
        }
    }
}

/// Background fill policy for the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CanvasMode {
    #[default]
    Light,
    Dark,
    Transparent,
}

impl CanvasMode {
    /// Parses a canvas mode, falling back to [`CanvasMode::Light`] for
    /// anything unrecognized.
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Self::Dark,
            "transparent" => Self::Transparent,
            _ => Self::Light,
        }
    }

    /// The RGBA fill of the base canvas.
    pub fn background(self) -> Rgba<u8> {
        match self {
            Self::Light => Rgba([0xF0, 0xF0, 0xF0, 0xFF]),
            Self::Dark => Rgba([0x22, 0x22, 0x22, 0xFF]),
            Self::Transparent => Rgba([0, 0, 0, 0]),
        }
    }

    /// The SVG fill for the background rect, or `None` when nothing should
    /// be drawn.
    pub fn svg_fill(self) -> Option<&'static str> {
        match self {
            Self::Light => Some("rgb(240, 240, 240)"),
            Self::Dark => Some("rgb(34, 34, 34)"),
            Self::Transparent => None,
        }
    }
}

/// Vertical placement of the text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    #[default]
    Bottom,
    Center,
}

impl FromStr for TextPosition {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "center" => Ok(Self::Center),
            _ => Err(FrameError::validation(
                "textPosition",
                "textPosition must be 'top', 'bottom', or 'center'.",
            )),
        }
    }
}

/// Placement of the emoji glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmojiPosition {
    #[default]
    Top,
    Bottom,
    Corners,
}

impl FromStr for EmojiPosition {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "corners" => Ok(Self::Corners),
            _ => Err(FrameError::validation(
                "emojiPosition",
                "emojiPosition must be 'top', 'bottom', or 'corners'.",
            )),
        }
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
    Svg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" => Ok(Self::Jpg),
            "svg" => Ok(Self::Svg),
            _ => Err(FrameError::validation(
                "format",
                "format must be 'png', 'jpg', or 'svg'.",
            )),
        }
    }
}

// ============================================================================
// AccentColor
// ============================================================================

/// An RGB color used to tint the frame layer.
///
/// Parsed from six hex digits with an optional leading `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for AccentColor {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || {
            FrameError::validation(
                "accentColor",
                "accentColor must be a 6-digit hex color such as '#ff6b6b'.",
            )
        };
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// ============================================================================
// Overlay specs
// ============================================================================

/// A single text label drawn over the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    pub content: String,
    /// A hex color or a CSS color keyword, emitted as the SVG `fill`.
    pub color: String,
    pub size: u32,
    pub position: TextPosition,
}

/// A set of emoji glyphs drawn over the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiSpec {
    pub glyphs: Vec<String>,
    pub size: u32,
    pub position: EmojiPosition,
}

// ============================================================================
// RenderRequest
// ============================================================================

/// A fully validated render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub identifier: String,
    pub theme: String,
    pub size: u32,
    pub shape: Shape,
    pub corner_radius: u32,
    pub canvas: CanvasMode,
    pub accent_color: Option<AccentColor>,
    pub text: Option<TextSpec>,
    pub emoji: Option<EmojiSpec>,
    pub format: OutputFormat,
}

impl RenderRequest {
    /// A plain request with every optional parameter at its default.
    pub fn new(identifier: impl Into<String>, theme: impl Into<String>, size: u32) -> Self {
        let size = clamp_size(size as u64);
        Self {
            identifier: identifier.into(),
            theme: theme.into(),
            size,
            shape: Shape::Circle,
            corner_radius: resolve_corner_radius(Shape::Circle, size, None),
            canvas: CanvasMode::Light,
            accent_color: None,
            text: None,
            emoji: None,
            format: OutputFormat::Png,
        }
    }

    /// Replaces the shape, re-resolving the corner radius.
    pub fn with_shape(mut self, shape: Shape, radius: Option<u32>) -> Self {
        self.shape = shape;
        self.corner_radius = resolve_corner_radius(shape, self.size, radius);
        self
    }

    /// The `Content-Disposition` filename for this request.
    pub fn filename(&self) -> String {
        format!("{}-avatar.{}", self.identifier, self.format.extension())
    }
}

/// Clamps a requested edge length into [`MIN_SIZE`]..=[`MAX_SIZE`].
pub fn clamp_size(size: u64) -> u32 {
    size.clamp(MIN_SIZE as u64, MAX_SIZE as u64) as u32
}

/// Resolves the corner radius for a shape.
///
/// Circles always get `size / 2`. Other shapes clamp an explicit radius into
/// `0..=size / 2` and default to 10% of the size.
pub fn resolve_corner_radius(shape: Shape, size: u32, radius: Option<u32>) -> u32 {
    let half = size / 2;
    match (shape, radius) {
        (Shape::Circle, _) => half,
        (_, Some(r)) => r.min(half),
        (_, None) => size / 10,
    }
}

/// Validates the path identifier (a GitHub login).
pub fn validate_identifier(identifier: &str) -> FrameResult<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(FrameError::validation("username", "Username is required."));
    }
    let valid = identifier.len() <= 100
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(FrameError::validation(
            "username",
            "Username may only contain letters, digits, '-' and '_'.",
        ));
    }
    Ok(identifier.to_string())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Parses an all-digit string, saturating values too large for `u64`.
fn parse_digits(field: &'static str, s: &str, message: &str) -> FrameResult<u64> {
    let s = s.trim();
    if !is_digits(s) {
        return Err(FrameError::validation(field, message));
    }
    Ok(s.parse::<u64>().unwrap_or(u64::MAX))
}

fn parse_ranged(
    field: &'static str,
    value: Option<&str>,
    default: u32,
    (lo, hi): (u32, u32),
) -> FrameResult<u32> {
    match value {
        None => Ok(default),
        Some(s) => {
            let message = format!("The '{field}' parameter must be a valid integer.");
            let n = parse_digits(field, s, &message)?;
            Ok(n.clamp(lo as u64, hi as u64) as u32)
        }
    }
}

fn validate_text_color(color: &str) -> FrameResult<String> {
    let color = color.trim();
    let is_hex = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    let is_keyword =
        !color.is_empty() && color.len() <= 32 && color.chars().all(|c| c.is_ascii_alphabetic());
    if is_hex || is_keyword {
        Ok(color.to_string())
    } else {
        Err(FrameError::validation(
            "textColor",
            "textColor must be a hex color or a color keyword.",
        ))
    }
}

/// Treats empty query values the same as absent ones.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ============================================================================
// RenderQuery (serializable)
// ============================================================================

/// Raw query string of the framed-avatar endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderQuery {
    pub theme: Option<String>,
    pub size: Option<String>,
    pub shape: Option<String>,
    pub radius: Option<String>,
    pub canvas: Option<String>,
    pub accent_color: Option<String>,
    pub text: Option<String>,
    pub text_color: Option<String>,
    pub text_size: Option<String>,
    pub text_position: Option<String>,
    pub emojis: Option<String>,
    pub emoji_size: Option<String>,
    pub emoji_position: Option<String>,
    pub format: Option<String>,
}

impl RenderQuery {
    /// Validates the query into a [`RenderRequest`] for `identifier`.
    pub fn into_request(self, identifier: &str) -> FrameResult<RenderRequest> {
        let identifier = validate_identifier(identifier)?;

        let theme = match self.theme.as_deref() {
            None => DEFAULT_THEME.to_string(),
            Some(t) if t.trim().is_empty() => {
                return Err(FrameError::validation("theme", "Theme is required."));
            }
            Some(t) => t.trim().to_string(),
        };

        let size = match present(&self.size) {
            None => DEFAULT_SIZE,
            Some(s) => clamp_size(parse_digits(
                "size",
                s,
                "The 'size' parameter must be a valid integer.",
            )?),
        };

        let shape = present(&self.shape).map(Shape::from_str).transpose()?.unwrap_or_default();

        // A malformed radius is ignored rather than rejected.
        let radius = present(&self.radius)
            .filter(|r| is_digits(r))
            .map(|r| r.parse::<u32>().unwrap_or(u32::MAX));
        let corner_radius = resolve_corner_radius(shape, size, radius);

        let canvas = present(&self.canvas).map(CanvasMode::parse_lenient).unwrap_or_default();

        let accent_color = present(&self.accent_color)
            .map(AccentColor::from_str)
            .transpose()?;

        let text_size = parse_ranged("textSize", present(&self.text_size), DEFAULT_TEXT_SIZE, TEXT_SIZE_RANGE)?;
        let text_position = present(&self.text_position)
            .map(TextPosition::from_str)
            .transpose()?
            .unwrap_or_default();

        let emoji_size = parse_ranged("emojiSize", present(&self.emoji_size), DEFAULT_EMOJI_SIZE, EMOJI_SIZE_RANGE)?;
        let emoji_position = present(&self.emoji_position)
            .map(EmojiPosition::from_str)
            .transpose()?
            .unwrap_or_default();

        let format = present(&self.format)
            .map(OutputFormat::from_str)
            .transpose()?
            .unwrap_or_default();

        // textColor is only checked when there is text to color.
        let text_color = present(&self.text_color).unwrap_or(DEFAULT_TEXT_COLOR);
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .map(|content| {
                Ok::<_, FrameError>(TextSpec {
                    content,
                    color: validate_text_color(text_color)?,
                    size: text_size,
                    position: text_position,
                })
            })
            .transpose()?;

        let emoji = self
            .emojis
            .map(|csv| parse_emoji_list(&csv))
            .filter(|glyphs| !glyphs.is_empty())
            .map(|glyphs| EmojiSpec {
                glyphs,
                size: emoji_size,
                position: emoji_position,
            });

        Ok(RenderRequest {
            identifier,
            theme,
            size,
            shape,
            corner_radius,
            canvas,
            accent_color,
            text,
            emoji,
            format,
        })
    }
}

/// Query string of the lenient frames endpoint.
///
/// This endpoint never rejects cosmetic parameters: a malformed size or
/// accent color falls back to the default instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LenientQuery {
    pub username: Option<String>,
    pub theme: Option<String>,
    pub size: Option<String>,
    pub canvas: Option<String>,
    pub accent_color: Option<String>,
}

impl LenientQuery {
    /// Validates the query. Only a missing or malformed username is an error.
    pub fn into_request(self) -> FrameResult<RenderRequest> {
        let identifier = validate_identifier(self.username.as_deref().unwrap_or_default())?;
        let theme = present(&self.theme).unwrap_or(DEFAULT_THEME).to_string();
        let size = present(&self.size)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(clamp_size)
            .unwrap_or(DEFAULT_SIZE);

        let mut request = RenderRequest::new(identifier, theme, size).with_shape(Shape::Rect, Some(0));
        request.canvas = present(&self.canvas).map(CanvasMode::parse_lenient).unwrap_or_default();
        request.accent_color = present(&self.accent_color).and_then(|c| c.parse().ok());
        Ok(request)
    }
}

// ============================================================================
// Tests
// ============================================================================
