//! Text and emoji overlay layers.
//!
//! Overlays are vector layers. Each one can emit its bare `<text>` elements,
//! which the SVG output inlines verbatim, and a full canvas-sized document,
//! which the raster path renders with resvg.

use super::svg::{composite_centered, escape_xml, fmt_num, render_svg, SvgDocument};
use super::{LayerEffect, RenderContext};
use crate::error::FrameResult;
use crate::request::{EmojiPosition, TextPosition};

/// Id of the drop-shadow filter shared by text overlays.
pub const TEXT_SHADOW_ID: &str = "textShadow";

pub const TEXT_SHADOW_FILTER: &str = r#"<filter id="textShadow" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="1" dy="1" stdDeviation="1" flood-color="rgba(0,0,0,0.5)"/></filter>"#;

/// Gap between the text and the canvas edge.
const TEXT_EDGE_INSET: f32 = 10.0;
/// Gap between emoji glyphs and the canvas edge.
const EMOJI_EDGE_INSET: f32 = 5.0;
/// Extra space between neighboring emoji glyphs in a row.
const EMOJI_GAP: f32 = 10.0;

// ============================================================================
// TextOverlay
// ============================================================================

/// A single horizontally centered label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub content: String,
    pub color: String,
    pub font_size: u32,
    pub position: TextPosition,
    pub canvas_size: u32,
}

/// Builds a text overlay. Returns `None` for empty or whitespace-only text.
pub fn build_text_overlay(
    text: &str,
    color: &str,
    font_size: u32,
    position: TextPosition,
    canvas_size: u32,
) -> Option<TextOverlay> {
    if text.trim().is_empty() {
        return None;
    }
    Some(TextOverlay {
        content: text.trim().to_string(),
        color: color.to_string(),
        font_size,
        position,
        canvas_size,
    })
}

impl TextOverlay {
    /// Vertical anchor and `dominant-baseline` for the configured position.
    pub fn baseline(&self) -> (f32, &'static str) {
        let font = self.font_size as f32;
        let canvas = self.canvas_size as f32;
        match self.position {
            TextPosition::Top => (font + TEXT_EDGE_INSET, "hanging"),
            TextPosition::Bottom => (canvas - TEXT_EDGE_INSET, "baseline"),
            TextPosition::Center => (canvas / 2.0 + font / 2.0, "middle"),
        }
    }

    /// The `<text>` element.
    pub fn element(&self) -> String {
        let (y, dominant_baseline) = self.baseline();
        format!(
            r#"<text x="50%" y="{y}" text-anchor="middle" dominant-baseline="{dominant_baseline}" font-family="Arial, sans-serif" font-size="{size}" font-weight="bold" fill="{fill}" filter="url(#{TEXT_SHADOW_ID})">{content}</text>"#,
            y = fmt_num(y),
            size = self.font_size,
            fill = escape_xml(&self.color),
            content = escape_xml(&self.content),
        )
    }

    /// A standalone canvas-sized document holding the label.
    pub fn document(&self) -> String {
        let mut doc = SvgDocument::new(self.canvas_size);
        doc.define(TEXT_SHADOW_ID, TEXT_SHADOW_FILTER);
        doc.push(&self.element());
        doc.finish()
    }
}

impl LayerEffect for TextOverlay {
    fn name(&self) -> &'static str {
        "text"
    }

    fn composite(&self, ctx: &mut RenderContext) -> FrameResult<()> {
        let rendered = render_svg(&self.document(), ctx.size())?;
        composite_centered(&mut ctx.canvas, &rendered);
        Ok(())
    }

    fn write_svg(&self, doc: &mut SvgDocument) -> FrameResult<()> {
        doc.define(TEXT_SHADOW_ID, TEXT_SHADOW_FILTER);
        doc.push(&self.element());
        Ok(())
    }
}

// ============================================================================
// EmojiOverlay
// ============================================================================

/// Splits a comma-separated emoji list, trimming and dropping empty entries.
pub fn parse_emoji_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// How the glyphs are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiLayout {
    /// One glyph in each canvas corner.
    Corners,
    /// A horizontally centered row near the top or bottom edge.
    Row,
}

/// A glyph and the center point it is drawn at.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub glyph: String,
    pub x: f32,
    pub y: f32,
}

/// A set of positioned emoji glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmojiOverlay {
    pub layout: EmojiLayout,
    pub glyphs: Vec<PlacedGlyph>,
    pub glyph_size: u32,
    pub canvas_size: u32,
}

/// Builds an emoji overlay from a comma-separated list.
///
/// Returns `None` when the list holds no glyphs.
pub fn build_emoji_overlay(
    csv: &str,
    size: u32,
    position: EmojiPosition,
    canvas_size: u32,
) -> Option<EmojiOverlay> {
    EmojiOverlay::from_glyphs(&parse_emoji_list(csv), size, position, canvas_size)
}

impl EmojiOverlay {
    /// Lays out already-split glyphs. Returns `None` for an empty list.
    ///
    /// Corner layout needs at least four glyphs and uses exactly the first
    /// four. Anything else, including corners with fewer glyphs, is a row.
    pub fn from_glyphs(
        glyphs: &[String],
        size: u32,
        position: EmojiPosition,
        canvas_size: u32,
    ) -> Option<Self> {
        if glyphs.is_empty() {
            return None;
        }

        let s = size as f32;
        let canvas = canvas_size as f32;

        let (layout, placed) = if position == EmojiPosition::Corners && glyphs.len() >= 4 {
            let near = s / 2.0 + EMOJI_EDGE_INSET;
            let far = canvas - s / 2.0 - EMOJI_EDGE_INSET;
            let corners = [(near, near), (far, near), (near, far), (far, far)];
            let placed = glyphs
                .iter()
                .zip(corners)
                .map(|(glyph, (x, y))| PlacedGlyph {
                    glyph: glyph.clone(),
                    x,
                    y,
                })
                .collect();
            (EmojiLayout::Corners, placed)
        } else {
            let y = match position {
                EmojiPosition::Top => s + EMOJI_EDGE_INSET,
                EmojiPosition::Bottom | EmojiPosition::Corners => canvas - EMOJI_EDGE_INSET,
            };
            let spacing = s + EMOJI_GAP;
            let total_width = glyphs.len() as f32 * spacing;
            let start_x = (canvas - total_width) / 2.0 + s / 2.0;
            let placed = glyphs
                .iter()
                .enumerate()
                .map(|(i, glyph)| PlacedGlyph {
                    glyph: glyph.clone(),
                    x: start_x + i as f32 * spacing,
                    y,
                })
                .collect();
            (EmojiLayout::Row, placed)
        };

        Some(Self {
            layout,
            glyphs: placed,
            glyph_size: size,
            canvas_size,
        })
    }

    /// The `<text>` elements, one per glyph.
    pub fn elements(&self) -> String {
        self.glyphs.iter().map(|g| self.text_glyph(g)).collect()
    }

    /// A standalone canvas-sized document used for rasterization.
    ///
    /// With the `twemoji` feature, glyphs with bundled Twemoji artwork are
    /// drawn from that artwork; the rest fall back to font rendering.
    pub fn document(&self) -> String {
        let mut doc = SvgDocument::new(self.canvas_size);
        for glyph in &self.glyphs {
            doc.push(&self.raster_glyph(glyph));
        }
        doc.finish()
    }

    #[cfg(feature = "twemoji")]
    fn raster_glyph(&self, glyph: &PlacedGlyph) -> String {
        use base64::Engine as _;
        use base64::engine::general_purpose::STANDARD as BASE64;
        use twemoji_assets::svg::SvgTwemojiAsset;

        match SvgTwemojiAsset::from_emoji(&glyph.glyph) {
            Some(asset) => {
                let svg: &str = asset.as_ref();
                let half = self.glyph_size as f32 / 2.0;
                format!(
                    r#"<image x="{x}" y="{y}" width="{s}" height="{s}" xlink:href="data:image/svg+xml;base64,{data}"/>"#,
                    x = fmt_num(glyph.x - half),
                    y = fmt_num(glyph.y - half),
                    s = self.glyph_size,
                    data = BASE64.encode(svg),
                )
            }
            None => self.text_glyph(glyph),
        }
    }

    #[cfg(not(feature = "twemoji"))]
    fn raster_glyph(&self, glyph: &PlacedGlyph) -> String {
        self.text_glyph(glyph)
    }

    fn text_glyph(&self, glyph: &PlacedGlyph) -> String {
        format!(
            r#"<text x="{x}" y="{y}" text-anchor="middle" dominant-baseline="middle" font-size="{size}">{glyph}</text>"#,
            x = fmt_num(glyph.x),
            y = fmt_num(glyph.y),
            size = self.glyph_size,
            glyph = escape_xml(&glyph.glyph),
        )
    }
}

impl LayerEffect for EmojiOverlay {
    fn name(&self) -> &'static str {
        "emoji"
    }

    fn composite(&self, ctx: &mut RenderContext) -> FrameResult<()> {
        let rendered = render_svg(&self.document(), ctx.size())?;
        composite_centered(&mut ctx.canvas, &rendered);
        Ok(())
    }

    fn write_svg(&self, doc: &mut SvgDocument) -> FrameResult<()> {
        doc.push(&self.elements());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn glyphs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_text_builds_nothing() {
        assert!(build_text_overlay("", "#fff", 20, TextPosition::Bottom, 256).is_none());
        assert!(build_text_overlay("  \t ", "#fff", 20, TextPosition::Bottom, 256).is_none());
    }

    #[test]
    fn text_vertical_placement() {
        let at = |position| {
            build_text_overlay("Hi", "#fff", 20, position, 256)
                .unwrap()
                .baseline()
        };
        assert_eq!(at(TextPosition::Top), (30.0, "hanging"));
        assert_eq!(at(TextPosition::Bottom), (246.0, "baseline"));
        assert_eq!(at(TextPosition::Center), (138.0, "middle"));
    }

    #[test]
    fn text_element_is_centered_escaped_and_shadowed() {
        let overlay = build_text_overlay("<Ada & Co>", "#ff0000", 24, TextPosition::Bottom, 200).unwrap();
        let element = overlay.element();

        assert!(element.contains(r#"x="50%""#));
        assert!(element.contains(r#"y="190""#));
        assert!(element.contains(r#"text-anchor="middle""#));
        assert!(element.contains(r##"fill="#ff0000""##));
        assert!(element.contains(r#"filter="url(#textShadow)""#));
        assert!(element.contains("&lt;Ada &amp; Co&gt;"));
        assert!(!element.contains("<Ada"));
    }

    #[test]
    fn text_document_carries_shadow_filter() {
        let overlay = build_text_overlay("Hi", "white", 20, TextPosition::Top, 128).unwrap();
        let doc = overlay.document();
        assert!(doc.contains("<feDropShadow"));
        assert!(doc.contains(&overlay.element()));
    }

    #[test]
    fn emoji_list_parsing() {
        assert_eq!(parse_emoji_list(" 🚀 ,💻,, 🔥 ,"), glyphs(&["🚀", "💻", "🔥"]));
        assert!(parse_emoji_list(" , ").is_empty());
        assert!(build_emoji_overlay(",,", 40, EmojiPosition::Top, 256).is_none());
    }

    #[test]
    fn corners_with_four_or_more_uses_first_four() {
        let overlay = build_emoji_overlay("a,b,c,d,e", 40, EmojiPosition::Corners, 256).unwrap();
        assert_eq!(overlay.layout, EmojiLayout::Corners);
        assert_eq!(overlay.glyphs.len(), 4);

        let points: Vec<_> = overlay.glyphs.iter().map(|g| (g.glyph.as_str(), g.x, g.y)).collect();
        assert_eq!(
            points,
            vec![
                ("a", 25.0, 25.0),
                ("b", 231.0, 25.0),
                ("c", 25.0, 231.0),
                ("d", 231.0, 231.0),
            ]
        );
    }

    #[test]
    fn corners_with_three_falls_back_to_row() {
        let overlay = build_emoji_overlay("a,b,c", 40, EmojiPosition::Corners, 256).unwrap();
        assert_eq!(overlay.layout, EmojiLayout::Row);
        assert_eq!(overlay.glyphs.len(), 3);
        assert!(overlay.glyphs.iter().all(|g| g.y == 251.0));
    }

    #[test]
    fn row_is_centered_with_fixed_spacing() {
        let overlay = build_emoji_overlay("a,b", 40, EmojiPosition::Top, 256).unwrap();
        assert_eq!(overlay.layout, EmojiLayout::Row);

        // spacing 50, total 100, start (256 - 100) / 2 + 20 = 98
        let xs: Vec<_> = overlay.glyphs.iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![98.0, 148.0]);
        assert!(overlay.glyphs.iter().all(|g| g.y == 45.0));
    }

    #[test]
    fn bottom_row_sits_near_bottom_edge() {
        let overlay = EmojiOverlay::from_glyphs(&glyphs(&["x"]), 30, EmojiPosition::Bottom, 128).unwrap();
        // the row block includes the trailing gap: (128 - 40) / 2 + 15
        assert_eq!(overlay.glyphs[0].y, 123.0);
        assert_eq!(overlay.glyphs[0].x, 59.0);
    }

    #[test]
    fn emoji_elements_one_text_per_glyph() {
        let overlay = build_emoji_overlay("🚀,💻", 40, EmojiPosition::Top, 256).unwrap();
        let elements = overlay.elements();
        assert_eq!(elements.matches("<text").count(), 2);
        assert!(elements.contains(">🚀</text>"));
        assert!(elements.contains(r#"font-size="40""#));
    }
}
