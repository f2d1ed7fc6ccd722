//! Font metrics backed by fontdue.
//!
//! Advances come from `Font::metrics()`, which skips bitmap generation, so
//! measuring a run during layout never rasterises it. Drawing uses
//! `Font::rasterize()` and the same advances, keeping the pen in step with
//! the measured width.

use std::fmt;
use std::rc::Rc;

use fontdue::Font;
use quill_text::{FontMetrics, GlyphBitmap};

/// A fontdue face bound to a pixel size.
#[derive(Clone)]
pub struct FontdueFontMetrics {
    font: Rc<Font>,
    size: f32,
    line_height: f32,
    ascent: f32,
}

impl FontdueFontMetrics {
    /// Fallback line height ratio when the face has no horizontal metrics.
    const LINE_HEIGHT_RATIO: f32 = 1.2;

    /// Bind `font` to `size` pixels.
    #[must_use]
    pub fn new(font: Rc<Font>, size: f32) -> Self {
        let (line_height, ascent) = font.horizontal_line_metrics(size).map_or_else(
            || {
                let line_height = size * Self::LINE_HEIGHT_RATIO;
                (line_height, line_height * 0.8)
            },
            |metrics| (metrics.new_line_size, metrics.ascent),
        );
        Self {
            font,
            size,
            line_height: line_height.ceil(),
            ascent: ascent.ceil(),
        }
    }

    /// Pixel size the face is bound to.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }
}

impl fmt::Debug for FontdueFontMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontdueFontMetrics")
            .field("name", &self.font.name())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl FontMetrics for FontdueFontMetrics {
    fn advance(&self, c: char) -> f32 {
        self.font.metrics(c, self.size).advance_width
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn ascent(&self) -> f32 {
        self.ascent
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn rasterize(&self, c: char) -> Option<GlyphBitmap> {
        if c.is_control() {
            return None;
        }
        let (metrics, coverage) = self.font.rasterize(c, self.size);
        if metrics.width == 0 || metrics.height == 0 {
            return None;
        }
        // fontdue's ymin is the bitmap's bottom edge relative to the baseline.
        Some(GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            left: metrics.xmin,
            top: metrics.ymin + metrics.height as i32,
            coverage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_dictionary::load_first_system_face;

    #[test]
    fn measures_and_rasterises_real_glyphs() {
        let Some(font) = load_first_system_face(false, false) else {
            return;
        };
        let metrics = FontdueFontMetrics::new(font, 16.0);
        assert!(metrics.line_height() >= 16.0);
        assert!(metrics.ascent() > 0.0 && metrics.ascent() <= metrics.line_height());

        let width = metrics.text_width("hello");
        let summed: f32 = "hello".chars().map(|c| metrics.advance(c)).sum();
        assert!((width - summed).abs() < 0.001);
        assert!(metrics.text_width("hello\n") - width < 0.001);

        let glyph = metrics.rasterize('H').unwrap();
        assert_eq!(glyph.coverage.len(), glyph.width * glyph.height);
        assert!(glyph.top > 0);
        assert!(metrics.rasterize(' ').is_none());
    }
}
