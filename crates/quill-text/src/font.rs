//! Font collaborator interface.
//!
//! The layout engine never loads fonts. It asks a [`FontResolver`] for a
//! handle keyed by `(family, size, bold, italic)` and measures text through
//! [`FontMetrics`]. `quill-render` supplies a fontdue-backed implementation;
//! [`ApproximateFontMetrics`] is the deterministic fallback used when no
//! font file is available and in tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A rasterised glyph as 8-bit coverage values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    /// Bitmap width in pixels.
    pub width: usize,
    /// Bitmap height in pixels.
    pub height: usize,
    /// Offset from the pen position to the bitmap's left edge.
    pub left: i32,
    /// Distance from the baseline up to the bitmap's top edge.
    pub top: i32,
    /// Row-major coverage, `width * height` entries.
    pub coverage: Vec<u8>,
}

/// Per-font measurements and rasterisation.
///
/// A handle is already bound to a pixel size, so none of the methods take
/// one.
pub trait FontMetrics: fmt::Debug {
    /// Horizontal advance of a single character.
    fn advance(&self, c: char) -> f32;

    /// Distance between consecutive baselines.
    fn line_height(&self) -> f32;

    /// Distance from the top of a line to its baseline.
    fn ascent(&self) -> f32;

    /// Rasterise a character. Whitespace and unsupported characters may
    /// return `None`.
    fn rasterize(&self, c: char) -> Option<GlyphBitmap>;

    /// Sum of the advances of every character in `text`, matching the pen
    /// movement used when drawing.
    fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .filter(|c| !c.is_control())
            .map(|c| self.advance(c))
            .sum()
    }
}

/// Shared, immutable font handle.
pub type FontHandle = Rc<dyn FontMetrics>;

/// Identity of a font face at a size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    /// Family name as written in themes and `<font face>`.
    pub family: String,
    /// Pixel size.
    pub size: u32,
    /// Bold face.
    pub bold: bool,
    /// Italic face.
    pub italic: bool,
}

impl FontKey {
    /// Build a key.
    #[must_use]
    pub fn new(family: impl Into<String>, size: u32, bold: bool, italic: bool) -> Self {
        Self {
            family: family.into(),
            size,
            bold,
            italic,
        }
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}px", self.family, self.size)?;
        if self.bold {
            write!(f, " bold")?;
        }
        if self.italic {
            write!(f, " italic")?;
        }
        Ok(())
    }
}

/// Looks up font handles. Lookups must be idempotent for a given key so
/// callers may cache or compare handles by key.
pub trait FontResolver {
    /// Find (or load) the font for `key`. Never fails; implementations fall
    /// back to some other face and report it.
    fn find_font(&self, key: &FontKey) -> FontHandle;
}

/// Fixed-ratio metrics with whole-pixel advances.
///
/// Every character advances `round(0.6 × size)`, lines are `round(1.2 × size)`
/// tall and glyphs are drawn as solid boxes, which makes layouts exactly
/// predictable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateFontMetrics {
    size: f32,
}

impl ApproximateFontMetrics {
    const CHAR_WIDTH_RATIO: f32 = 0.6;
    const LINE_HEIGHT_RATIO: f32 = 1.2;
    const ASCENT_RATIO: f32 = 0.8;

    /// Metrics for a pixel size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1) as f32,
        }
    }
}

impl FontMetrics for ApproximateFontMetrics {
    fn advance(&self, _c: char) -> f32 {
        (self.size * Self::CHAR_WIDTH_RATIO).round()
    }

    fn line_height(&self) -> f32 {
        (self.size * Self::LINE_HEIGHT_RATIO).round()
    }

    fn ascent(&self) -> f32 {
        (self.line_height() * Self::ASCENT_RATIO).round()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize(&self, c: char) -> Option<GlyphBitmap> {
        if c.is_whitespace() || c.is_control() {
            return None;
        }
        // A box one pixel in from either side of the advance, standing on
        // the baseline and reaching 70% of the ascent.
        let width = (self.advance(c) as usize).saturating_sub(2).max(1);
        let height = ((self.ascent() * 0.7).round() as usize).max(1);
        Some(GlyphBitmap {
            width,
            height,
            left: 1,
            top: height as i32,
            coverage: vec![255; width * height],
        })
    }
}

/// Resolver handing out [`ApproximateFontMetrics`] for every key.
#[derive(Debug, Default)]
pub struct ApproximateFontResolver {
    cache: RefCell<HashMap<FontKey, FontHandle>>,
}

impl ApproximateFontResolver {
    /// An empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FontResolver for ApproximateFontResolver {
    fn find_font(&self, key: &FontKey) -> FontHandle {
        Rc::clone(
            self.cache
                .borrow_mut()
                .entry(key.clone())
                .or_insert_with(|| -> FontHandle { Rc::new(ApproximateFontMetrics::new(key.size)) }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximate_metrics_are_whole_pixels() {
        let font = ApproximateFontMetrics::new(14);
        assert!((font.advance('a') - 8.0).abs() < f32::EPSILON);
        assert!((font.line_height() - 17.0).abs() < f32::EPSILON);
        assert!((font.ascent() - 14.0).abs() < f32::EPSILON);
        assert!((font.text_width("hello") - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn approximate_glyphs_skip_whitespace() {
        let font = ApproximateFontMetrics::new(10);
        assert!(font.rasterize(' ').is_none());
        let glyph = font.rasterize('x').unwrap();
        assert_eq!(glyph.width, 4);
        assert_eq!(glyph.coverage.len(), glyph.width * glyph.height);
    }

    #[test]
    fn resolver_caches_by_key() {
        let resolver = ApproximateFontResolver::new();
        let key = FontKey::new("fira_code", 14, false, false);
        let first = resolver.find_font(&key);
        let second = resolver.find_font(&key);
        assert!(Rc::ptr_eq(&first, &second));
        let bold = resolver.find_font(&FontKey::new("fira_code", 14, true, false));
        assert!(!Rc::ptr_eq(&first, &bold));
    }

    #[test]
    fn font_key_display() {
        assert_eq!(
            FontKey::new("fira_code", 14, true, true).to_string(),
            "fira_code 14px bold italic"
        );
    }
}
