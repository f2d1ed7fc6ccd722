//! Layout primitives: the units the engine places.
//!
//! Every primitive shares a rectangle and a source position; what it draws
//! and whether it can split, float or span depends on its kind.

use std::rc::Rc;

use image::RgbaImage;
use unicode_segmentation::UnicodeSegmentation;

use crate::colour::{Colour, ColourOrGradient};
use crate::font::{FontHandle, FontKey};
use crate::geometry::Rect;
use crate::paint::Surface;

/// Which container edge a float is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatSide {
    /// Stacks rightward from the left edge.
    Left,
    /// Stacks leftward from the right edge.
    Right,
}

/// Where a primitive came from in the layout's input sequence: the input
/// index and, for text, the letter offset into that input's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSpan {
    /// Index of the input primitive.
    pub index: usize,
    /// Letters of the input's text that precede this piece.
    pub offset: usize,
}

/// A run of text in one resolved style.
#[derive(Debug, Clone)]
pub struct TextRun {
    /// The text. May contain spaces but never newlines.
    pub text: String,
    /// Font used to measure and draw.
    pub font: FontHandle,
    /// Key the font was resolved from.
    pub font_key: FontKey,
    /// Text colour.
    pub colour: ColourOrGradient,
    /// Background drawn behind the run, over the full row height.
    pub bg_colour: ColourOrGradient,
    /// Draw an underline.
    pub underline: bool,
    /// Link target when the run is part of a link.
    pub link_href: Option<String>,
}

impl TextRun {
    /// Width of the whole run.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.font.text_width(&self.text)
    }

    /// Width of the first `letters` letters.
    #[must_use]
    pub fn prefix_width(&self, letters: usize) -> f32 {
        self.font.text_width(&self.text[..self.byte_offset(letters)])
    }

    /// Number of letters (extended grapheme clusters).
    #[must_use]
    pub fn letter_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Byte offset of letter `letter`, or the text length past the end.
    #[must_use]
    pub fn byte_offset(&self, letter: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(letter)
            .map_or(self.text.len(), |(offset, _)| offset)
    }

    /// Same style and font, so the two runs can be drawn as one.
    #[must_use]
    pub fn style_matches(&self, other: &Self) -> bool {
        self.font_key == other.font_key
            && self.colour == other.colour
            && self.bg_colour == other.bg_colour
            && self.underline == other.underline
            && self.link_href == other.link_href
    }

    /// Letter index under an x offset measured from the run's left edge.
    /// Positions past the middle of a letter select the gap after it.
    #[must_use]
    pub fn letter_at_x(&self, x: f32) -> usize {
        let mut pen = 0.0;
        for (index, letter) in self.text.graphemes(true).enumerate() {
            let advance = self.font.text_width(letter);
            if x < advance.mul_add(0.5, pen) {
                return index;
            }
            pen += advance;
        }
        self.letter_count()
    }

    /// Byte offset at which to break so the text before it fits `max_width`.
    ///
    /// Break opportunities sit at the start of each word that follows
    /// whitespace; trailing whitespace before the break does not count
    /// towards the width and stays with the left part.
    fn find_break_opportunity(&self, max_width: f32) -> Option<usize> {
        let mut last_fitting_break = None;
        let mut prev_was_whitespace = false;
        for (byte_idx, letter) in self.text.grapheme_indices(true) {
            let is_whitespace = letter.chars().all(char::is_whitespace);
            if !is_whitespace && prev_was_whitespace {
                let prefix = self.text[..byte_idx].trim_end();
                if self.font.text_width(prefix) <= max_width {
                    last_fitting_break = Some(byte_idx);
                } else {
                    break;
                }
            }
            prev_was_whitespace = is_whitespace;
        }
        last_fitting_break
    }

    fn first_break_opportunity(&self) -> Option<usize> {
        let mut prev_was_whitespace = false;
        for (byte_idx, letter) in self.text.grapheme_indices(true) {
            let is_whitespace = letter.chars().all(char::is_whitespace);
            if !is_whitespace && prev_was_whitespace {
                return Some(byte_idx);
            }
            prev_was_whitespace = is_whitespace;
        }
        None
    }
}

/// What a non-text block draws.
#[derive(Debug, Clone)]
pub enum BlockContent {
    /// A horizontal rule through the middle of the block.
    Rule(Colour),
    /// A solid or gradient fill.
    Fill(ColourOrGradient),
    /// An image scaled to the block.
    Image(Rc<RgbaImage>),
}

/// The primitive variants.
#[derive(Debug, Clone)]
pub enum PrimitiveKind {
    /// Styled text; splittable between words.
    Text(TextRun),
    /// Ends the current row. Its height is the line height of the font in
    /// effect where the break occurred.
    LineBreak,
    /// A block pinned to one side that later rows flow around.
    Float {
        /// The side it is pinned to.
        side: FloatSide,
        /// What it draws.
        content: BlockContent,
    },
    /// A block stretched across the full container width on its own row.
    Span {
        /// What it draws.
        content: BlockContent,
    },
    /// A block placed in the row like a word.
    Inline {
        /// What it draws.
        content: BlockContent,
    },
}

/// Vertical metrics of the row a primitive is drawn in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPlacement {
    /// Top of the row.
    pub top: f32,
    /// Row height including line spacing.
    pub height: f32,
    /// Baseline position measured from the row top.
    pub baseline: f32,
}

/// A positioned unit of layout.
#[derive(Debug, Clone)]
pub struct Primitive {
    /// Position and size. Width and height are fixed at creation (text
    /// width changes only by splitting); position is set by the engine.
    pub rect: Rect,
    /// What this primitive is.
    pub kind: PrimitiveKind,
    /// Where it came from in the layout input.
    pub source: SourceSpan,
}

impl Primitive {
    /// A text run measured with its own font.
    #[must_use]
    pub fn text(run: TextRun) -> Self {
        let rect = Rect::new(0.0, 0.0, run.width(), run.font.line_height());
        Self {
            rect,
            kind: PrimitiveKind::Text(run),
            source: SourceSpan::default(),
        }
    }

    /// A line break of the given line height.
    #[must_use]
    pub fn line_break(height: f32) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, 0.0, height),
            kind: PrimitiveKind::LineBreak,
            source: SourceSpan::default(),
        }
    }

    /// A non-text primitive of the given size.
    #[must_use]
    pub fn block(kind: PrimitiveKind, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, width, height),
            kind,
            source: SourceSpan::default(),
        }
    }

    /// The text run, for text primitives.
    #[must_use]
    pub const fn as_text(&self) -> Option<&TextRun> {
        match &self.kind {
            PrimitiveKind::Text(run) => Some(run),
            _ => None,
        }
    }

    /// Mutable text run, for text primitives.
    pub const fn as_text_mut(&mut self) -> Option<&mut TextRun> {
        match &mut self.kind {
            PrimitiveKind::Text(run) => Some(run),
            _ => None,
        }
    }

    /// True for line breaks.
    #[must_use]
    pub const fn is_line_break(&self) -> bool {
        matches!(self.kind, PrimitiveKind::LineBreak)
    }

    /// Only text with more than one letter can split.
    #[must_use]
    pub fn can_split(&self) -> bool {
        self.as_text().is_some_and(|run| run.letter_count() > 1)
    }

    /// Split so this primitive keeps at most `offset` pixels of width and
    /// return the remainder for the next row.
    ///
    /// Text breaks at the last word boundary that fits. If none fits but the
    /// primitive is wider than `container_width`, it breaks after its first
    /// word so an overlong word still ends up on a row of its own. Returns
    /// `None`, leaving `self` untouched, when there is no usable boundary.
    pub fn split(&mut self, offset: f32, container_width: f32) -> Option<Self> {
        let overflows_container = self.rect.width > container_width;
        let run = self.as_text_mut()?;
        let break_at = run.find_break_opportunity(offset).or_else(|| {
            if overflows_container {
                run.first_break_opportunity()
            } else {
                None
            }
        })?;

        let remainder_text = run.text.split_off(break_at);
        let left_letters = run.letter_count();
        let mut remainder_run = run.clone();
        remainder_run.text = remainder_text;
        let left_width = run.width();

        self.rect.width = left_width;
        let mut remainder = Self::text(remainder_run);
        remainder.rect.y = self.rect.y;
        remainder.source = SourceSpan {
            index: self.source.index,
            offset: self.source.offset + left_letters,
        };
        Some(remainder)
    }

    /// A copy starting at letter `offset` of this primitive's text, or
    /// `None` when nothing is left. Non-text primitives are only returned
    /// for offset zero.
    #[must_use]
    pub fn slice_from(&self, offset: usize) -> Option<Self> {
        match self.as_text() {
            Some(run) => {
                let mut run = run.clone();
                let start = run.byte_offset(offset);
                let _ = run.text.drain(..start);
                if run.text.is_empty() {
                    return None;
                }
                let mut piece = Self::text(run);
                piece.source = SourceSpan {
                    index: self.source.index,
                    offset: self.source.offset + offset,
                };
                Some(piece)
            }
            None => (offset == 0).then(|| self.clone()),
        }
    }

    /// Width without trailing whitespace, for text. Other primitives report
    /// their full width.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        self.as_text()
            .map_or(self.rect.width, |run| run.font.text_width(run.text.trim_end()))
    }

    /// Insert `text` before letter `letter` of a text run and re-measure.
    /// Does nothing for other primitives.
    pub fn insert_text(&mut self, letter: usize, text: &str) {
        if let Some(run) = self.as_text_mut() {
            let at = run.byte_offset(letter);
            run.text.insert_str(at, text);
            let width = run.width();
            self.rect.width = width;
        }
    }

    /// Letters contributed to reveal and cursor counts. Zero for blocks and
    /// breaks.
    #[must_use]
    pub fn letter_count(&self) -> usize {
        self.as_text().map_or(0, TextRun::letter_count)
    }

    /// The float side, for floats.
    #[must_use]
    pub const fn float_side(&self) -> Option<FloatSide> {
        match self.kind {
            PrimitiveKind::Float { side, .. } => Some(side),
            _ => None,
        }
    }

    /// True for blocks that take a full row.
    #[must_use]
    pub const fn should_span(&self) -> bool {
        matches!(self.kind, PrimitiveKind::Span { .. })
    }

    /// True if this primitive's vertical extent meets `other`'s.
    #[must_use]
    pub fn vertical_overlap(&self, other: &Rect) -> bool {
        self.rect.vertical_overlap(other)
    }

    /// Link target, for link text.
    #[must_use]
    pub fn link_href(&self) -> Option<&str> {
        self.as_text().and_then(|run| run.link_href.as_deref())
    }

    /// Draw onto `surface`. Text is drawn against the row's baseline and
    /// background fills cover the row height; `reveal` limits how many
    /// letters are drawn.
    pub fn finalize<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        row: RowPlacement,
        reveal: Option<usize>,
    ) {
        match &self.kind {
            PrimitiveKind::Text(run) => draw_text(surface, self.rect, run, row, reveal),
            PrimitiveKind::LineBreak => {}
            PrimitiveKind::Float { content, .. }
            | PrimitiveKind::Span { content }
            | PrimitiveKind::Inline { content } => {
                if reveal != Some(0) {
                    draw_block(surface, self.rect, content);
                }
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn draw_text<S: Surface + ?Sized>(
    surface: &mut S,
    rect: Rect,
    run: &TextRun,
    row: RowPlacement,
    reveal: Option<usize>,
) {
    let letters = reveal.map_or(usize::MAX, |limit| limit.min(run.letter_count()));
    if letters == 0 {
        return;
    }
    let drawn_width = if letters == usize::MAX {
        rect.width
    } else {
        run.prefix_width(letters)
    };
    let background = Rect::new(rect.x, row.top, drawn_width, row.height);
    match &run.bg_colour {
        ColourOrGradient::Colour(colour) => surface.blend_rect(background, *colour),
        ColourOrGradient::Gradient(gradient) => surface.blend_gradient(background, gradient),
    }

    let baseline = row.top + row.baseline;
    let mut pen = rect.x;
    for letter in run.text.graphemes(true).take(letters) {
        for c in letter.chars().filter(|c| !c.is_control()) {
            if let Some(glyph) = run.font.rasterize(c) {
                let colour = run.colour.colour_at_point(&rect, pen, baseline);
                let x = pen.round() as i64 + i64::from(glyph.left);
                let y = baseline.round() as i64 - i64::from(glyph.top);
                surface.blit_coverage(x, y, &glyph, colour);
            }
            pen += run.font.advance(c);
        }
    }

    if run.underline {
        let underline = Rect::new(rect.x, baseline + 1.0, pen - rect.x, 1.0);
        surface.blend_rect(underline, run.colour.base_colour());
    }
}

fn draw_block<S: Surface + ?Sized>(surface: &mut S, rect: Rect, content: &BlockContent) {
    match content {
        BlockContent::Rule(colour) => {
            let thickness = (rect.height / 8.0).round().max(1.0);
            let y = (rect.height - thickness).mul_add(0.5, rect.y).round();
            surface.blend_rect(Rect::new(rect.x, y, rect.width, thickness), *colour);
        }
        BlockContent::Fill(ColourOrGradient::Colour(colour)) => surface.blend_rect(rect, *colour),
        BlockContent::Fill(ColourOrGradient::Gradient(gradient)) => {
            surface.blend_gradient(rect, gradient);
        }
        BlockContent::Image(image) => surface.blit_image(rect, image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::ApproximateFontMetrics;

    /// 10px font: every letter is 6px wide.
    fn run(text: &str) -> Primitive {
        Primitive::text(TextRun {
            text: text.to_string(),
            font: Rc::new(ApproximateFontMetrics::new(10)),
            font_key: FontKey::new("fira_code", 10, false, false),
            colour: Colour::WHITE.into(),
            bg_colour: Colour::TRANSPARENT.into(),
            underline: false,
            link_href: None,
        })
    }

    fn text_of(primitive: &Primitive) -> &str {
        &primitive.as_text().unwrap().text
    }

    #[test]
    fn text_is_measured_on_creation() {
        let primitive = run("hello");
        assert!((primitive.rect.width - 30.0).abs() < f32::EPSILON);
        assert!((primitive.rect.height - 12.0).abs() < f32::EPSILON);
        assert_eq!(primitive.letter_count(), 5);
    }

    #[test]
    fn split_at_last_fitting_word() {
        let mut primitive = run("aaa bbb ccc");
        // "aaa bbb" is 42px wide and fits in 45.
        let remainder = primitive.split(45.0, 100.0).unwrap();
        assert_eq!(text_of(&primitive), "aaa bbb ");
        assert_eq!(text_of(&remainder), "ccc");
        assert!((primitive.rect.width - 48.0).abs() < f32::EPSILON);
        assert_eq!(remainder.source, SourceSpan { index: 0, offset: 8 });
        assert_eq!(primitive.letter_count() + remainder.letter_count(), 11);
    }

    #[test]
    fn split_fails_without_fitting_boundary() {
        let mut primitive = run("aaa bbb");
        assert!(primitive.split(10.0, 100.0).is_none());
        assert_eq!(text_of(&primitive), "aaa bbb");

        let mut word = run("abcdefgh");
        assert!(word.split(20.0, 10.0).is_none());
    }

    #[test]
    fn overlong_first_word_breaks_after_itself() {
        let mut primitive = run("abcdefgh ij");
        let remainder = primitive.split(20.0, 30.0).unwrap();
        assert_eq!(text_of(&primitive), "abcdefgh ");
        assert_eq!(text_of(&remainder), "ij");
    }

    #[test]
    fn split_keeps_grapheme_clusters_whole() {
        let mut primitive = run("e\u{301}e\u{301} x\u{301}");
        assert_eq!(primitive.letter_count(), 4);
        let remainder = primitive.split(30.0, 100.0).unwrap();
        assert_eq!(text_of(&remainder), "x\u{301}");
        assert_eq!(remainder.source.offset, 3);
    }

    #[test]
    fn slice_from_offsets_source() {
        let mut primitive = run("hello world");
        primitive.source = SourceSpan { index: 4, offset: 0 };
        let piece = primitive.slice_from(6).unwrap();
        assert_eq!(text_of(&piece), "world");
        assert_eq!(piece.source, SourceSpan { index: 4, offset: 6 });
        assert!(primitive.slice_from(11).is_none());

        let rule = Primitive::block(
            PrimitiveKind::Span {
                content: BlockContent::Rule(Colour::WHITE),
            },
            10.0,
            2.0,
        );
        assert!(rule.slice_from(0).is_some());
        assert!(rule.slice_from(1).is_none());
    }

    #[test]
    fn insert_text_remeasures() {
        let mut primitive = run("held");
        primitive.insert_text(3, "lo worl");
        assert_eq!(text_of(&primitive), "hello world");
        assert!((primitive.rect.width - 66.0).abs() < f32::EPSILON);
        assert!((primitive.content_width() - 66.0).abs() < f32::EPSILON);
        assert!((run("ab  ").content_width() - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn capabilities_by_kind() {
        let float = Primitive::block(
            PrimitiveKind::Float {
                side: FloatSide::Right,
                content: BlockContent::Fill(Colour::WHITE.into()),
            },
            10.0,
            10.0,
        );
        assert_eq!(float.float_side(), Some(FloatSide::Right));
        assert!(!float.can_split());
        assert!(!float.should_span());
        assert_eq!(float.letter_count(), 0);
        assert!(!run("a").can_split());
        assert!(Primitive::line_break(12.0).is_line_break());
    }

    #[test]
    fn letter_at_x_rounds_to_nearest_gap() {
        let primitive = run("abcd");
        let text = primitive.as_text().unwrap();
        assert_eq!(text.letter_at_x(0.0), 0);
        assert_eq!(text.letter_at_x(2.0), 0);
        assert_eq!(text.letter_at_x(4.0), 1);
        assert_eq!(text.letter_at_x(100.0), 4);
    }

    #[test]
    fn reveal_limits_drawn_letters() {
        let primitive = run("abcdefghij");
        let row = RowPlacement {
            top: 0.0,
            height: 15.0,
            baseline: 10.0,
        };
        let mut surface = RgbaImage::new(60, 15);
        primitive.finalize(&mut surface, row, Some(5));
        // Letter 4 spans x 24..30, letter 5 would start at 30.
        assert_eq!(surface.pixel(26, 8).a, 255);
        assert_eq!(surface.pixel(32, 8).a, 0);
    }
}
