//! A single visual line of the layout.

use std::collections::VecDeque;

use crate::colour::Colour;
use crate::config::HorizontalAlignment;
use crate::geometry::Rect;
use crate::layout::primitive::{Primitive, PrimitiveKind, RowPlacement};
use crate::paint::Surface;

/// Primitives placed left to right on one line, with the row's bounds,
/// letter count and edit cursor state.
#[derive(Debug, Clone)]
pub struct LayoutRow {
    /// Bounds of the row. Width is the sum of item widths.
    pub rect: Rect,
    /// Items in placement order.
    pub items: Vec<Primitive>,
    /// Letters across all text items.
    pub letter_count: usize,
    /// Baseline offset from the row top (tallest text ascent).
    pub baseline: f32,
    /// Height of the tallest item before line spacing.
    pub text_chunk_height: f32,
    /// Multiplier applied to the tallest item's height.
    pub line_spacing: f32,
    /// Fixed container height that caps the row height, if any.
    pub height_cap: Option<f32>,
    /// Position of the row in the layout.
    pub index: usize,
    /// Whether the edit cursor is drawn on this row.
    pub edit_cursor_active: bool,
    /// Cursor position in letters from the row start.
    pub cursor_position: usize,
    /// Cursor x offset from the row's left edge.
    pub cursor_draw_width: f32,
}

impl LayoutRow {
    /// An empty row with its top-left at `(x, y)`.
    #[must_use]
    pub const fn new(
        x: f32,
        y: f32,
        index: usize,
        line_spacing: f32,
        height_cap: Option<f32>,
    ) -> Self {
        Self {
            rect: Rect::new(x, y, 0.0, 0.0),
            items: Vec::new(),
            letter_count: 0,
            baseline: 0.0,
            text_chunk_height: 0.0,
            line_spacing,
            height_cap,
            index,
            edit_cursor_active: false,
            cursor_position: 0,
            cursor_draw_width: 0.0,
        }
    }

    /// True while nothing has been placed on the row.
    #[must_use]
    pub fn at_start(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item at the row's right edge. The first item decides the
    /// row's left edge, so a row that starts beside a left float begins at
    /// the float's right edge.
    pub fn add_item(&mut self, mut item: Primitive) {
        if self.items.is_empty() {
            self.rect.x = item.rect.x;
        } else {
            item.rect.x = self.rect.right();
        }
        item.rect.y = self.rect.y;
        self.rect.width += item.rect.width;

        if item.rect.height > self.text_chunk_height {
            self.text_chunk_height = item.rect.height;
            let spaced = item.rect.height * self.line_spacing;
            self.rect.height = self.height_cap.map_or(spaced, |cap| spaced.min(cap));
        }
        if let PrimitiveKind::Text(run) = &item.kind {
            self.baseline = self.baseline.max(run.font.ascent());
        }
        self.letter_count += item.letter_count();
        self.items.push(item);
    }

    /// Push every item back onto the front of `queue` in their original
    /// order and reset the row to empty at x = 0.
    pub fn rewind(&mut self, queue: &mut VecDeque<Primitive>) {
        for item in self.items.drain(..).rev() {
            queue.push_front(item);
        }
        self.rect.x = 0.0;
        self.rect.width = 0.0;
        self.rect.height = 0.0;
        self.text_chunk_height = 0.0;
        self.letter_count = 0;
        self.baseline = 0.0;
    }

    /// Collapse neighbouring text runs with identical style into one run.
    pub fn merge_adjacent_compatible_chunks(&mut self) {
        let mut index = 0;
        while index + 1 < self.items.len() {
            let compatible = match (&self.items[index].kind, &self.items[index + 1].kind) {
                (PrimitiveKind::Text(current), PrimitiveKind::Text(next)) => {
                    current.style_matches(next)
                }
                _ => false,
            };
            if compatible {
                let next = self.items.remove(index + 1);
                let current = &mut self.items[index];
                current.rect.width += next.rect.width;
                current.rect.height = current.rect.height.max(next.rect.height);
                if let (Some(run), PrimitiveKind::Text(next_run)) =
                    (current.as_text_mut(), next.kind)
                {
                    run.text.push_str(&next_run.text);
                }
            } else {
                index += 1;
            }
        }
    }

    /// Reposition items for `alignment` within the horizontal span
    /// `start..end`. Item widths are unchanged.
    pub fn align(&mut self, alignment: HorizontalAlignment, start: f32, end: f32) {
        match alignment {
            HorizontalAlignment::Left => self.rect.x = start,
            HorizontalAlignment::Center => {
                self.rect.x = (start + end - self.rect.width) / 2.0;
            }
            HorizontalAlignment::Right => self.rect.x = end - self.rect.width,
        }
        let mut x = self.rect.x;
        for item in &mut self.items {
            item.rect.x = x;
            x += item.rect.width;
        }
    }

    /// Vertical metrics items are drawn against.
    #[must_use]
    pub const fn placement(&self) -> RowPlacement {
        RowPlacement {
            top: self.rect.y,
            height: self.rect.height,
            baseline: self.baseline,
        }
    }

    /// Draw the row's items and, when active, its edit cursor.
    ///
    /// With `reveal` set, `cumulative` is the number of letters in earlier
    /// rows; items are drawn only while that count is below the limit, the
    /// item crossing it is drawn truncated. Returns the updated count.
    pub fn finalize<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        reveal: Option<usize>,
        mut cumulative: usize,
        cursor_width: f32,
    ) -> usize {
        let placement = self.placement();
        for item in &self.items {
            match reveal {
                Some(limit) => {
                    if cumulative < limit {
                        item.finalize(surface, placement, Some(limit - cumulative));
                    }
                    cumulative += item.letter_count();
                }
                None => item.finalize(surface, placement, None),
            }
        }

        if self.edit_cursor_active {
            surface.fill_rect(self.cursor_rect(cursor_width), Colour::WHITE);
        }
        cumulative
    }

    /// Where the edit cursor is drawn.
    #[must_use]
    pub fn cursor_rect(&self, cursor_width: f32) -> Rect {
        Rect::new(
            self.rect.x + self.cursor_draw_width,
            self.rect.y,
            cursor_width,
            (self.rect.height - 2.0).max(0.0),
        )
    }

    /// Place the cursor `position` letters into the row, clamped to the
    /// row's letter count.
    pub fn set_cursor_position(&mut self, position: usize) {
        self.cursor_position = position.min(self.letter_count);
        let mut letters = 0;
        let mut draw_width = 0.0;
        for item in &self.items {
            let count = item.letter_count();
            if position <= letters + count {
                if let Some(run) = item.as_text() {
                    draw_width += run.prefix_width(position - letters);
                }
                break;
            }
            letters += count;
            draw_width += item.rect.width;
        }
        self.cursor_draw_width = draw_width;
    }

    /// Place the cursor at the letter gap nearest to `x` in the text run
    /// under the point `(x, y)`. Clicks beside every run land at the row end.
    pub fn set_cursor_from_click(&mut self, x: f32, y: f32) {
        let mut letters = 0;
        let mut draw_width = 0.0;
        for item in &self.items {
            if let Some(run) = item.as_text()
                && item.rect.contains(x, y)
            {
                let letter = run.letter_at_x(x - item.rect.x);
                letters += letter;
                draw_width += run.prefix_width(letter);
                break;
            }
            letters += item.letter_count();
            draw_width += item.rect.width;
        }
        self.cursor_draw_width = draw_width;
        self.cursor_position = letters.min(self.letter_count);
    }

    /// Smallest source index among the row's items.
    #[must_use]
    pub fn first_source_index(&self) -> Option<usize> {
        self.items.iter().map(|item| item.source.index).min()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use image::RgbaImage;

    use super::*;
    use crate::colour::Colour;
    use crate::font::{ApproximateFontMetrics, FontKey};
    use crate::layout::primitive::{BlockContent, TextRun};

    fn text(text: &str, size: u32) -> Primitive {
        Primitive::text(TextRun {
            text: text.to_string(),
            font: Rc::new(ApproximateFontMetrics::new(size)),
            font_key: FontKey::new("fira_code", size, false, false),
            colour: Colour::WHITE.into(),
            bg_colour: Colour::TRANSPARENT.into(),
            underline: false,
            link_href: None,
        })
    }

    fn row() -> LayoutRow {
        LayoutRow::new(0.0, 0.0, 0, 1.25, None)
    }

    #[test]
    fn add_item_accumulates_geometry() {
        let mut row = row();
        row.add_item(text("ab", 10));
        row.add_item(text("cde", 20));
        assert!((row.rect.width - 48.0).abs() < f32::EPSILON);
        // Tallest item is 24px high.
        assert!((row.rect.height - 30.0).abs() < f32::EPSILON);
        assert_eq!(row.letter_count, 5);
        assert!((row.items[1].rect.x - 12.0).abs() < f32::EPSILON);
        let widths: f32 = row.items.iter().map(|item| item.rect.width).sum();
        assert!((widths - row.rect.width).abs() < f32::EPSILON);
    }

    #[test]
    fn fixed_height_caps_row_height() {
        let mut row = LayoutRow::new(0.0, 0.0, 0, 2.0, Some(20.0));
        row.add_item(text("a", 10));
        assert!((row.rect.height - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn first_item_sets_row_left() {
        let mut row = row();
        let mut item = text("a", 10);
        item.rect.x = 40.0;
        row.add_item(item);
        row.add_item(text("b", 10));
        assert!((row.rect.x - 40.0).abs() < f32::EPSILON);
        assert!((row.items[1].rect.x - 46.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rewind_restores_queue_order() {
        let mut row = row();
        row.add_item(text("one", 10));
        row.add_item(text("two", 10));
        let mut queue = VecDeque::from([text("three", 10)]);
        row.rewind(&mut queue);

        let order: Vec<_> = queue
            .iter()
            .map(|item| item.as_text().unwrap().text.clone())
            .collect();
        assert_eq!(order, ["one", "two", "three"]);
        assert!(row.at_start());
        assert_eq!(row.letter_count, 0);
        assert!(row.rect.width.abs() < f32::EPSILON);
    }

    #[test]
    fn merge_joins_matching_runs_only() {
        let mut row = row();
        row.add_item(text("ab", 10));
        row.add_item(text("cd", 10));
        row.add_item(text("ef", 20));
        row.merge_adjacent_compatible_chunks();

        assert_eq!(row.items.len(), 2);
        assert_eq!(row.items[0].as_text().unwrap().text, "abcd");
        assert!((row.items[0].rect.width - 24.0).abs() < f32::EPSILON);
        assert_eq!(row.letter_count, 6);
    }

    #[test]
    fn alignment_moves_items_together() {
        let mut row = row();
        row.add_item(text("ab", 10));
        row.add_item(text("cd", 10));

        row.align(HorizontalAlignment::Right, 0.0, 100.0);
        assert!((row.rect.x - 76.0).abs() < f32::EPSILON);
        assert!((row.items[1].rect.x - 88.0).abs() < f32::EPSILON);

        row.align(HorizontalAlignment::Center, 0.0, 100.0);
        assert!((row.rect.x - 38.0).abs() < f32::EPSILON);
        assert!((row.rect.width - 24.0).abs() < f32::EPSILON);
    }

    #[test]
    fn cursor_position_sums_advances() {
        let mut row = row();
        row.add_item(text("abc", 10));
        row.add_item(text("def", 10));

        row.set_cursor_position(4);
        assert_eq!(row.cursor_position, 4);
        assert!((row.cursor_draw_width - 24.0).abs() < f32::EPSILON);

        row.set_cursor_position(99);
        assert_eq!(row.cursor_position, 6);
    }

    #[test]
    fn click_selects_nearest_gap() {
        let mut row = row();
        row.add_item(text("abc", 10));
        row.add_item(text("def", 10));

        row.set_cursor_from_click(25.0, 5.0);
        assert_eq!(row.cursor_position, 4);
        assert!((row.cursor_draw_width - 24.0).abs() < f32::EPSILON);

        row.set_cursor_from_click(500.0, 5.0);
        assert_eq!(row.cursor_position, 6);
    }

    #[test]
    fn reveal_counts_across_items() {
        let mut row = row();
        row.add_item(text("abc", 10));
        row.add_item(Primitive::block(
            PrimitiveKind::Inline {
                content: BlockContent::Fill(Colour::WHITE.into()),
            },
            4.0,
            4.0,
        ));
        row.add_item(text("def", 10));

        let mut surface = RgbaImage::new(60, 20);
        assert_eq!(row.finalize(&mut surface, Some(2), 0, 2.0), 6);
        assert_eq!(row.finalize(&mut surface, None, 0, 2.0), 0);
    }

    #[test]
    fn active_cursor_is_drawn() {
        let mut row = row();
        row.add_item(text("abc", 10));
        row.edit_cursor_active = true;
        row.set_cursor_position(3);

        let mut surface = RgbaImage::new(40, 20);
        let _ = row.finalize(&mut surface, Some(0), 0, 2.0);
        assert_eq!(surface.pixel(18, 2), Colour::WHITE);
        assert_eq!(surface.pixel(10, 2).a, 0);
    }
}
