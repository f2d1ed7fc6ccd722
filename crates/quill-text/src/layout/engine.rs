//! The box layout engine.
//!
//! Primitives are popped from the front of a queue and placed into the
//! current row. Line breaks and spans seal rows, text that overflows is
//! split at a word boundary with the remainder pushed back onto the queue,
//! and a new float rewinds the current row so its items flow around it.
//!
//! The engine keeps the unsplit input (the arena) so a pass can be re-run
//! from scratch after a width change, or from a given row after an edit.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use thiserror::Error;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::HorizontalAlignment;
use crate::geometry::Rect;
use crate::layout::primitive::{FloatSide, Primitive, RowPlacement, SourceSpan, TextRun};
use crate::layout::row::LayoutRow;
use crate::paint::Surface;

/// Size and spacing the layout works within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstraints {
    /// Container width. Rows wrap at this width.
    pub width: f32,
    /// Fixed container height, or `None` to grow with the content. A fixed
    /// height caps row heights but does not stop rows being added.
    pub height: Option<f32>,
    /// Row height as a multiple of the tallest item in it.
    pub line_spacing: f32,
}

impl LayoutConstraints {
    /// Constraints for a container `width` wide that grows downward.
    #[must_use]
    pub const fn new(width: f32, line_spacing: f32) -> Self {
        Self {
            width,
            height: None,
            line_spacing,
        }
    }
}

/// A float that has been placed, with the row it was requested from.
#[derive(Debug, Clone)]
pub struct PlacedFloat {
    /// The float, positioned.
    pub primitive: Primitive,
    /// Row that was current when the float was placed.
    pub row_index: usize,
}

/// Where a link run was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkChunk {
    /// Bounds of the run.
    pub rect: Rect,
    /// Link target.
    pub href: String,
}

/// Placements that could not honour the container width.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    /// A primitive that could not split was wider than its row allowed and
    /// was placed overflowing.
    NarrowContainer {
        /// Row the primitive was placed in.
        row: usize,
        /// Width of the placed primitive.
        width: f32,
        /// Width that was available.
        limit: f32,
    },
    /// A float was wider than the space beside the other floats and there
    /// was nothing to move below.
    FloatTooWide {
        /// Row the float was requested from.
        row: usize,
        /// Width of the float.
        width: f32,
        /// Width that was available.
        limit: f32,
    },
}

impl LayoutWarning {
    /// Row the warning was raised on.
    #[must_use]
    pub const fn row(&self) -> usize {
        match self {
            Self::NarrowContainer { row, .. } | Self::FloatTooWide { row, .. } => *row,
        }
    }
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NarrowContainer { row, width, limit } => write!(
                f,
                "row {row}: text box too narrow, {width}px item placed in {limit}px"
            ),
            Self::FloatTooWide { row, width, limit } => write!(
                f,
                "row {row}: {width}px float does not fit in {limit}px beside other floats"
            ),
        }
    }
}

/// Errors from editing a laid-out text box.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The row, item or letter addressed does not exist, or there is no
    /// text run to copy a style from.
    #[error("no insertion point at row {row}, item {item}, letter {letter}")]
    InvalidInsertionPoint {
        /// Row index.
        row: usize,
        /// Item index within the row.
        item: usize,
        /// Letter offset.
        letter: usize,
    },
}

/// Free horizontal space at some height, after subtracting floats.
struct FreeSpan {
    left: f32,
    right: f32,
    /// Bottom of the highest-ending overlapping float.
    nearest_bottom: Option<f32>,
    /// Bottom of the lowest-ending overlapping float.
    furthest_bottom: Option<f32>,
}

/// Rows and floats laid out from a queue of primitives.
#[derive(Debug)]
pub struct TextBoxLayout {
    arena: Vec<Primitive>,
    constraints: LayoutConstraints,
    alignment: HorizontalAlignment,
    queue: VecDeque<Primitive>,
    rows: Vec<LayoutRow>,
    floats: Vec<PlacedFloat>,
    content: Rect,
    warnings: Vec<LayoutWarning>,
    links: Vec<LinkChunk>,
    cursor_letter: usize,
    cursor_row: usize,
    cursor_active: bool,
}

impl TextBoxLayout {
    /// Lay out `input` within `constraints`.
    pub fn new(
        input: impl IntoIterator<Item = Primitive>,
        constraints: LayoutConstraints,
        alignment: HorizontalAlignment,
    ) -> Self {
        let mut layout = Self {
            arena: input.into_iter().collect(),
            constraints,
            alignment,
            queue: VecDeque::new(),
            rows: Vec::new(),
            floats: Vec::new(),
            content: Rect::new(0.0, 0.0, constraints.width, 0.0),
            warnings: Vec::new(),
            links: Vec::new(),
            cursor_letter: 0,
            cursor_row: 0,
            cursor_active: false,
        };
        layout.renumber_arena();
        layout.relayout_from(0, SourceSpan::default());
        layout
    }

    /// Finished rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[LayoutRow] {
        &self.rows
    }

    /// Placed floats in placement order.
    #[must_use]
    pub fn floats(&self) -> &[PlacedFloat] {
        &self.floats
    }

    /// The container width and the height of everything placed.
    #[must_use]
    pub const fn content_rect(&self) -> Rect {
        self.content
    }

    /// Geometry warnings from the passes that built the current rows.
    #[must_use]
    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Link runs and where they were placed.
    #[must_use]
    pub fn links(&self) -> &[LinkChunk] {
        &self.links
    }

    /// The unsplit input primitives.
    #[must_use]
    pub fn input(&self) -> &[Primitive] {
        &self.arena
    }

    /// Current constraints.
    #[must_use]
    pub const fn constraints(&self) -> LayoutConstraints {
        self.constraints
    }

    /// Letters across all rows.
    #[must_use]
    pub fn letter_count(&self) -> usize {
        self.rows.iter().map(|row| row.letter_count).sum()
    }

    /// True when the input holds at least one text run.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.arena.iter().any(|primitive| primitive.as_text().is_some())
    }

    /// Re-run the whole layout at a new width.
    pub fn reprocess(&mut self, width: f32) {
        self.constraints.width = width;
        self.relayout_from(0, SourceSpan::default());
    }

    /// Change the container size and re-run the layout.
    pub fn set_dimensions(&mut self, width: f32, height: Option<f32>) {
        self.constraints.height = height;
        self.reprocess(width);
    }

    /// Change row alignment and re-run the layout.
    pub fn set_alignment(&mut self, alignment: HorizontalAlignment) {
        self.alignment = alignment;
        self.relayout_from(0, SourceSpan::default());
    }

    /// Href of the link run under `(x, y)`.
    #[must_use]
    pub fn link_at(&self, x: f32, y: f32) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rect.contains(x, y))
            .map(|link| link.href.as_str())
    }

    /// Insert `text` into the run at `item` of `row`, before letter `letter`
    /// of that item, and re-lay out from that row.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidInsertionPoint`] if the address does not exist
    /// or there is no text run to take a style from.
    pub fn insert_text(
        &mut self,
        text: &str,
        row: usize,
        item: usize,
        letter: usize,
    ) -> Result<(), LayoutError> {
        let row_letter = self.row_letter(row, item, letter)?;
        self.insert_text_at_row_letter(text, row, row_letter)
    }

    /// Insert `text` at letter `letter` counted from the start of `row`.
    ///
    /// Text lands in the run that ends at or contains the position. A row
    /// without text gets a new run styled like the nearest text before it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidInsertionPoint`] if the row or letter does not
    /// exist or there is no text run to take a style from.
    pub fn insert_text_at_row_letter(
        &mut self,
        text: &str,
        row: usize,
        letter: usize,
    ) -> Result<(), LayoutError> {
        let invalid = LayoutError::InvalidInsertionPoint {
            row,
            item: 0,
            letter,
        };
        if self.rows.get(row).is_none_or(|target| letter > target.letter_count) {
            return Err(invalid);
        }
        let restart = self.restart_point(row);

        if let Some((index, offset)) = self.locate_in_row(row, letter) {
            self.arena[index].insert_text(offset, text);
        } else {
            let position = self.row_insert_position(row);
            let mut run = self.text_template(position).ok_or(invalid)?;
            text.clone_into(&mut run.text);
            self.arena.insert(position, Primitive::text(run));
            self.shift_sources(position, 1);
            self.renumber_arena();
        }

        debug!(row, letter, "text inserted");
        self.relayout_from(row, restart);
        Ok(())
    }

    /// Splice `primitives` into the input at the addressed point, splitting
    /// the addressed text run if needed, and re-lay out from that row.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidInsertionPoint`] if the address does not exist.
    pub fn insert_primitives(
        &mut self,
        primitives: Vec<Primitive>,
        row: usize,
        item: usize,
        letter: usize,
    ) -> Result<(), LayoutError> {
        let row_letter = self.row_letter(row, item, letter)?;
        let restart = self.restart_point(row);
        let count = primitives.len();

        let position = match self.locate_in_row(row, row_letter) {
            Some((index, 0)) => {
                self.shift_sources(index, count);
                index
            }
            Some((index, offset)) if offset >= self.arena[index].letter_count() => {
                self.shift_sources(index + 1, count);
                index + 1
            }
            Some((index, offset)) => {
                // Split the run so the new primitives land between its halves.
                let entry = &mut self.arena[index];
                let tail = entry.slice_from(offset);
                if let Some(run) = entry.as_text_mut() {
                    let cut = run.byte_offset(offset);
                    run.text.truncate(cut);
                    let width = run.width();
                    entry.rect.width = width;
                }
                if let Some(tail) = tail {
                    self.arena.insert(index + 1, tail);
                }
                self.shift_sources(index + 1, count + 1);
                index + 1
            }
            None => {
                let position = self.row_insert_position(row);
                self.shift_sources(position, count);
                position
            }
        };

        let _ = self.arena.splice(position..position, primitives);
        self.renumber_arena();
        debug!(row, count, "primitives inserted");
        self.relayout_from(row, restart);
        Ok(())
    }

    /// Move the cursor to letter `letter` of the whole text, clamped to the
    /// text length.
    pub fn set_cursor_position(&mut self, letter: usize) {
        self.cursor_letter = letter;
        self.apply_cursor();
    }

    /// Move the cursor to the letter gap nearest `(x, y)` and return its
    /// letter index. Points below the last row select in the last row.
    pub fn set_cursor_from_click(&mut self, x: f32, y: f32) -> usize {
        let Some(index) = self
            .rows
            .iter()
            .position(|row| y < row.rect.bottom())
            .or_else(|| self.rows.len().checked_sub(1))
        else {
            return 0;
        };
        let before: usize = self.rows[..index].iter().map(|row| row.letter_count).sum();
        let row = &mut self.rows[index];
        row.set_cursor_from_click(x, y);
        self.cursor_letter = before + row.cursor_position;
        self.cursor_row = index;
        self.apply_cursor();
        self.cursor_letter
    }

    /// Show or hide the edit cursor.
    pub fn toggle_cursor(&mut self) {
        self.cursor_active = !self.cursor_active;
        self.apply_cursor();
    }

    /// Whether the edit cursor is shown.
    #[must_use]
    pub const fn cursor_active(&self) -> bool {
        self.cursor_active
    }

    /// Cursor position in letters from the start of the text.
    #[must_use]
    pub const fn cursor_letter(&self) -> usize {
        self.cursor_letter
    }

    /// Row the cursor is drawn in.
    #[must_use]
    pub const fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    /// Insert `text` at the cursor and advance the cursor past it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidInsertionPoint`] if there is no text run to
    /// take a style from.
    pub fn insert_text_at_cursor(&mut self, text: &str) -> Result<(), LayoutError> {
        let row = self.cursor_row;
        let letter = self.rows.get(row).map_or(0, |row| row.cursor_position);
        self.insert_text_at_row_letter(text, row, letter)?;
        self.cursor_letter += text.graphemes(true).count();
        self.apply_cursor();
        Ok(())
    }

    /// Draw every row, then every float, onto `surface`.
    ///
    /// With `reveal` set only that many letters are drawn; a float is drawn
    /// once the letters before its row are all revealed.
    pub fn finalize_to_surface<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        reveal: Option<usize>,
        cursor_width: f32,
    ) {
        let mut row_starts = Vec::with_capacity(self.rows.len());
        let mut letters = 0;
        for row in &self.rows {
            row_starts.push(letters);
            letters = row.finalize(surface, reveal, letters, cursor_width);
            if reveal.is_none() {
                letters += row.letter_count;
            }
        }

        for float in &self.floats {
            let row_start = row_starts.get(float.row_index).copied().unwrap_or(letters);
            if reveal.is_none_or(|limit| row_start < limit) {
                let rect = float.primitive.rect;
                let placement = RowPlacement {
                    top: rect.y,
                    height: rect.height,
                    baseline: 0.0,
                };
                float.primitive.finalize(surface, placement, None);
            }
        }
    }

    /// Letter offset from the start of `row` for an item address.
    fn row_letter(&self, row: usize, item: usize, letter: usize) -> Result<usize, LayoutError> {
        let invalid = LayoutError::InvalidInsertionPoint { row, item, letter };
        let Some(target) = self.rows.get(row) else {
            return Err(invalid);
        };
        if item > target.items.len() {
            return Err(invalid);
        }
        match target.items.get(item) {
            Some(entry) if letter > entry.letter_count() => return Err(invalid),
            None if letter > 0 => return Err(invalid),
            _ => {}
        }
        let before: usize = target.items[..item]
            .iter()
            .map(Primitive::letter_count)
            .sum();
        Ok(before + letter)
    }

    /// Arena entry and letter offset for letter `letter` of `row`, using the
    /// first run whose end is at or past the letter.
    fn locate_in_row(&self, row: usize, letter: usize) -> Option<(usize, usize)> {
        let mut before = 0;
        for item in &self.rows.get(row)?.items {
            let Some(run) = item.as_text() else { continue };
            let count = run.letter_count();
            if letter <= before + count {
                return self.arena_position(item.source, letter - before);
            }
            before += count;
        }
        None
    }

    /// Follow a placed item (possibly several merged runs) back into the
    /// arena.
    fn arena_position(&self, source: SourceSpan, offset: usize) -> Option<(usize, usize)> {
        let mut remaining = source.offset + offset;
        for (index, entry) in self.arena.iter().enumerate().skip(source.index) {
            if let Some(run) = entry.as_text() {
                let count = run.letter_count();
                if remaining <= count {
                    return Some((index, remaining));
                }
                remaining -= count;
            }
        }
        None
    }

    /// Arena position for new primitives in a row with no text: before the
    /// row's first item, or after everything for an empty row.
    fn row_insert_position(&self, row: usize) -> usize {
        self.rows
            .get(row)
            .and_then(LayoutRow::first_source_index)
            .unwrap_or(self.arena.len())
    }

    /// A copy of the nearest text run before `position`, or after it when
    /// nothing precedes it.
    fn text_template(&self, position: usize) -> Option<TextRun> {
        let (before, after) = self.arena.split_at(position.min(self.arena.len()));
        before
            .iter()
            .rev()
            .chain(after)
            .find_map(Primitive::as_text)
            .cloned()
    }

    /// Earliest input position drawn in `row` or later.
    fn restart_point(&self, row: usize) -> SourceSpan {
        let row_start = self
            .rows
            .get(row)
            .and_then(|target| target.items.iter().map(|item| item.source).min());
        let float_start = self
            .floats
            .iter()
            .filter(|float| float.row_index >= row)
            .map(|float| float.primitive.source)
            .min();
        row_start
            .into_iter()
            .chain(float_start)
            .min()
            .unwrap_or(SourceSpan {
                index: self.arena.len(),
                offset: 0,
            })
    }

    /// Move kept rows' and floats' sources past `count` new arena entries
    /// inserted at `position`.
    fn shift_sources(&mut self, position: usize, count: usize) {
        let shift = |source: &mut SourceSpan| {
            if source.index >= position {
                source.index += count;
            }
        };
        self.rows
            .iter_mut()
            .flat_map(|row| row.items.iter_mut())
            .for_each(|item| shift(&mut item.source));
        self.floats
            .iter_mut()
            .for_each(|float| shift(&mut float.primitive.source));
    }

    fn renumber_arena(&mut self) {
        for (index, entry) in self.arena.iter_mut().enumerate() {
            entry.source = SourceSpan { index, offset: 0 };
        }
    }

    /// Drop rows from `row` on, rebuild the queue from `restart` and run a
    /// pass. Floats placed from earlier rows are kept and not re-queued.
    fn relayout_from(&mut self, row: usize, restart: SourceSpan) {
        let top = if row == 0 {
            0.0
        } else {
            self.rows.get(row).map_or(0.0, |target| target.rect.y)
        };
        self.rows.truncate(row);
        self.floats.retain(|float| float.row_index < row);
        self.warnings.retain(|warning| warning.row() < row);

        let kept_floats: HashSet<usize> = self
            .floats
            .iter()
            .map(|float| float.primitive.source.index)
            .collect();
        self.queue = self
            .arena
            .iter()
            .enumerate()
            .skip(restart.index)
            .filter(|(index, _)| !kept_floats.contains(index))
            .filter_map(|(index, entry)| {
                let offset = if index == restart.index { restart.offset } else { 0 };
                entry.slice_from(offset)
            })
            .collect();

        if row > 0 {
            debug!(from_row = row, queued = self.queue.len(), "partial relayout");
        }
        let current = self.new_row(top);
        self.run_pass(current);
    }

    fn run_pass(&mut self, mut row: LayoutRow) {
        while let Some(mut item) = self.queue.pop_front() {
            item.rect.x = row.rect.right();
            item.rect.y = row.rect.y;

            row = if item.is_line_break() {
                self.handle_line_break(row, item)
            } else if item.should_span() {
                self.handle_span(row, item)
            } else if let Some(side) = item.float_side() {
                self.handle_float(row, item, side)
            } else {
                self.handle_regular(row, item)
            };
        }
        self.rows.push(row);
        self.finish_pass();
    }

    fn new_row(&self, y: f32) -> LayoutRow {
        LayoutRow::new(
            0.0,
            y,
            self.rows.len(),
            self.constraints.line_spacing,
            self.constraints.height,
        )
    }

    /// Seal `row` and start the next one at `y`.
    fn seal(&mut self, row: LayoutRow, y: f32) -> LayoutRow {
        self.rows.push(row);
        self.new_row(y)
    }

    fn handle_line_break(&mut self, mut row: LayoutRow, item: Primitive) -> LayoutRow {
        row.add_item(item);
        let next_y = row.rect.bottom();
        self.seal(row, next_y)
    }

    fn handle_span(&mut self, mut row: LayoutRow, mut item: Primitive) -> LayoutRow {
        if !row.at_start() {
            let next_y = row.rect.bottom();
            row = self.seal(row, next_y);
        }
        item.rect.x = 0.0;
        item.rect.y = row.rect.y;
        item.rect.width = self.constraints.width;
        row.add_item(item);
        let next_y = row.rect.bottom();
        self.seal(row, next_y)
    }

    fn handle_float(
        &mut self,
        mut row: LayoutRow,
        mut item: Primitive,
        side: FloatSide,
    ) -> LayoutRow {
        // STEP 1: Push the float against its edge, past floats it overlaps.
        let span = self.free_span(&item.rect);
        item.rect.x = match side {
            FloatSide::Left => span.left,
            FloatSide::Right => span.right - item.rect.width,
        };
        let fits = item.rect.x >= span.left && item.rect.right() <= span.right;

        // STEP 2: If it does not fit, move below the lowest colliding float
        // and try again from there.
        if !fits && let Some(bottom) = span.furthest_bottom {
            self.queue.push_front(item);
            let next_y = row.rect.bottom().max(bottom);
            if row.at_start() {
                row.rect.y = next_y;
                return row;
            }
            return self.seal(row, next_y);
        }

        if !fits {
            let limit = span.right - span.left;
            self.warn(LayoutWarning::FloatTooWide {
                row: row.index,
                width: item.rect.width,
                limit,
            });
            item.rect.x = span.left;
        }

        // STEP 3: Register it, then re-run the current row's items so they
        // flow around it.
        self.floats.push(PlacedFloat {
            primitive: item,
            row_index: row.index,
        });
        row.rewind(&mut self.queue);
        row
    }

    fn handle_regular(&mut self, mut row: LayoutRow, mut item: Primitive) -> LayoutRow {
        let span = self.free_span(&item.rect);
        if row.at_start() {
            item.rect.x = span.left;
        }
        if item.rect.right() <= span.right {
            row.add_item(item);
            return row;
        }
        self.split_and_move(row, item, &span)
    }

    /// Put as much of `item` as fits on `row`, queue the rest and start a
    /// new row. An empty row never rejects its first item outright: it
    /// moves below the floats narrowing it, or accepts the item overflowing.
    fn split_and_move(
        &mut self,
        mut row: LayoutRow,
        mut item: Primitive,
        span: &FreeSpan,
    ) -> LayoutRow {
        let available = span.right - span.left;
        let offset = span.right - item.rect.x;
        let narrowed = span.nearest_bottom.is_some();
        // Only an empty row with nowhere lower to go takes an overlong first word.
        let overlong_limit = if row.at_start() && !narrowed {
            available
        } else {
            f32::INFINITY
        };

        let remainder = if item.can_split() {
            item.split(offset, overlong_limit)
        } else {
            None
        };

        match remainder {
            Some(rest) => {
                let width = item.content_width();
                if width > available {
                    self.warn(LayoutWarning::NarrowContainer {
                        row: row.index,
                        width,
                        limit: available,
                    });
                }
                row.add_item(item);
                self.queue.push_front(rest);
            }
            None if row.at_start() => {
                if let Some(bottom) = span.nearest_bottom {
                    self.queue.push_front(item);
                    row.rect.y = bottom;
                    return row;
                }
                self.warn(LayoutWarning::NarrowContainer {
                    row: row.index,
                    width: item.rect.width,
                    limit: available,
                });
                // Left open: the next item overflows and seals it, a line
                // break joins it.
                row.add_item(item);
                return row;
            }
            None => self.queue.push_front(item),
        }

        let next_y = row.rect.bottom();
        self.seal(row, next_y)
    }

    /// Space left between the floats that vertically overlap `band`.
    fn free_span(&self, band: &Rect) -> FreeSpan {
        let mut span = FreeSpan {
            left: 0.0,
            right: self.constraints.width,
            nearest_bottom: None,
            furthest_bottom: None,
        };
        for float in &self.floats {
            let rect = &float.primitive.rect;
            if !rect.vertical_overlap(band) {
                continue;
            }
            match float.primitive.float_side() {
                Some(FloatSide::Left) => span.left = span.left.max(rect.right()),
                Some(FloatSide::Right) => span.right = span.right.min(rect.x),
                None => {}
            }
            let bottom = rect.bottom();
            span.nearest_bottom = Some(span.nearest_bottom.map_or(bottom, |b| b.min(bottom)));
            span.furthest_bottom = Some(span.furthest_bottom.map_or(bottom, |b| b.max(bottom)));
        }
        span
    }

    /// Record a warning once; rewound rows re-place the same items.
    fn warn(&mut self, warning: LayoutWarning) {
        if self.warnings.contains(&warning) {
            return;
        }
        quill_common::warning::warn("layout", &warning.to_string());
        self.warnings.push(warning);
    }

    /// Merge runs, align rows, measure the content and collect links.
    fn finish_pass(&mut self) {
        for row in &mut self.rows {
            row.merge_adjacent_compatible_chunks();
        }

        if self.alignment != HorizontalAlignment::Left {
            for index in 0..self.rows.len() {
                let span = self.free_span(&self.rows[index].rect);
                self.rows[index].align(self.alignment, span.left, span.right);
            }
        }

        let rows_bottom = self.rows.iter().map(|row| row.rect.bottom());
        let floats_bottom = self.floats.iter().map(|float| float.primitive.rect.bottom());
        let height = rows_bottom.chain(floats_bottom).fold(0.0_f32, f32::max);
        self.content = Rect::new(0.0, 0.0, self.constraints.width, height);

        self.links = self
            .rows
            .iter()
            .flat_map(|row| &row.items)
            .filter_map(|item| {
                item.link_href().map(|href| LinkChunk {
                    rect: item.rect,
                    href: href.to_string(),
                })
            })
            .collect();

        self.apply_cursor();
        debug!(
            rows = self.rows.len(),
            floats = self.floats.len(),
            height,
            "layout pass complete"
        );
    }

    /// Place the cursor in the row holding `cursor_letter`, keeping the
    /// current cursor row when the letter sits on its boundary.
    fn apply_cursor(&mut self) {
        self.cursor_letter = self.cursor_letter.min(self.letter_count());
        let mut chosen = None;
        let mut before = 0;
        for (index, row) in self.rows.iter().enumerate() {
            let end = before + row.letter_count;
            if (before..=end).contains(&self.cursor_letter)
                && (chosen.is_none() || index == self.cursor_row)
            {
                chosen = Some((index, before));
            }
            before = end;
        }

        for row in &mut self.rows {
            row.edit_cursor_active = false;
        }
        if let Some((index, before)) = chosen {
            self.cursor_row = index;
            let row = &mut self.rows[index];
            row.set_cursor_position(self.cursor_letter - before);
            row.edit_cursor_active = self.cursor_active;
        }
    }
}
