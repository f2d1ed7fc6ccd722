//! The text box: markup in, finished pixels out.

use std::rc::Rc;

use image::RgbaImage;

use crate::colour::Colour;
use crate::config::TextBoxConfig;
use crate::font::FontResolver;
use crate::layout::{LayoutConstraints, LayoutError, TextBoxLayout};
use crate::paint::Surface;
use crate::parser::{ImageStore, MarkupParser, ParseIssue};
use crate::style::DefaultStyle;
use crate::theme::{ElementIds, Theme};

/// Shared collaborators a text box draws with.
#[derive(Clone)]
pub struct TextBoxResources {
    /// Colours, fonts and settings.
    pub theme: Rc<Theme>,
    /// Font lookup.
    pub fonts: Rc<dyn FontResolver>,
    /// Images for `<img src>`.
    pub images: ImageStore,
}

impl TextBoxResources {
    /// Resources with no images.
    #[must_use]
    pub fn new(theme: Rc<Theme>, fonts: Rc<dyn FontResolver>) -> Self {
        Self {
            theme,
            fonts,
            images: ImageStore::new(),
        }
    }
}

/// Parsed, laid-out and drawn markup.
///
/// The surface is redrawn in full after every change. Alpha fades reuse a
/// cached opaque copy instead of redrawing.
pub struct TextBox {
    markup: String,
    ids: ElementIds,
    resources: TextBoxResources,
    config: TextBoxConfig,
    layout: TextBoxLayout,
    issues: Vec<ParseIssue>,
    surface: RgbaImage,
    opaque: Option<RgbaImage>,
    alpha: u8,
    reveal: Option<usize>,
}

impl TextBox {
    /// Parse `markup`, lay it out `width` wide and draw it. With a fixed
    /// `height` the surface is that tall; otherwise it fits the content.
    ///
    /// `width` should be finite and positive. The surface is at least one
    /// pixel and at most 16384 pixels on each side.
    #[must_use]
    pub fn new(
        markup: impl Into<String>,
        width: f32,
        height: Option<f32>,
        resources: TextBoxResources,
        ids: ElementIds,
    ) -> Self {
        let markup = markup.into();
        let config = TextBoxConfig::from_theme(&resources.theme, &ids);
        let (layout, issues) = build_layout(&markup, width, height, &resources, &ids, config);
        let mut text_box = Self {
            markup,
            ids,
            resources,
            config,
            layout,
            issues,
            surface: RgbaImage::new(1, 1),
            opaque: None,
            alpha: 255,
            reveal: None,
        };
        text_box.redraw();
        text_box
    }

    /// The markup the box was built from.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The finished pixels.
    #[must_use]
    pub const fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// The layout behind the surface.
    #[must_use]
    pub const fn layout(&self) -> &TextBoxLayout {
        &self.layout
    }

    /// Markup problems from the last parse.
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> TextBoxConfig {
        self.config
    }

    /// Current alpha.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Letters currently revealed, `None` when all are shown.
    #[must_use]
    pub const fn reveal(&self) -> Option<usize> {
        self.reveal
    }

    /// Re-parse the markup and lay it out again. Edits made with
    /// [`insert_text_at_cursor`](Self::insert_text_at_cursor) that went into
    /// an existing run are not part of the markup and are lost.
    pub fn rebuild(&mut self) {
        quill_common::warning::clear_warnings();
        let constraints = self.layout.constraints();
        self.config = TextBoxConfig::from_theme(&self.resources.theme, &self.ids);
        let (layout, issues) = build_layout(
            &self.markup,
            constraints.width,
            constraints.height,
            &self.resources,
            &self.ids,
            self.config,
        );
        self.layout = layout;
        self.issues = issues;
        self.redraw();
    }

    /// Resize. The layout is re-run at the new width. Surface sizes are
    /// bounded as in [`TextBox::new`].
    pub fn set_dimensions(&mut self, width: f32, height: Option<f32>) {
        self.layout.set_dimensions(width, height);
        self.redraw();
    }

    /// Draw only the first `letters` letters, or everything for `None`.
    pub fn set_reveal(&mut self, letters: Option<usize>) {
        self.reveal = letters;
        self.redraw();
    }

    /// Fade the whole surface. The first fade keeps an opaque copy that
    /// every later alpha is applied to.
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
        let opaque = self.opaque.get_or_insert_with(|| self.surface.clone());
        self.surface.clone_from(opaque);
        if alpha < u8::MAX {
            self.surface.multiply(Colour::rgba(255, 255, 255, alpha));
        }
    }

    /// Show or hide the edit cursor.
    pub fn toggle_cursor(&mut self) {
        self.layout.toggle_cursor();
        self.redraw();
    }

    /// Move the edit cursor to letter `letter` of the text.
    pub fn set_cursor_position(&mut self, letter: usize) {
        self.layout.set_cursor_position(letter);
        self.redraw();
    }

    /// Move the edit cursor to the gap nearest a point in box coordinates
    /// and return its letter index.
    pub fn set_cursor_from_click(&mut self, x: f32, y: f32) -> usize {
        let letter = self.layout.set_cursor_from_click(x, y);
        self.redraw();
        letter
    }

    /// Type `text` at the cursor. A box with no text yet takes it as
    /// markup and is rebuilt.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidInsertionPoint`] if the cursor row no longer
    /// exists.
    pub fn insert_text_at_cursor(&mut self, text: &str) -> Result<(), LayoutError> {
        if self.layout.has_text() {
            self.layout.insert_text_at_cursor(text)?;
        } else {
            self.markup.push_str(&escape_markup(text));
            let active = self.layout.cursor_active();
            self.rebuild();
            if active {
                self.layout.toggle_cursor();
            }
            self.layout.set_cursor_position(usize::MAX);
        }
        self.redraw();
        Ok(())
    }

    /// Href of the link under a point in box coordinates.
    #[must_use]
    pub fn link_at(&self, x: f32, y: f32) -> Option<&str> {
        self.layout.link_at(x, y)
    }

    fn redraw(&mut self) {
        let constraints = self.layout.constraints();
        let height = constraints
            .height
            .unwrap_or_else(|| self.layout.content_rect().height);
        let width = surface_extent(constraints.width);
        let height = surface_extent(height);

        if self.surface.dimensions() == (width, height) {
            self.surface.clear();
        } else {
            self.surface = RgbaImage::new(width, height);
        }
        self.layout
            .finalize_to_surface(&mut self.surface, self.reveal, self.config.cursor_width);

        self.opaque = None;
        if self.alpha < u8::MAX {
            self.set_alpha(self.alpha);
        }
    }
}

/// Largest surface side, in pixels.
const MAX_SURFACE_EXTENT: u32 = 16_384;

/// Pixel size of a surface side. Zero, negative and NaN lengths give 1,
/// anything past `MAX_SURFACE_EXTENT` (infinity included) is clamped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn surface_extent(length: f32) -> u32 {
    if length.is_nan() || length <= 1.0 {
        return 1;
    }
    let limit = MAX_SURFACE_EXTENT as f32;
    if length > limit {
        let _ = quill_common::warning::warn_once(
            "layout",
            &format!("{length}px surface clamped to {MAX_SURFACE_EXTENT}px"),
        );
        return MAX_SURFACE_EXTENT;
    }
    length.ceil() as u32
}

fn build_layout(
    markup: &str,
    width: f32,
    height: Option<f32>,
    resources: &TextBoxResources,
    ids: &ElementIds,
    config: TextBoxConfig,
) -> (TextBoxLayout, Vec<ParseIssue>) {
    let default_style = DefaultStyle::from_theme(&resources.theme, ids);
    let output = MarkupParser::new(
        resources.theme.as_ref(),
        resources.fonts.as_ref(),
        ids,
        default_style,
    )
    .with_images(&resources.images)
    .parse(markup);

    let constraints = LayoutConstraints {
        width,
        height,
        line_spacing: config.line_spacing,
    };
    let layout = TextBoxLayout::new(output.queue, constraints, config.horizontal_alignment);
    (layout, output.issues)
}

fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::ApproximateFontResolver;

    fn text_box(markup: &str, width: f32) -> TextBox {
        let resources =
            TextBoxResources::new(Rc::new(Theme::default()), Rc::new(ApproximateFontResolver::new()));
        TextBox::new(markup, width, None, resources, ElementIds::element("text_box"))
    }

    #[test]
    fn surface_fits_content() {
        let text_box = text_box("hello<br>world", 200.0);
        // Two rows of 17px text at 1.25 line spacing.
        assert_eq!(text_box.surface().dimensions(), (200, 43));
    }

    #[test]
    fn fixed_height_sizes_surface() {
        let resources =
            TextBoxResources::new(Rc::new(Theme::default()), Rc::new(ApproximateFontResolver::new()));
        let text_box = TextBox::new("x", 50.0, Some(80.0), resources, ElementIds::element("text_box"));
        assert_eq!(text_box.surface().dimensions(), (50, 80));
    }

    #[test]
    fn unbounded_width_clamps_surface() {
        let text_box = text_box("x", f32::INFINITY);
        assert_eq!(text_box.surface().dimensions().0, MAX_SURFACE_EXTENT);
    }

    #[test]
    fn degenerate_lengths_give_one_pixel() {
        assert_eq!(surface_extent(f32::NAN), 1);
        assert_eq!(surface_extent(0.0), 1);
        assert_eq!(surface_extent(-20.0), 1);
        assert_eq!(surface_extent(f32::NEG_INFINITY), 1);
        assert_eq!(surface_extent(10.2), 11);
    }

    #[test]
    fn alpha_fades_from_opaque_copy() {
        let mut text_box = text_box("<body bgcolor='#FF0000'>xxxx</body>", 100.0);
        assert_eq!(text_box.surface().pixel(2, 2).a, 255);

        text_box.set_alpha(51);
        assert_eq!(text_box.surface().pixel(2, 2).a, 51);
        text_box.set_alpha(255);
        assert_eq!(text_box.surface().pixel(2, 2).a, 255);
    }

    #[test]
    fn typing_into_empty_box_rebuilds_markup() {
        let mut text_box = text_box("", 100.0);
        text_box.insert_text_at_cursor("a<b").unwrap();
        assert_eq!(text_box.markup(), "a&lt;b");
        assert_eq!(text_box.layout().letter_count(), 3);
        assert_eq!(text_box.layout().cursor_letter(), 3);
    }

    #[test]
    fn typing_at_cursor_extends_run() {
        let mut text_box = text_box("abc", 100.0);
        text_box.set_cursor_position(1);
        text_box.insert_text_at_cursor("xy").unwrap();
        let run = text_box.layout().rows()[0].items[0].as_text().unwrap();
        assert_eq!(run.text, "axybc");
        assert_eq!(text_box.layout().cursor_letter(), 3);
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape_markup("<a & b>"), "&lt;a &amp; b&gt;");
    }
}
