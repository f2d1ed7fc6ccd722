//! Concrete collaborators for Quill text boxes.
//!
//! `quill-text` lays out and draws against traits. This crate supplies the
//! real implementations a program wants:
//!
//! - [`FontdueFontMetrics`] - exact advances and glyph bitmaps from a font
//!   file via `fontdue`
//! - [`FontDictionary`] - a caching [`FontResolver`](quill_text::FontResolver)
//!   that loads the faces named by a theme, then system fonts, and finally
//!   falls back to approximate metrics
//! - [`render_markup`] / [`save_png`] - markup to pixels to disk

pub mod font_dictionary;
pub mod font_metrics;

pub use font_dictionary::{FacePaths, FontDictionary};
pub use font_metrics::FontdueFontMetrics;

use std::path::Path;
use std::rc::Rc;

use anyhow::{Result, bail};
use image::RgbaImage;
use quill_text::{ElementIds, TextBox, TextBoxResources, Theme};

/// Element id used for boxes rendered without a caller-supplied hierarchy.
pub const DEFAULT_ELEMENT_ID: &str = "text_box";

/// Lay out and draw `markup` in a box `width` pixels wide.
///
/// With a fixed `height` the image is exactly that tall; otherwise it fits
/// the content. Fonts come from the theme's font blocks and the system.
///
/// # Errors
///
/// Returns an error if `width` is not a positive finite number or `height`
/// is negative.
pub fn render_markup(
    markup: &str,
    width: f32,
    height: Option<f32>,
    theme: &Theme,
) -> Result<RgbaImage> {
    let text_box = build_text_box(markup, width, height, Rc::new(theme.clone()))?;
    Ok(text_box.surface().clone())
}

/// Build a [`TextBox`] backed by a [`FontDictionary`] for `theme`.
///
/// # Errors
///
/// Returns an error if `width` is not a positive finite number or `height`
/// is negative.
pub fn build_text_box(
    markup: &str,
    width: f32,
    height: Option<f32>,
    theme: Rc<Theme>,
) -> Result<TextBox> {
    if !(width.is_finite() && width > 0.0) {
        bail!("box width must be a positive number, got {width}");
    }
    if let Some(height) = height
        && !(height.is_finite() && height >= 0.0)
    {
        bail!("box height must be a non-negative number, got {height}");
    }

    let fonts = Rc::new(FontDictionary::from_theme(&theme));
    let resources = TextBoxResources::new(theme, fonts);
    let text_box = TextBox::new(
        markup,
        width,
        height,
        resources,
        ElementIds::element(DEFAULT_ELEMENT_ID),
    );
    tracing::debug!(
        rows = text_box.layout().rows().len(),
        issues = text_box.issues().len(),
        "Rendered text box"
    );
    Ok(text_box)
}

/// Write `image` to `path` as a PNG.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| anyhow::anyhow!("failed to save image to '{}': {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_height_sets_image_size() {
        let image = render_markup("<b>hello</b> world", 120.0, Some(40.0), &Theme::default())
            .unwrap();
        assert_eq!(image.dimensions(), (120, 40));
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        let theme = Theme::default();
        assert!(render_markup("x", 0.0, None, &theme).is_err());
        assert!(render_markup("x", f32::NAN, None, &theme).is_err());
        assert!(render_markup("x", 10.0, Some(-1.0), &theme).is_err());
    }

    #[test]
    fn png_is_written() {
        let image = render_markup("png", 40.0, Some(20.0), &Theme::default()).unwrap();
        let path = std::env::temp_dir().join(format!("quill-render-{}.png", std::process::id()));
        save_png(&image, &path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(reloaded, image);
    }
}
