//! Rich text layout for Quill text boxes.
//!
//! Markup goes through three stages before it reaches pixels:
//!
//! ```text
//! markup → MarkupParser → primitive queue → TextBoxLayout → rows + floats → Surface
//!              ↑                                  ↑
//!          StyleStack                      split / rewind / float avoidance
//! ```
//!
//! The parser walks the tag stream produced by `quill-markup`, keeps a
//! [`StyleStack`] of tag deltas and emits [`Primitive`]s. The layout engine
//! drains that queue into [`LayoutRow`]s, wrapping and splitting text and
//! flowing rows around left and right floats. [`TextBox`] ties the stages
//! together and owns the finished pixel surface, including partial reveal,
//! alpha fade and an edit cursor.
//!
//! Fonts, colours and the pixel buffer are collaborators behind the
//! [`FontResolver`], [`ColourResolver`] and [`Surface`] traits.

/// Colours and linear gradients.
pub mod colour;
/// Layout and text box settings.
pub mod config;
/// Font collaborator traits and approximate metrics.
pub mod font;
/// Rectangles.
pub mod geometry;
/// Rows, primitives and the box layout engine.
pub mod layout;
/// Pixel surface abstraction.
pub mod paint;
/// Markup to primitive queue.
pub mod parser;
/// Style state and the delta style stack.
pub mod style;
/// The text box facade.
pub mod text_box;
/// Theme loading and colour/font resolution.
pub mod theme;

pub use colour::{Colour, ColourGradient, ColourOrGradient, ColourParseError, parse_colour_or_gradient};
pub use config::{HorizontalAlignment, TextBoxConfig};
pub use font::{
    ApproximateFontMetrics, ApproximateFontResolver, FontHandle, FontKey, FontMetrics,
    FontResolver, GlyphBitmap,
};
pub use geometry::Rect;
pub use layout::{
    BlockContent, FloatSide, LayoutConstraints, LayoutError, LayoutRow, LayoutWarning, LinkChunk,
    PlacedFloat, Primitive, PrimitiveKind, SourceSpan, TextBoxLayout, TextRun,
};
pub use paint::Surface;
pub use parser::{ImageStore, MarkupParser, ParseIssue, ParseOutput};
pub use style::{
    DefaultStyle, FontSizeError, StyleAttribute, StyleDelta, StyleStack, StyleState, StyleValue,
    html_font_size,
};
pub use text_box::{TextBox, TextBoxResources};
pub use theme::{ColourResolver, ElementIds, FontInfo, Theme, ThemeError, build_all_combined_ids};
