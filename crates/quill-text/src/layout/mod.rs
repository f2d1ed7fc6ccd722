//! The box layout engine and the pieces it places.
//!
//! [`TextBoxLayout`] drains a queue of [`Primitive`]s into [`LayoutRow`]s,
//! wrapping text, giving spans a row of their own and flowing rows around
//! left and right floats.

mod engine;
mod primitive;
mod row;

pub use engine::{
    LayoutConstraints, LayoutError, LayoutWarning, LinkChunk, PlacedFloat, TextBoxLayout,
};
pub use primitive::{
    BlockContent, FloatSide, Primitive, PrimitiveKind, RowPlacement, SourceSpan, TextRun,
};
pub use row::LayoutRow;
