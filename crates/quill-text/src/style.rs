//! Style state and the delta style stack.
//!
//! Every opening tag pushes a small delta (`<b>` sets `bold`) together with
//! the values it replaced. Closing a tag pops back to the most recent entry
//! with that tag's key, restoring each popped entry's saved values on the
//! way, so mis-nested markup such as `<b><i>x</b>y</i>` still restores
//! exactly.

use std::collections::BTreeMap;

use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::colour::{Colour, ColourOrGradient};
use crate::theme::{ColourResolver, ElementIds, Theme};

/// A style attribute a tag can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StyleAttribute {
    /// Font family name.
    FontName,
    /// Font pixel size.
    FontSize,
    /// Text colour.
    FontColour,
    /// Background colour behind text.
    BgColour,
    /// Bold face.
    Bold,
    /// Italic face.
    Italic,
    /// Underlined text.
    Underline,
    /// Text is part of a link.
    Link,
    /// Link target.
    LinkHref,
}

/// The value of one style attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Font name or link target.
    Text(String),
    /// Font size.
    Size(u32),
    /// Foreground or background colour.
    Colour(ColourOrGradient),
    /// Bold, italic, underline or link.
    Flag(bool),
}

/// A tag's changes, applied in order.
pub type StyleDelta = Vec<(StyleAttribute, StyleValue)>;

/// The composed style at some point in the markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleState {
    values: BTreeMap<StyleAttribute, StyleValue>,
}

impl StyleState {
    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, attribute: StyleAttribute) -> Option<&StyleValue> {
        self.values.get(&attribute)
    }

    /// Set an attribute, returning the value it replaced.
    pub fn set(&mut self, attribute: StyleAttribute, value: StyleValue) -> Option<StyleValue> {
        self.values.insert(attribute, value)
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, attribute: StyleAttribute) -> Option<StyleValue> {
        self.values.remove(&attribute)
    }

    /// True when every [`StyleAttribute`] has a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        use strum::IntoEnumIterator;
        StyleAttribute::iter().all(|attribute| self.values.contains_key(&attribute))
    }

    /// Font family.
    #[must_use]
    pub fn font_name(&self) -> &str {
        match self.get(StyleAttribute::FontName) {
            Some(StyleValue::Text(name)) => name,
            _ => "",
        }
    }

    /// Font pixel size.
    #[must_use]
    pub fn font_size(&self) -> u32 {
        match self.get(StyleAttribute::FontSize) {
            Some(StyleValue::Size(size)) => *size,
            _ => 0,
        }
    }

    /// Text colour.
    #[must_use]
    pub fn font_colour(&self) -> ColourOrGradient {
        self.colour(StyleAttribute::FontColour)
    }

    /// Background colour.
    #[must_use]
    pub fn bg_colour(&self) -> ColourOrGradient {
        self.colour(StyleAttribute::BgColour)
    }

    /// Bold face.
    #[must_use]
    pub fn bold(&self) -> bool {
        self.flag(StyleAttribute::Bold)
    }

    /// Italic face.
    #[must_use]
    pub fn italic(&self) -> bool {
        self.flag(StyleAttribute::Italic)
    }

    /// Underlined.
    #[must_use]
    pub fn underline(&self) -> bool {
        self.flag(StyleAttribute::Underline)
    }

    /// Inside a link.
    #[must_use]
    pub fn link(&self) -> bool {
        self.flag(StyleAttribute::Link)
    }

    /// Link target, when inside a link with a non-empty `href`.
    #[must_use]
    pub fn link_href(&self) -> Option<&str> {
        match self.get(StyleAttribute::LinkHref) {
            Some(StyleValue::Text(href)) if self.link() && !href.is_empty() => Some(href),
            _ => None,
        }
    }

    fn colour(&self, attribute: StyleAttribute) -> ColourOrGradient {
        match self.get(attribute) {
            Some(StyleValue::Colour(colour)) => colour.clone(),
            _ => ColourOrGradient::Colour(Colour::TRANSPARENT),
        }
    }

    fn flag(&self, attribute: StyleAttribute) -> bool {
        matches!(self.get(attribute), Some(StyleValue::Flag(true)))
    }
}

#[derive(Debug, Clone)]
struct StyleStackEntry {
    key: String,
    old_values: Vec<(StyleAttribute, Option<StyleValue>)>,
}

/// Stack of keyed style deltas over a base style.
///
/// The base style is not an entry, so no `pop` can remove it and the
/// current state stays complete whenever the base is complete.
#[derive(Debug, Clone)]
pub struct StyleStack {
    current: StyleState,
    entries: Vec<StyleStackEntry>,
}

impl StyleStack {
    /// A stack whose current style is `base`.
    #[must_use]
    pub const fn new(base: StyleState) -> Self {
        Self {
            current: base,
            entries: Vec::new(),
        }
    }

    /// The composed style.
    #[must_use]
    pub const fn current(&self) -> &StyleState {
        &self.current
    }

    /// Number of pushed entries.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Apply `delta` under `key`, remembering the values it replaces.
    pub fn push(&mut self, key: &str, delta: StyleDelta) {
        let mut old_values = Vec::with_capacity(delta.len());
        for (attribute, value) in delta {
            old_values.push((attribute, self.current.set(attribute, value)));
        }
        self.entries.push(StyleStackEntry {
            key: key.to_string(),
            old_values,
        });
    }

    /// Pop entries down to and including the most recent one pushed under
    /// `key`, restoring saved values innermost first. Returns `false`, and
    /// changes nothing, when no entry has that key.
    pub fn pop(&mut self, key: &str) -> bool {
        if !self.entries.iter().any(|entry| entry.key == key) {
            return false;
        }
        while let Some(entry) = self.entries.pop() {
            // Reverse order so an attribute set twice in one delta ends up
            // at its oldest saved value.
            for (attribute, old) in entry.old_values.into_iter().rev() {
                let _ = match old {
                    Some(value) => self.current.set(attribute, value),
                    None => self.current.remove(attribute),
                };
            }
            if entry.key == key {
                break;
            }
        }
        true
    }
}

/// A `<font size>` value outside the html size table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontSizeError {
    /// Not a number.
    #[error("font size '{0}' is not a number")]
    NotANumber(String),
    /// A number that is not one of the half steps from 1 to 7.
    #[error("font size '{0}' is out of range, expected 1 to 7 in steps of 0.5")]
    OutOfRange(String),
}

/// Pixel sizes for html size steps 1, 1.5, 2 ... 7.
const HTML_FONT_SIZES: [u32; 13] = [8, 9, 10, 11, 12, 13, 14, 16, 18, 20, 24, 32, 48];

/// Map a `<font size>` step to pixels.
///
/// # Errors
///
/// [`FontSizeError`] for anything that is not a half step from 1 to 7.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn html_font_size(step: &str) -> Result<u32, FontSizeError> {
    let value: f32 = step
        .trim()
        .parse()
        .map_err(|_| FontSizeError::NotANumber(step.to_string()))?;
    let half_steps = (value - 1.0) * 2.0;
    if !(0.0..=12.0).contains(&half_steps) || half_steps.fract() != 0.0 {
        return Err(FontSizeError::OutOfRange(step.to_string()));
    }
    Ok(HTML_FONT_SIZES[half_steps as usize])
}

/// The style text has before any markup applies, passed to the parser
/// instead of being read from globals.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultStyle {
    /// Font family.
    pub font_name: String,
    /// Font pixel size.
    pub font_size: u32,
    /// Text colour.
    pub font_colour: ColourOrGradient,
    /// Background colour behind text.
    pub bg_colour: ColourOrGradient,
}

impl Default for DefaultStyle {
    fn default() -> Self {
        Self {
            font_name: "fira_code".to_string(),
            font_size: 14,
            font_colour: Colour::WHITE.into(),
            bg_colour: Colour::TRANSPARENT.into(),
        }
    }
}

impl DefaultStyle {
    /// Font and colours for an element: the theme font, `normal_text` and
    /// `dark_bg`.
    #[must_use]
    pub fn from_theme(theme: &Theme, ids: &ElementIds) -> Self {
        let font = theme.font_info(ids);
        Self {
            font_name: font.name.clone(),
            font_size: font.size,
            font_colour: theme.colour_or_gradient("normal_text", ids),
            bg_colour: theme.colour_or_gradient("dark_bg", ids),
        }
    }

    /// A complete style state with no bold, italic, underline or link.
    #[must_use]
    pub fn to_style_state(&self) -> StyleState {
        let mut state = StyleState::default();
        for (attribute, value) in [
            (StyleAttribute::FontName, StyleValue::Text(self.font_name.clone())),
            (StyleAttribute::FontSize, StyleValue::Size(self.font_size)),
            (StyleAttribute::FontColour, StyleValue::Colour(self.font_colour.clone())),
            (StyleAttribute::BgColour, StyleValue::Colour(self.bg_colour.clone())),
            (StyleAttribute::Bold, StyleValue::Flag(false)),
            (StyleAttribute::Italic, StyleValue::Flag(false)),
            (StyleAttribute::Underline, StyleValue::Flag(false)),
            (StyleAttribute::Link, StyleValue::Flag(false)),
            (StyleAttribute::LinkHref, StyleValue::Text(String::new())),
        ] {
            let _ = state.set(attribute, value);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_stack() -> StyleStack {
        StyleStack::new(DefaultStyle::default().to_style_state())
    }

    fn bold() -> StyleDelta {
        vec![(StyleAttribute::Bold, StyleValue::Flag(true))]
    }

    #[test]
    fn default_state_is_complete() {
        let state = DefaultStyle::default().to_style_state();
        assert!(state.is_complete());
        assert_eq!(state.font_name(), "fira_code");
        assert_eq!(state.font_size(), 14);
        assert!(!state.bold());
        assert_eq!(state.link_href(), None);
    }

    #[test]
    fn push_then_pop_restores_exactly() {
        let mut stack = base_stack();
        let before = stack.current().clone();
        stack.push("font", vec![
            (StyleAttribute::FontSize, StyleValue::Size(48)),
            (StyleAttribute::FontColour, StyleValue::Colour(Colour::rgb(255, 0, 0).into())),
        ]);
        assert_eq!(stack.current().font_size(), 48);
        assert!(stack.pop("font"));
        assert_eq!(stack.current(), &before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn pop_unknown_key_is_a_no_op() {
        let mut stack = base_stack();
        stack.push("b", bold());
        assert!(!stack.pop("i"));
        assert!(stack.current().bold());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn pop_unwinds_inner_entries() {
        let mut stack = base_stack();
        let before = stack.current().clone();
        stack.push("b", bold());
        stack.push("i", vec![(StyleAttribute::Italic, StyleValue::Flag(true))]);
        stack.push("u", vec![(StyleAttribute::Underline, StyleValue::Flag(true))]);

        // Closing <b> first takes <i> and <u> with it.
        assert!(stack.pop("b"));
        assert_eq!(stack.current(), &before);
        assert_eq!(stack.depth(), 0);
        assert!(!stack.pop("i"));
    }

    #[test]
    fn out_of_order_pops_recover_base() {
        let mut stack = base_stack();
        let before = stack.current().clone();
        stack.push("font", vec![(StyleAttribute::FontSize, StyleValue::Size(9))]);
        stack.push("b", bold());
        stack.push("font", vec![(StyleAttribute::FontSize, StyleValue::Size(20))]);

        assert!(stack.pop("b"));
        assert_eq!(stack.current().font_size(), 9);
        assert!(!stack.current().bold());
        assert!(stack.pop("font"));
        assert_eq!(stack.current(), &before);
    }

    #[test]
    fn repeated_key_pops_most_recent() {
        let mut stack = base_stack();
        stack.push("font", vec![(StyleAttribute::FontSize, StyleValue::Size(9))]);
        stack.push("font", vec![(StyleAttribute::FontSize, StyleValue::Size(20))]);
        assert!(stack.pop("font"));
        assert_eq!(stack.current().font_size(), 9);
    }

    #[test]
    fn attribute_touched_twice_in_one_delta() {
        let mut stack = base_stack();
        stack.push("odd", vec![
            (StyleAttribute::FontSize, StyleValue::Size(9)),
            (StyleAttribute::FontSize, StyleValue::Size(20)),
        ]);
        assert!(stack.pop("odd"));
        assert_eq!(stack.current().font_size(), 14);
    }

    #[test]
    fn popping_restores_missing_attribute_as_missing() {
        let mut stack = StyleStack::new(StyleState::default());
        stack.push("b", bold());
        assert!(stack.pop("b"));
        assert_eq!(stack.current().get(StyleAttribute::Bold), None);
    }

    #[test]
    fn html_size_table() {
        assert_eq!(html_font_size("1"), Ok(8));
        assert_eq!(html_font_size("1.5"), Ok(9));
        assert_eq!(html_font_size("4"), Ok(14));
        assert_eq!(html_font_size("4.5"), Ok(16));
        assert_eq!(html_font_size("6.5"), Ok(32));
        assert_eq!(html_font_size(" 7 "), Ok(48));
        assert_eq!(html_font_size("8"), Err(FontSizeError::OutOfRange("8".into())));
        assert_eq!(html_font_size("2.25"), Err(FontSizeError::OutOfRange("2.25".into())));
        assert_eq!(html_font_size("0"), Err(FontSizeError::OutOfRange("0".into())));
        assert_eq!(html_font_size("big"), Err(FontSizeError::NotANumber("big".into())));
    }

    #[test]
    fn attribute_names() {
        assert_eq!(StyleAttribute::FontColour.to_string(), "font_colour");
        assert_eq!("link_href".parse::<StyleAttribute>(), Ok(StyleAttribute::LinkHref));
    }
}
