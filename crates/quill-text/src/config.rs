//! Text box settings.

use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::theme::{ElementIds, Theme};

/// How rows sit between the container edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HorizontalAlignment {
    /// Rows start at the left edge (or beside a left float).
    #[default]
    Left,
    /// Rows are centred in the space left by floats.
    Center,
    /// Rows end at the right edge (or beside a right float).
    Right,
}

/// Settings for a text box's layout and cursor.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextBoxConfig {
    /// Row height as a multiple of its tallest item.
    pub line_spacing: f32,
    /// Row alignment.
    pub horizontal_alignment: HorizontalAlignment,
    /// Edit cursor width in pixels.
    pub cursor_width: f32,
}

impl Default for TextBoxConfig {
    fn default() -> Self {
        Self {
            line_spacing: 1.25,
            horizontal_alignment: HorizontalAlignment::Left,
            cursor_width: 2.0,
        }
    }
}

impl TextBoxConfig {
    /// Read `line_spacing` and `text_horiz_alignment` from the theme's misc
    /// values for `ids`. Unparseable values keep the default and log a
    /// warning.
    #[must_use]
    pub fn from_theme(theme: &Theme, ids: &ElementIds) -> Self {
        let mut config = Self::default();
        if let Some(value) = theme.misc_value("line_spacing", ids) {
            match value.trim().parse::<f32>() {
                Ok(spacing) if spacing > 0.0 => config.line_spacing = spacing,
                _ => quill_common::warning::warn(
                    "theme",
                    &format!("Invalid line_spacing '{value}', using default"),
                ),
            }
        }
        if let Some(value) = theme.misc_value("text_horiz_alignment", ids) {
            match value.trim().parse::<HorizontalAlignment>() {
                Ok(alignment) => config.horizontal_alignment = alignment,
                Err(_) => quill_common::warning::warn(
                    "theme",
                    &format!("Invalid text_horiz_alignment '{value}', using default"),
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TextBoxConfig::default();
        assert!((config.line_spacing - 1.25).abs() < f32::EPSILON);
        assert_eq!(config.horizontal_alignment, HorizontalAlignment::Left);
    }

    #[test]
    fn deserialises_partial_json() {
        let config: TextBoxConfig =
            serde_json::from_str(r#"{"horizontal_alignment": "center"}"#).unwrap();
        assert_eq!(config.horizontal_alignment, HorizontalAlignment::Center);
        assert!((config.cursor_width - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn reads_theme_misc_block() {
        let theme = Theme::from_json_str(
            r#"{"text_box": {"misc": {"line_spacing": "1.5", "text_horiz_alignment": "right"}}}"#,
        )
        .unwrap();
        let config = TextBoxConfig::from_theme(&theme, &ElementIds::element("text_box"));
        assert!((config.line_spacing - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.horizontal_alignment, HorizontalAlignment::Right);
    }

    #[test]
    fn bad_theme_values_keep_defaults() {
        let theme = Theme::from_json_str(
            r#"{"text_box": {"misc": {"line_spacing": "wide", "text_horiz_alignment": "middle"}}}"#,
        )
        .unwrap();
        let config = TextBoxConfig::from_theme(&theme, &ElementIds::element("text_box"));
        assert_eq!(config, TextBoxConfig::default());
    }
}
