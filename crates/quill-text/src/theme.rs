//! Theme loading and colour/font resolution.
//!
//! A theme is a JSON file. The `defaults` block overrides the built-in base
//! colours; every other top-level key is an element or object id carrying
//! optional `colours`, `font` and `misc` blocks:
//!
//! ```json
//! {
//!     "defaults": { "colours": { "normal_text": "#c5cbd8" } },
//!     "text_box": {
//!         "colours": { "dark_bg": "#21282D,#52606A,90" },
//!         "font": { "name": "fira_code", "size": "14", "bold_path": "fonts/FiraCode-Bold.ttf" },
//!         "misc": { "line_spacing": "1.25", "text_horiz_alignment": "left" }
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use quill_common::warning::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::colour::{Colour, ColourOrGradient, parse_colour_or_gradient};

/// Fatal theme configuration problems.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// The theme file could not be read.
    #[error("failed to read theme file '{path}': {source}")]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The theme file is not valid theme JSON.
    #[error("failed to parse theme JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Object and element id hierarchies have different lengths.
    #[error(
        "object id hierarchy is not equal in length to element id hierarchy \
         (element ids: {element_ids:?}, object ids: {object_ids:?})"
    )]
    IdHierarchyMismatch {
        /// Element ids as given.
        element_ids: Vec<String>,
        /// Object ids as given.
        object_ids: Vec<Option<String>>,
    },
}

/// Supplies colours for a symbolic colour id in an element hierarchy.
pub trait ColourResolver {
    /// Resolve `colour_id` (e.g. `normal_text`) for the element at `ids`.
    /// Always returns something; black is the last resort.
    fn colour_or_gradient(&self, colour_id: &str, ids: &ElementIds) -> ColourOrGradient;

    /// Like [`colour_or_gradient`](Self::colour_or_gradient), flattening a
    /// gradient to its first stop.
    fn colour(&self, colour_id: &str, ids: &ElementIds) -> Colour {
        self.colour_or_gradient(colour_id, ids).base_colour()
    }
}

/// The position of an element in the UI hierarchy.
///
/// Element ids name the kind of element at each level (`window`,
/// `text_box`); object ids optionally name a specific instance at the same
/// level (`#help_text`). The combined ids are precomputed on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementIds {
    element_ids: Vec<String>,
    object_ids: Vec<Option<String>>,
    combined: Vec<String>,
}

impl ElementIds {
    /// Validate the two hierarchies and build their combined ids.
    ///
    /// # Errors
    ///
    /// [`ThemeError::IdHierarchyMismatch`] when the lists differ in length.
    pub fn new(
        element_ids: Vec<String>,
        object_ids: Vec<Option<String>>,
    ) -> Result<Self, ThemeError> {
        let combined = build_all_combined_ids(&element_ids, &object_ids)?;
        Ok(Self {
            element_ids,
            object_ids,
            combined,
        })
    }

    /// A single element with no object id.
    #[must_use]
    pub fn element(element_id: &str) -> Self {
        Self {
            element_ids: vec![element_id.to_string()],
            object_ids: vec![None],
            combined: vec![element_id.to_string()],
        }
    }

    /// Combined ids, most specific first.
    #[must_use]
    pub fn combined(&self) -> &[String] {
        &self.combined
    }

    /// Element ids, outermost first.
    #[must_use]
    pub fn element_ids(&self) -> &[String] {
        &self.element_ids
    }

    /// Object ids, outermost first.
    #[must_use]
    pub fn object_ids(&self) -> &[Option<String>] {
        &self.object_ids
    }
}

/// Build every dot-joined id path through the hierarchy.
///
/// At each level the object id (when present) is preferred over the element
/// id, so the most specific combinations come first: element ids
/// `[window, text_box]` with object ids `[None, #help]` give
/// `window.#help` then `window.text_box`.
///
/// # Errors
///
/// [`ThemeError::IdHierarchyMismatch`] when the lists differ in length.
pub fn build_all_combined_ids(
    element_ids: &[String],
    object_ids: &[Option<String>],
) -> Result<Vec<String>, ThemeError> {
    if element_ids.len() != object_ids.len() {
        return Err(ThemeError::IdHierarchyMismatch {
            element_ids: element_ids.to_vec(),
            object_ids: object_ids.to_vec(),
        });
    }

    let mut paths: Vec<Vec<&str>> = vec![Vec::new()];
    for (element_id, object_id) in element_ids.iter().zip(object_ids) {
        let mut next = Vec::with_capacity(paths.len() * 2);
        for path in &paths {
            if let Some(object_id) = object_id {
                let mut with_object = path.clone();
                with_object.push(object_id.as_str());
                next.push(with_object);
            }
            let mut with_element = path.clone();
            with_element.push(element_id.as_str());
            next.push(with_element);
        }
        paths = next;
    }

    Ok(paths
        .into_iter()
        .filter(|path| !path.is_empty())
        .map(|path| path.join("."))
        .collect())
}

/// Font settings for an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontInfo {
    /// Family name, e.g. `fira_code`.
    pub name: String,
    /// Pixel size.
    pub size: u32,
    /// Bold by default.
    pub bold: bool,
    /// Italic by default.
    pub italic: bool,
    /// Font file for the regular face.
    pub regular_path: Option<PathBuf>,
    /// Font file for the bold face.
    pub bold_path: Option<PathBuf>,
    /// Font file for the italic face.
    pub italic_path: Option<PathBuf>,
    /// Font file for the bold italic face.
    pub bold_italic_path: Option<PathBuf>,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            name: "fira_code".to_string(),
            size: 14,
            bold: false,
            italic: false,
            regular_path: None,
            bold_path: None,
            italic_path: None,
            bold_italic_path: None,
        }
    }
}

const BASE_COLOURS: &[(&str, &str)] = &[
    ("normal_bg", "#25292e"),
    ("hovered_bg", "#35393e"),
    ("disabled_bg", "#25292e"),
    ("selected_bg", "#193754"),
    ("active_bg", "#193754"),
    ("dark_bg", "#15191e"),
    ("normal_text", "#c5cbd8"),
    ("hovered_text", "#FFFFFF"),
    ("selected_text", "#FFFFFF"),
    ("active_text", "#FFFFFF"),
    ("disabled_text", "#6d736f"),
    ("normal_border", "#DDDDDD"),
    ("hovered_border", "#EDEDED"),
    ("disabled_border", "#909090"),
    ("selected_border", "#294764"),
    ("active_border", "#294764"),
    ("link_text", "#c5cbFF"),
    ("link_hover", "#a5abDF"),
    ("link_selected", "#DFabDF"),
    ("text_shadow", "#777777"),
    ("filled_bar", "#f4251b"),
    ("unfilled_bar", "#CCCCCC"),
];

/// Colours, fonts and miscellaneous settings for UI elements.
#[derive(Debug, Clone)]
pub struct Theme {
    base_colours: BTreeMap<String, ColourOrGradient>,
    base_font: FontInfo,
    element_colours: HashMap<String, HashMap<String, ColourOrGradient>>,
    element_fonts: HashMap<String, FontInfo>,
    element_misc: HashMap<String, HashMap<String, String>>,
}

impl Default for Theme {
    fn default() -> Self {
        let base_colours = BASE_COLOURS
            .iter()
            .filter_map(|(id, hex)| {
                Colour::from_hex(hex).map(|colour| ((*id).to_string(), colour.into()))
            })
            .collect();
        Self {
            base_colours,
            base_font: FontInfo::default(),
            element_colours: HashMap::new(),
            element_fonts: HashMap::new(),
            element_misc: HashMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ThemeBlock {
    #[serde(default)]
    colours: HashMap<String, String>,
    #[serde(default)]
    font: Option<FontBlock>,
    #[serde(default)]
    misc: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FontBlock {
    name: String,
    size: NumberOrString,
    #[serde(default)]
    bold: Option<NumberOrString>,
    #[serde(default)]
    italic: Option<NumberOrString>,
    #[serde(default)]
    regular_path: Option<String>,
    #[serde(default)]
    bold_path: Option<String>,
    #[serde(default)]
    italic_path: Option<String>,
    #[serde(default)]
    bold_italic_path: Option<String>,
}

/// Theme files write numbers both bare and quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl Theme {
    /// Load a theme file on top of the built-in defaults. Relative font paths
    /// are resolved against the theme file's directory.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Io`] if the file cannot be read, [`ThemeError::Json`] if
    /// it is not a JSON object of theme blocks.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut theme = Self::default();
        theme.apply_json(&text, path.parent())?;
        Ok(theme)
    }

    /// Build a theme from JSON text on top of the built-in defaults.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Json`] if the text is not a JSON object of theme blocks.
    pub fn from_json_str(text: &str) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        theme.apply_json(text, None)?;
        Ok(theme)
    }

    fn apply_json(&mut self, text: &str, base_dir: Option<&Path>) -> Result<(), ThemeError> {
        let blocks: BTreeMap<String, ThemeBlock> = serde_json::from_str(text)?;
        for (element_id, block) in blocks {
            let colours = block
                .colours
                .iter()
                .map(|(colour_id, value)| {
                    (colour_id.clone(), load_colour(&element_id, colour_id, value))
                })
                .collect::<Vec<_>>();

            if element_id == "defaults" {
                self.base_colours.extend(colours);
                continue;
            }

            if !colours.is_empty() {
                self.element_colours
                    .entry(element_id.clone())
                    .or_default()
                    .extend(colours);
            }
            if let Some(font) = block.font {
                let info = font_info_from_block(&element_id, font, base_dir);
                let _ = self.element_fonts.insert(element_id.clone(), info);
            }
            if !block.misc.is_empty() {
                let misc = self.element_misc.entry(element_id).or_default();
                for (key, value) in block.misc {
                    let value = match value {
                        serde_json::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    let _ = misc.insert(key, value);
                }
            }
        }
        Ok(())
    }

    /// The font for an element: the first combined id with a font block,
    /// otherwise the base font.
    #[must_use]
    pub fn font_info(&self, ids: &ElementIds) -> &FontInfo {
        ids.combined()
            .iter()
            .find_map(|id| self.element_fonts.get(id))
            .unwrap_or(&self.base_font)
    }

    /// Every font block in the theme, base font first.
    pub fn font_infos(&self) -> impl Iterator<Item = &FontInfo> {
        std::iter::once(&self.base_font).chain(self.element_fonts.values())
    }

    /// A `misc` value for the first combined id that defines it.
    #[must_use]
    pub fn misc_value(&self, key: &str, ids: &ElementIds) -> Option<&str> {
        ids.combined()
            .iter()
            .find_map(|id| self.element_misc.get(id)?.get(key))
            .map(String::as_str)
    }

    fn element_colour(&self, element_id: &str, colour_id: &str) -> Option<&ColourOrGradient> {
        self.element_colours.get(element_id)?.get(colour_id)
    }

    /// Pick the base colour whose `_`-separated words share the most words
    /// with `colour_id`. Ties keep the alphabetically first id.
    fn best_lexical_match(&self, colour_id: &str) -> Option<&ColourOrGradient> {
        let wanted: Vec<&str> = colour_id.split('_').collect();
        let mut best: Option<(usize, &ColourOrGradient)> = None;
        for (key, colour) in &self.base_colours {
            let score = key.split('_').filter(|word| wanted.contains(word)).count();
            if score > best.map_or(0, |(best_score, _)| best_score) {
                best = Some((score, colour));
            }
        }
        best.map(|(_, colour)| colour)
    }
}

impl ColourResolver for Theme {
    fn colour_or_gradient(&self, colour_id: &str, ids: &ElementIds) -> ColourOrGradient {
        ids.combined()
            .iter()
            .find_map(|id| self.element_colour(id, colour_id))
            .or_else(|| {
                ids.object_ids()
                    .iter()
                    .flatten()
                    .find_map(|id| self.element_colour(id, colour_id))
            })
            .or_else(|| {
                ids.element_ids()
                    .iter()
                    .find_map(|id| self.element_colour(id, colour_id))
            })
            .or_else(|| self.base_colours.get(colour_id))
            .or_else(|| self.best_lexical_match(colour_id))
            .cloned()
            .unwrap_or(ColourOrGradient::Colour(Colour::BLACK))
    }
}

fn load_colour(element_id: &str, colour_id: &str, value: &str) -> ColourOrGradient {
    parse_colour_or_gradient(value).unwrap_or_else(|err| {
        warn(
            "theme",
            &format!("{err} for id '{colour_id}' in theme block '{element_id}'"),
        );
        ColourOrGradient::Colour(Colour::BLACK)
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn font_info_from_block(element_id: &str, block: FontBlock, base_dir: Option<&Path>) -> FontInfo {
    let default = FontInfo::default();
    let size = block.size.as_f64().map_or_else(
        || {
            warn(
                "theme",
                &format!("invalid font size in theme block '{element_id}'"),
            );
            default.size
        },
        |size| size.max(1.0) as u32,
    );
    let flag = |value: Option<NumberOrString>| {
        value
            .and_then(|v| v.as_f64())
            .is_some_and(|v| v != 0.0)
    };
    let resolve = |path: Option<String>| {
        path.map(|path| {
            let path = PathBuf::from(path);
            match base_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            }
        })
    };
    FontInfo {
        name: block.name,
        size,
        bold: flag(block.bold),
        italic: flag(block.italic),
        regular_path: resolve(block.regular_path),
        bold_path: resolve(block.bold_path),
        italic_path: resolve(block.italic_path),
        bold_italic_path: resolve(block.bold_italic_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ids(elements: &[&str], objects: &[Option<&str>]) -> ElementIds {
        ElementIds::new(
            elements.iter().map(ToString::to_string).collect(),
            objects.iter().map(|o| o.map(ToString::to_string)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn combined_ids_prefer_object_ids() {
        let ids = make_ids(&["window", "text_box"], &[None, Some("#help")]);
        assert_eq!(ids.combined(), ["window.#help", "window.text_box"]);

        let ids = make_ids(&["window", "text_box"], &[Some("#w"), Some("#t")]);
        assert_eq!(
            ids.combined(),
            ["#w.#t", "#w.text_box", "window.#t", "window.text_box"]
        );
    }

    #[test]
    fn combined_ids_length_mismatch_is_an_error() {
        let result = build_all_combined_ids(&["text_box".to_string()], &[]);
        assert!(matches!(
            result,
            Err(ThemeError::IdHierarchyMismatch { .. })
        ));
    }

    #[test]
    fn base_colours_and_font() {
        let theme = Theme::default();
        let ids = ElementIds::element("text_box");
        assert_eq!(theme.colour("normal_text", &ids), Colour::rgb(0xc5, 0xcb, 0xd8));
        assert_eq!(theme.colour("dark_bg", &ids), Colour::rgb(0x15, 0x19, 0x1e));
        assert_eq!(theme.font_info(&ids).name, "fira_code");
        assert_eq!(theme.font_info(&ids).size, 14);
    }

    #[test]
    fn lexical_fallback_then_black() {
        let theme = Theme::default();
        let ids = ElementIds::element("text_box");
        // "link" and "text" both appear in link_text, the best match.
        assert_eq!(theme.colour("link_text_special", &ids), Colour::rgb(0xc5, 0xcb, 0xff));
        assert_eq!(theme.colour("zzz", &ids), Colour::BLACK);
    }

    #[test]
    fn element_blocks_override_defaults() {
        let theme = Theme::from_json_str(
            r##"{
                "defaults": { "colours": { "normal_text": "#010203" } },
                "text_box": {
                    "colours": { "dark_bg": "#FF0000,#0000FF,90" },
                    "font": { "name": "noto", "size": "18", "bold": "1" },
                    "misc": { "line_spacing": "1.5", "text_horiz_alignment": "center" }
                },
                "#help": { "colours": { "normal_text": "#AABBCC" } }
            }"##,
        )
        .unwrap();

        let plain = ElementIds::element("text_box");
        assert_eq!(theme.colour("normal_text", &plain), Colour::rgb(1, 2, 3));
        assert!(matches!(
            theme.colour_or_gradient("dark_bg", &plain),
            ColourOrGradient::Gradient(_)
        ));
        let font = theme.font_info(&plain);
        assert_eq!((font.name.as_str(), font.size, font.bold), ("noto", 18, true));
        assert_eq!(theme.misc_value("line_spacing", &plain), Some("1.5"));

        let help = make_ids(&["text_box"], &[Some("#help")]);
        assert_eq!(theme.colour("normal_text", &help), Colour::rgb(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn invalid_theme_colour_is_black() {
        let theme =
            Theme::from_json_str(r##"{ "text_box": { "colours": { "normal_text": "#QQ" } } }"##)
                .unwrap();
        let ids = ElementIds::element("text_box");
        assert_eq!(theme.colour("normal_text", &ids), Colour::BLACK);
    }

    #[test]
    fn bad_json_and_missing_file_are_errors() {
        assert!(matches!(Theme::from_json_str("[1, 2]"), Err(ThemeError::Json(_))));
        assert!(matches!(
            Theme::load("/definitely/not/a/theme.json"),
            Err(ThemeError::Io { .. })
        ));
    }
}
