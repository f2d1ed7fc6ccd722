//! Caching font lookup: theme font files, then system fonts, then
//! approximate metrics.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fontdue::{Font, FontSettings};
use quill_common::warning::warn_once;
use quill_text::{ApproximateFontMetrics, FontHandle, FontInfo, FontKey, FontResolver, Theme};

use crate::font_metrics::FontdueFontMetrics;

/// Common system font paths to search for a regular face.
const FONT_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNS.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// System font paths for bold faces.
const FONT_BOLD_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// System font paths for italic faces.
const FONT_ITALIC_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "/Library/Fonts/Arial Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
    "C:\\Windows\\Fonts\\ariali.ttf",
];

/// System font paths for bold italic faces.
const FONT_BOLD_ITALIC_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "/Library/Fonts/Arial Bold Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

fn system_search_paths(bold: bool, italic: bool) -> &'static [&'static str] {
    match (bold, italic) {
        (false, false) => FONT_SEARCH_PATHS,
        (true, false) => FONT_BOLD_SEARCH_PATHS,
        (false, true) => FONT_ITALIC_SEARCH_PATHS,
        (true, true) => FONT_BOLD_ITALIC_SEARCH_PATHS,
    }
}

/// Font files for the four faces of a family. Any may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacePaths {
    /// Regular face.
    pub regular: Option<PathBuf>,
    /// Bold face.
    pub bold: Option<PathBuf>,
    /// Italic face.
    pub italic: Option<PathBuf>,
    /// Bold italic face.
    pub bold_italic: Option<PathBuf>,
}

impl FacePaths {
    /// Paths from a theme font block.
    #[must_use]
    pub fn from_font_info(info: &FontInfo) -> Self {
        Self {
            regular: info.regular_path.clone(),
            bold: info.bold_path.clone(),
            italic: info.italic_path.clone(),
            bold_italic: info.bold_italic_path.clone(),
        }
    }

    /// Candidate files for a style, best match first: the exact face, then
    /// the nearer partial match, then regular.
    fn candidates(&self, bold: bool, italic: bool) -> Vec<&Path> {
        let order = match (bold, italic) {
            (true, true) => vec![&self.bold_italic, &self.bold, &self.italic, &self.regular],
            (true, false) => vec![&self.bold, &self.regular],
            (false, true) => vec![&self.italic, &self.regular],
            (false, false) => vec![&self.regular],
        };
        order.into_iter().filter_map(Option::as_deref).collect()
    }

    fn is_empty(&self) -> bool {
        self.candidates(true, true).is_empty()
    }
}

/// Resolves [`FontKey`]s to fontdue faces, caching both parsed font files
/// and sized handles.
///
/// Lookup order for a key:
///
/// 1. files registered for the family (from theme font blocks)
/// 2. system font search paths for the requested style
/// 3. [`ApproximateFontMetrics`], with a one-time warning
#[derive(Default)]
pub struct FontDictionary {
    families: HashMap<String, FacePaths>,
    skip_system_fonts: bool,
    files: RefCell<HashMap<PathBuf, Option<Rc<Font>>>>,
    system_faces: RefCell<HashMap<(bool, bool), Option<Rc<Font>>>>,
    handles: RefCell<HashMap<FontKey, FontHandle>>,
}

impl FontDictionary {
    /// A dictionary with no registered families.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dictionary with every font block in `theme` registered.
    #[must_use]
    pub fn from_theme(theme: &Theme) -> Self {
        let mut dictionary = Self::new();
        for info in theme.font_infos() {
            dictionary.register_family(&info.name, FacePaths::from_font_info(info));
        }
        dictionary
    }

    /// Never search the system font directories.
    #[must_use]
    pub const fn without_system_fonts(mut self) -> Self {
        self.skip_system_fonts = true;
        self
    }

    /// Register the files for `family`. Paths are merged with any already
    /// registered; empty path sets are ignored.
    pub fn register_family(&mut self, family: &str, paths: FacePaths) {
        if paths.is_empty() {
            return;
        }
        let entry = self.families.entry(family.to_string()).or_default();
        for (slot, path) in [
            (&mut entry.regular, paths.regular),
            (&mut entry.bold, paths.bold),
            (&mut entry.italic, paths.italic),
            (&mut entry.bold_italic, paths.bold_italic),
        ] {
            if path.is_some() {
                *slot = path;
            }
        }
        self.handles.get_mut().retain(|key, _| key.family != family);
    }

    /// Number of distinct sized handles handed out so far.
    #[must_use]
    pub fn cached_handles(&self) -> usize {
        self.handles.borrow().len()
    }

    fn load_face(&self, key: &FontKey) -> Option<Rc<Font>> {
        if let Some(paths) = self.families.get(&key.family) {
            for path in paths.candidates(key.bold, key.italic) {
                if let Some(font) = self.load_file(path) {
                    return Some(font);
                }
            }
        }
        if self.skip_system_fonts {
            return None;
        }
        self.system_faces
            .borrow_mut()
            .entry((key.bold, key.italic))
            .or_insert_with(|| {
                load_first_system_face(key.bold, key.italic)
                    .or_else(|| load_first_system_face(false, false))
            })
            .clone()
    }

    fn load_file(&self, path: &Path) -> Option<Rc<Font>> {
        self.files
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_insert_with(|| match read_font(path) {
                Ok(font) => {
                    tracing::debug!(path = %path.display(), "Loaded font file");
                    Some(Rc::new(font))
                }
                Err(reason) => {
                    let _ = warn_once(
                        "font",
                        &format!("Could not load font '{}': {reason}", path.display()),
                    );
                    None
                }
            })
            .clone()
    }
}

impl fmt::Debug for FontDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontDictionary")
            .field("families", &self.families)
            .field("skip_system_fonts", &self.skip_system_fonts)
            .field("cached_handles", &self.cached_handles())
            .finish_non_exhaustive()
    }
}

impl FontResolver for FontDictionary {
    #[allow(clippy::cast_precision_loss)]
    fn find_font(&self, key: &FontKey) -> FontHandle {
        if let Some(handle) = self.handles.borrow().get(key) {
            return Rc::clone(handle);
        }

        let handle: FontHandle = match self.load_face(key) {
            Some(font) => Rc::new(FontdueFontMetrics::new(font, key.size as f32)),
            None => {
                let _ = warn_once(
                    "font",
                    &format!("No font file found for {key}, using approximate metrics"),
                );
                Rc::new(ApproximateFontMetrics::new(key.size))
            }
        };
        let _ = self
            .handles
            .borrow_mut()
            .insert(key.clone(), Rc::clone(&handle));
        handle
    }
}

fn read_font(path: &Path) -> Result<Font, String> {
    let data = fs::read(path).map_err(|e| e.to_string())?;
    Font::from_bytes(data, FontSettings::default()).map_err(str::to_string)
}

/// Load the first readable system face for a style.
pub(crate) fn load_first_system_face(bold: bool, italic: bool) -> Option<Rc<Font>> {
    system_search_paths(bold, italic).iter().find_map(|path| {
        let font = read_font(Path::new(path)).ok()?;
        tracing::debug!(path, "Loaded system font");
        Some(Rc::new(font))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn missing_fonts_fall_back_to_approximate_metrics() {
        let dictionary = FontDictionary::new().without_system_fonts();
        let handle = dictionary.find_font(&FontKey::new("nowhere_sans", 10, false, false));
        assert!((handle.advance('x') - 6.0).abs() < f32::EPSILON);
        assert!((handle.line_height() - 12.0).abs() < f32::EPSILON);
        assert!(logs_contain("No font file found for nowhere_sans 10px"));
    }

    #[test]
    fn handles_are_cached_per_key() {
        let dictionary = FontDictionary::new().without_system_fonts();
        let key = FontKey::new("cached_sans", 12, true, false);
        let first = dictionary.find_font(&key);
        let second = dictionary.find_font(&key);
        assert!(Rc::ptr_eq(&first, &second));

        let _ = dictionary.find_font(&FontKey::new("cached_sans", 13, true, false));
        assert_eq!(dictionary.cached_handles(), 2);
    }

    #[test]
    #[traced_test]
    fn unreadable_theme_font_is_reported() {
        let mut dictionary = FontDictionary::new().without_system_fonts();
        dictionary.register_family(
            "broken_sans",
            FacePaths {
                regular: Some(PathBuf::from("/definitely/not/here/broken.ttf")),
                ..FacePaths::default()
            },
        );
        let handle = dictionary.find_font(&FontKey::new("broken_sans", 20, false, false));
        assert!((handle.advance('x') - 12.0).abs() < f32::EPSILON);
        assert!(logs_contain("Could not load font '/definitely/not/here/broken.ttf'"));
    }

    #[test]
    fn face_candidates_fall_back_towards_regular() {
        let paths = FacePaths {
            regular: Some(PathBuf::from("r.ttf")),
            bold: Some(PathBuf::from("b.ttf")),
            italic: None,
            bold_italic: None,
        };
        assert_eq!(
            paths.candidates(true, true),
            [Path::new("b.ttf"), Path::new("r.ttf")]
        );
        assert_eq!(paths.candidates(false, true), [Path::new("r.ttf")]);
    }

    #[test]
    fn registering_merges_paths() {
        let mut dictionary = FontDictionary::new();
        dictionary.register_family(
            "merged",
            FacePaths {
                regular: Some(PathBuf::from("r.ttf")),
                ..FacePaths::default()
            },
        );
        dictionary.register_family(
            "merged",
            FacePaths {
                bold: Some(PathBuf::from("b.ttf")),
                ..FacePaths::default()
            },
        );
        dictionary.register_family("merged", FacePaths::default());
        let paths = &dictionary.families["merged"];
        assert_eq!(paths.regular.as_deref(), Some(Path::new("r.ttf")));
        assert_eq!(paths.bold.as_deref(), Some(Path::new("b.ttf")));
    }
}
