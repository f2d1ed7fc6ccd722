//! Markup to primitive queue.
//!
//! Walks the tokenizer's event stream once. Opening tags push a style delta
//! keyed by the tag name, closing tags pop back to it, and character data
//! becomes text runs in the style current at that point. Problems in the
//! markup are reported as [`ParseIssue`]s and never stop the parse.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use image::RgbaImage;
use quill_markup::{ParseError, Token, tokenize};
use thiserror::Error;

use crate::colour::{Colour, ColourOrGradient, parse_colour_or_gradient};
use crate::font::{FontHandle, FontKey, FontResolver};
use crate::layout::{BlockContent, FloatSide, Primitive, PrimitiveKind, TextRun};
use crate::style::{
    DefaultStyle, FontSizeError, StyleAttribute, StyleDelta, StyleStack, StyleValue,
    html_font_size,
};
use crate::theme::{ColourResolver, ElementIds};

/// Images available to `<img src>`, by name.
pub type ImageStore = HashMap<String, Rc<RgbaImage>>;

/// A recoverable problem found while parsing markup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseIssue {
    /// A tag the parser does not know. It still nests, but changes nothing.
    #[error("Unsupported HTML Tag <{0}>. Check documentation for full range of supported tags.")]
    UnsupportedTag(String),
    /// A colour attribute that is neither hex, a colour name, a gradient
    /// nor a theme colour id. Black is used instead.
    #[error("Invalid colour '{value}' in '{attribute}' attribute, using black")]
    InvalidColour {
        /// Attribute name.
        attribute: String,
        /// Attribute value.
        value: String,
    },
    /// A `<font size>` outside the size table. The size is left unchanged.
    #[error("Invalid font size: {0}")]
    InvalidFontSize(FontSizeError),
    /// A numeric attribute that did not parse.
    #[error("Invalid value '{value}' for '{attribute}' on <{tag}>")]
    InvalidAttribute {
        /// Tag name.
        tag: String,
        /// Attribute name.
        attribute: String,
        /// Attribute value.
        value: String,
    },
    /// An `<img src>` missing from the image store. A placeholder is drawn.
    #[error("Image '{0}' not found, drawing a placeholder")]
    MissingImage(String),
    /// A problem reported by the tokenizer.
    #[error("Markup error '{}' at byte {}", .0.message, .0.position)]
    Tokenizer(ParseError),
}

/// What a parse produced.
#[derive(Debug, Default)]
pub struct ParseOutput {
    /// Primitives in markup order, ready for layout.
    pub queue: VecDeque<Primitive>,
    /// Everything that was wrong with the markup.
    pub issues: Vec<ParseIssue>,
}

/// Tags that never have content or an end tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Turns markup into a queue of layout primitives.
pub struct MarkupParser<'a> {
    colours: &'a dyn ColourResolver,
    fonts: &'a dyn FontResolver,
    ids: &'a ElementIds,
    images: Option<&'a ImageStore>,
    default_style: DefaultStyle,
    style: StyleStack,
    element_stack: Vec<String>,
    pending_text: String,
    output: ParseOutput,
}

impl<'a> MarkupParser<'a> {
    /// A parser resolving colours and fonts through the given collaborators
    /// for the element at `ids`, starting from `default_style`.
    #[must_use]
    pub fn new(
        colours: &'a dyn ColourResolver,
        fonts: &'a dyn FontResolver,
        ids: &'a ElementIds,
        default_style: DefaultStyle,
    ) -> Self {
        let style = StyleStack::new(default_style.to_style_state());
        Self {
            colours,
            fonts,
            ids,
            images: None,
            default_style,
            style,
            element_stack: Vec::new(),
            pending_text: String::new(),
            output: ParseOutput::default(),
        }
    }

    /// Resolve `<img src>` against `images`.
    #[must_use]
    pub fn with_images(mut self, images: &'a ImageStore) -> Self {
        self.images = Some(images);
        self
    }

    /// Parse `markup` to a primitive queue.
    #[must_use]
    pub fn parse(mut self, markup: &str) -> ParseOutput {
        let (tokens, errors) = tokenize(markup);
        for error in errors {
            self.issue(ParseIssue::Tokenizer(error));
        }

        for token in tokens {
            match token {
                Token::Character { data: '\n' } => {
                    self.flush_text();
                    self.push_line_break();
                }
                Token::Character { data: '\r' } | Token::Comment { .. } => {}
                Token::Character { data } => self.pending_text.push(data),
                Token::StartTag {
                    name,
                    self_closing,
                    attributes,
                } => {
                    self.flush_text();
                    let attributes: HashMap<String, String> = attributes
                        .into_iter()
                        .map(|attribute| (attribute.name, attribute.value))
                        .collect();
                    self.handle_start_tag(&name, self_closing, &attributes);
                }
                Token::EndTag { name } => {
                    self.flush_text();
                    self.handle_end_tag(&name);
                }
                Token::EndOfFile => self.flush_text(),
            }
        }
        self.flush_text();
        self.output
    }

    fn handle_start_tag(
        &mut self,
        element: &str,
        self_closing: bool,
        attributes: &HashMap<String, String>,
    ) {
        let mut delta = StyleDelta::new();
        match element {
            "b" | "strong" => delta.push((StyleAttribute::Bold, StyleValue::Flag(true))),
            "i" | "em" | "var" => delta.push((StyleAttribute::Italic, StyleValue::Flag(true))),
            "u" => delta.push((StyleAttribute::Underline, StyleValue::Flag(true))),
            "a" => {
                delta.push((StyleAttribute::Link, StyleValue::Flag(true)));
                if let Some(href) = attributes.get("href") {
                    delta.push((StyleAttribute::LinkHref, StyleValue::Text(href.clone())));
                }
                let link_colour = self.colours.colour_or_gradient("link_text", self.ids);
                delta.push((StyleAttribute::FontColour, StyleValue::Colour(link_colour)));
            }
            "font" => self.font_delta(attributes, &mut delta),
            "body" => {
                if let Some(value) = attributes.get("bgcolor") {
                    let colour = if value.is_empty() {
                        Colour::TRANSPARENT.into()
                    } else {
                        self.resolve_colour("bgcolor", value)
                    };
                    delta.push((StyleAttribute::BgColour, StyleValue::Colour(colour)));
                }
            }
            "p" => {}
            "br" => self.push_line_break(),
            "hr" => self.push_rule(),
            "img" => self.push_image(attributes),
            _ => self.issue(ParseIssue::UnsupportedTag(element.to_string())),
        }

        if self_closing || VOID_TAGS.contains(&element) {
            return;
        }
        self.element_stack.push(element.to_string());
        self.style.push(element, delta);
    }

    fn handle_end_tag(&mut self, element: &str) {
        let Some(position) = self.element_stack.iter().rposition(|open| open == element) else {
            return;
        };
        let _ = self.style.pop(element);
        self.element_stack.truncate(position);
        if element == "p" {
            self.push_line_break();
        }
    }

    fn font_delta(&mut self, attributes: &HashMap<String, String>, delta: &mut StyleDelta) {
        if let Some(face) = attributes.get("face") {
            let name = if face.is_empty() {
                self.default_style.font_name.clone()
            } else {
                face.clone()
            };
            delta.push((StyleAttribute::FontName, StyleValue::Text(name)));
        }
        if let Some(size) = attributes.get("size") {
            if size.is_empty() {
                delta.push((
                    StyleAttribute::FontSize,
                    StyleValue::Size(self.default_style.font_size),
                ));
            } else {
                match html_font_size(size) {
                    Ok(pixels) => delta.push((StyleAttribute::FontSize, StyleValue::Size(pixels))),
                    Err(error) => self.issue(ParseIssue::InvalidFontSize(error)),
                }
            }
        }
        if let Some(colour) = attributes.get("color") {
            let colour = self.resolve_colour("color", colour);
            delta.push((StyleAttribute::FontColour, StyleValue::Colour(colour)));
        }
    }

    /// Gradients, then hex (`#` prefixed), then colour names, then theme
    /// colour ids.
    fn resolve_colour(&mut self, attribute: &str, value: &str) -> ColourOrGradient {
        let value = value.trim();
        let parsed = if value.contains(',') {
            parse_colour_or_gradient(value).ok()
        } else if value.starts_with('#') {
            Colour::from_hex(value).map(ColourOrGradient::from)
        } else if let Some(named) = Colour::from_named(value) {
            Some(named.into())
        } else {
            Some(self.colours.colour_or_gradient(value, self.ids))
        };
        parsed.unwrap_or_else(|| {
            self.issue(ParseIssue::InvalidColour {
                attribute: attribute.to_string(),
                value: value.to_string(),
            });
            Colour::BLACK.into()
        })
    }

    fn current_font(&self) -> (FontKey, FontHandle) {
        let style = self.style.current();
        let key = FontKey::new(
            style.font_name(),
            style.font_size(),
            style.bold(),
            style.italic(),
        );
        let font = self.fonts.find_font(&key);
        (key, font)
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        let (font_key, font) = self.current_font();
        let style = self.style.current();
        let run = TextRun {
            text,
            font,
            font_key,
            colour: style.font_colour(),
            bg_colour: style.bg_colour(),
            underline: style.underline(),
            link_href: style.link_href().map(str::to_string),
        };
        self.output.queue.push_back(Primitive::text(run));
    }

    fn push_line_break(&mut self) {
        let (_, font) = self.current_font();
        self.output
            .queue
            .push_back(Primitive::line_break(font.line_height()));
    }

    fn push_rule(&mut self) {
        let (_, font) = self.current_font();
        let colour = self.style.current().font_colour().base_colour();
        let rule = PrimitiveKind::Span {
            content: BlockContent::Rule(colour),
        };
        // Spans are stretched to the container width during layout.
        self.output
            .queue
            .push_back(Primitive::block(rule, 0.0, font.line_height()));
    }

    #[allow(clippy::cast_precision_loss)]
    fn push_image(&mut self, attributes: &HashMap<String, String>) {
        let src = attributes.get("src").map_or("", String::as_str);
        let image = self.images.and_then(|images| images.get(src)).cloned();
        let (natural_width, natural_height) = image.as_ref().map_or_else(
            || {
                let (_, font) = self.current_font();
                (font.line_height(), font.line_height())
            },
            |image| (image.width() as f32, image.height() as f32),
        );
        let width = self.dimension_attribute(attributes, "width", natural_width);
        let height = self.dimension_attribute(attributes, "height", natural_height);

        let content = if let Some(image) = image {
            BlockContent::Image(image)
        } else {
            if !src.is_empty() {
                self.issue(ParseIssue::MissingImage(src.to_string()));
            }
            BlockContent::Fill(self.colours.colour_or_gradient("normal_bg", self.ids))
        };

        let side = match attributes.get("align").map(String::as_str) {
            Some("left") => Some(FloatSide::Left),
            Some("right") => Some(FloatSide::Right),
            _ => None,
        };
        let kind = match side {
            Some(side) => PrimitiveKind::Float { side, content },
            None => PrimitiveKind::Inline { content },
        };
        self.output
            .queue
            .push_back(Primitive::block(kind, width, height));
    }

    fn dimension_attribute(
        &mut self,
        attributes: &HashMap<String, String>,
        name: &str,
        default: f32,
    ) -> f32 {
        let Some(value) = attributes.get(name) else {
            return default;
        };
        match value.trim().parse::<f32>() {
            Ok(parsed) if parsed >= 0.0 => parsed,
            _ => {
                self.issue(ParseIssue::InvalidAttribute {
                    tag: "img".to_string(),
                    attribute: name.to_string(),
                    value: value.clone(),
                });
                default
            }
        }
    }

    fn issue(&mut self, issue: ParseIssue) {
        quill_common::warning::warn("markup", &issue.to_string());
        self.output.issues.push(issue);
    }
}
