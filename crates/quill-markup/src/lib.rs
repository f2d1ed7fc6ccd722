//! Markup tokenizer for Quill text boxes.
//!
//! # Scope
//!
//! This crate implements a forgiving subset of the
//! [WHATWG tokenizer](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
//! - Data, tag open, end tag open and tag name states
//! - Attribute parsing (quoted, single-quoted and unquoted values)
//! - Comments and bogus comments
//! - A small set of named and all numeric character references
//!
//! The output is a flat event stream. There is no tree construction: the
//! text layout parser in `quill-text` consumes the events directly and keeps
//! its own stack of open tags.
//!
//! # Not Implemented
//!
//! - DOCTYPE, CDATA, RCDATA, RAWTEXT and script data states
//! - The full named character reference table

/// Markup tokenizer for converting input into tokens.
pub mod tokenizer;

pub use tokenizer::{Attribute, MarkupTokenizer, ParseError, Token, TokenizerState, tokenize};
