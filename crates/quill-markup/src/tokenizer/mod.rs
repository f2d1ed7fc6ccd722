//! Markup tokenizer module.
//!
//! A reduced version of the
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! state machine, sized for text box markup.

/// Character reference resolution.
pub mod character_reference;
/// Helper methods for tokenizer state transitions.
pub mod helpers;
/// Tokenizer state machine implementation.
pub mod machine;
/// Token types produced by the tokenizer.
pub mod token;

pub use machine::{MarkupTokenizer, ParseError, TokenizerState, tokenize};
pub use token::{Attribute, Token};
