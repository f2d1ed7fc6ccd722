//! Character reference resolution.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Only the handful of named references that show up in text box copy are
//! recognised. Numeric references are fully supported.

use super::machine::{MarkupTokenizer, TokenizerState};

/// Named references understood by the tokenizer, without the leading `&`.
const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp;", '&'),
    ("lt;", '<'),
    ("gt;", '>'),
    ("quot;", '"'),
    ("apos;", '\''),
    ("nbsp;", '\u{00A0}'),
];

impl MarkupTokenizer {
    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    ///
    /// Entered by reconsuming the `&`. The reference is resolved by lookahead
    /// and the result is "flushed" to the return state: appended to the
    /// attribute value being built, or emitted as a character token.
    pub(super) fn handle_character_reference_state(&mut self) {
        let return_state = self.return_state.take().unwrap_or(TokenizerState::Data);

        let resolved = if self.next_few_characters_are("#") {
            self.consume_numeric_reference()
        } else {
            self.consume_named_reference()
        };

        self.flush_code_point(resolved.unwrap_or('&'), return_state);
        self.switch_to(return_state);
    }

    /// "Flush code points consumed as a character reference"
    fn flush_code_point(&mut self, c: char, return_state: TokenizerState) {
        if return_state.is_attribute_value() {
            if let Some(token) = self.current_token.as_mut() {
                token.append_to_attribute_value(c);
            }
        } else {
            self.emit_character_token(c);
        }
    }

    fn consume_named_reference(&mut self) -> Option<char> {
        let (name, c) = NAMED_REFERENCES
            .iter()
            .find(|(name, _)| self.next_few_characters_are(name))?;
        self.skip_characters(name.len());
        Some(*c)
    }

    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    ///
    /// Handles `&#NN;` and `&#xHH;`. The terminating semicolon is optional, as
    /// in browsers. Zero, surrogates and values above U+10FFFF become
    /// U+FFFD REPLACEMENT CHARACTER.
    fn consume_numeric_reference(&mut self) -> Option<char> {
        let rest = &self.input[self.current_pos + 1..];
        let (radix, digits_start) = match rest.chars().next() {
            Some('x' | 'X') => (16, 2),
            _ => (10, 1),
        };
        let digits: String = self.input[self.current_pos + digits_start..]
            .chars()
            .take_while(|c| c.is_digit(radix))
            .collect();
        if digits.is_empty() {
            self.log_parse_error("absence-of-digits-in-numeric-character-reference");
            return None;
        }

        let mut consumed = digits_start + digits.len();
        if self.input[self.current_pos + consumed..].starts_with(';') {
            consumed += 1;
        } else {
            self.log_parse_error("missing-semicolon-after-character-reference");
        }
        self.skip_characters(consumed);

        let resolved = u32::from_str_radix(&digits, radix)
            .ok()
            .filter(|&value| value != 0)
            .and_then(char::from_u32);
        if resolved.is_none() {
            self.log_parse_error("character-reference-outside-unicode-range");
        }
        Some(resolved.unwrap_or('\u{FFFD}'))
    }
}
