//! Content signatures of text-show operands.
//!
//! Each validator looks at the operand text of a single text-show operator
//! (`(12)`, `[(12)]`, `[<0015002D>]`, ...) and answers one narrow question.
//! They accept only operands whose *every* character belongs to the
//! signature, so numbered body text such as `(Article 12)` never matches.

use regex::bytes::Regex;

use crate::options::SignatureLimits;

/// Compiled content signatures.
pub struct TextSignatures {
    limits: SignatureLimits,
    page_number: Regex,
    decorative_line: Regex,
    encoded_footer: Regex,
}

impl TextSignatures {
    pub fn new(limits: SignatureLimits) -> Self {
        Self {
            limits,
            page_number: Regex::new(r"^(?:\[[()0-9: \t\r\n]*\]|[()0-9: \t\r\n]*)$").unwrap(),
            decorative_line: Regex::new(r"^(?:\[[()_ \t\r\n-]*\]|[()_ \t\r\n-]*)$").unwrap(),
            encoded_footer: Regex::new(r"^\[<[0-9A-Fa-f<> \t\r\n-]*>\]$").unwrap(),
        }
    }

    /// A bare page number such as `(12)`, `[( 7 )]` or `[(3: )]`.
    pub fn is_page_number(&self, operand: &[u8]) -> bool {
        operand.len() < self.limits.page_number_max_len
            && has_parens(operand)
            && operand.iter().any(u8::is_ascii_digit)
            && self.page_number.is_match(operand)
    }

    /// A ruled line drawn with text, such as `(______)` or `[(- - -)]`.
    pub fn is_decorative_line(&self, operand: &[u8]) -> bool {
        operand.len() < self.limits.decorative_line_max_len
            && has_parens(operand)
            && operand.iter().any(|b| matches!(b, b'-' | b'_'))
            && self.decorative_line.is_match(operand)
    }

    /// A short hex-encoded glyph run such as `[<0015002D002B0034>]`.
    pub fn is_encoded_footer(&self, operand: &[u8]) -> bool {
        operand.len() < self.limits.encoded_footer_max_len && self.encoded_footer.is_match(operand)
    }
}

impl Default for TextSignatures {
    fn default() -> Self {
        Self::new(SignatureLimits::default())
    }
}

fn has_parens(operand: &[u8]) -> bool {
    operand.contains(&b'(') && operand.contains(&b')')
}
