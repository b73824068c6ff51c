//! Content stream tokenizer.
//!
//! Splits a decoded content stream into operator-terminated [`Token`]s. Every
//! token keeps the exact source bytes it was lexed from, leading whitespace
//! and comments included, so joining the raw slices of all tokens gives back
//! the input byte for byte. Bytes after the last operator (trailing operands,
//! whitespace, an unterminated string) become one final token without an
//! operator.
//!
//! The lexer never fails. Unterminated strings, arrays and dictionaries run to
//! the end of input and set [`Lexer::truncated`].

/// Operators that draw text.
pub const TEXT_SHOW_OPERATORS: [&[u8]; 4] = [b"Tj", b"TJ", b"'", b"\""];

/// A single operand preceding an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'a> {
    Number(f64),
    Name(&'a [u8]),
    /// `( ... )` string, delimiters included
    Literal(&'a [u8]),
    /// `< ... >` string, delimiters included
    Hex(&'a [u8]),
    /// `[ ... ]`, delimiters included
    Array(&'a [u8]),
    /// `<< ... >>`, delimiters included
    Dict(&'a [u8]),
    /// `true`, `false`, `null`, malformed numbers and stray delimiters
    Other(&'a [u8]),
}

/// An operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    raw: &'a [u8],
    operands: Vec<Operand<'a>>,
    operand_text: &'a [u8],
    operator: Option<&'a [u8]>,
}

impl<'a> Token<'a> {
    /// Source bytes of the token, leading trivia included.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Operator mnemonic, `None` for the trailing remainder of a stream.
    pub fn operator(&self) -> Option<&'a [u8]> {
        self.operator
    }

    pub fn operands(&self) -> &[Operand<'a>] {
        &self.operands
    }

    /// Source text spanning the first to the last operand.
    pub fn operand_text(&self) -> &'a [u8] {
        self.operand_text
    }

    pub fn is_operator(&self, op: &[u8]) -> bool {
        self.operator == Some(op)
    }

    pub fn is_text_show(&self) -> bool {
        self.operator
            .map_or(false, |op| TEXT_SHOW_OPERATORS.contains(&op))
    }

    /// The last `N` operands as numbers, if they all are numbers.
    pub fn trailing_numbers<const N: usize>(&self) -> Option<[f64; N]> {
        if self.operands.len() < N {
            return None;
        }
        let mut out = [0.0; N];
        for (slot, operand) in out
            .iter_mut()
            .zip(&self.operands[self.operands.len() - N..])
        {
            match operand {
                Operand::Number(n) => *slot = *n,
                _ => return None,
            }
        }
        Some(out)
    }

    /// Raw text for log output.
    pub fn display_text(&self) -> String {
        String::from_utf8_lossy(self.raw).trim().to_string()
    }
}

/// Iterator over the tokens of a content stream.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    truncated: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            truncated: false,
        }
    }

    /// Whether an unterminated construct ran into the end of input so far.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn skip_trivia(&mut self) {
        while let Some(&b) = self.src.get(self.pos) {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                self.pos = self.skip_comment(self.pos);
            } else {
                break;
            }
        }
    }

    fn skip_comment(&self, from: usize) -> usize {
        self.src[from..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map_or(self.src.len(), |p| from + p)
    }

    fn scan_literal(&mut self, from: usize) -> usize {
        let mut depth = 0usize;
        let mut i = from;
        while i < self.src.len() {
            match self.src[i] {
                b'\\' => i += 1,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        self.truncated = true;
        self.src.len()
    }

    fn scan_hex(&mut self, from: usize) -> usize {
        match self.src[from + 1..].iter().position(|&b| b == b'>') {
            Some(p) => from + 1 + p + 1,
            None => {
                self.truncated = true;
                self.src.len()
            }
        }
    }

    /// Scan an array or dictionary, including any nested ones.
    fn scan_nested(&mut self, from: usize) -> usize {
        let mut depth = 0usize;
        let mut i = from;
        while i < self.src.len() {
            let next = self.src.get(i + 1).copied();
            match self.src[i] {
                b'[' => {
                    depth += 1;
                    i += 1;
                }
                b'<' if next == Some(b'<') => {
                    depth += 1;
                    i += 2;
                }
                b']' | b'>' => {
                    i += if self.src[i] == b'>' && next == Some(b'>') { 2 } else { 1 };
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i;
                    }
                }
                b'<' => i = self.scan_hex(i),
                b'(' => i = self.scan_literal(i),
                b'%' => i = self.skip_comment(i),
                _ => i += 1,
            }
        }
        self.truncated = true;
        self.src.len()
    }

    fn scan_regular(&self, from: usize) -> usize {
        self.src[from..]
            .iter()
            .position(|&b| is_whitespace(b) || is_delimiter(b))
            .map_or(self.src.len(), |p| from + p)
    }

    /// End of inline image data started by `ID`: just past the closing `EI`.
    fn scan_inline_image(&mut self, from: usize) -> usize {
        // one whitespace byte separates ID from the data
        let data_start = (from + 1).min(self.src.len());
        let mut i = data_start;
        while i + 1 < self.src.len() {
            if &self.src[i..i + 2] == b"EI"
                && i > 0
                && is_whitespace(self.src[i - 1])
                && self.src.get(i + 2).map_or(true, |&b| is_whitespace(b) || is_delimiter(b))
            {
                return i + 2;
            }
            i += 1;
        }
        self.truncated = true;
        self.src.len()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.src.len() {
            return None;
        }

        let start = self.pos;
        let mut operands = Vec::new();
        let mut operand_span: Option<(usize, usize)> = None;

        loop {
            self.skip_trivia();
            let item_start = self.pos;
            let Some(&b) = self.src.get(item_start) else {
                self.pos = self.src.len();
                return Some(Token {
                    raw: &self.src[start..],
                    operands,
                    operand_text: span_text(self.src, operand_span),
                    operator: None,
                });
            };

            let operand = match b {
                b'(' => {
                    self.pos = self.scan_literal(item_start);
                    Operand::Literal(&self.src[item_start..self.pos])
                }
                b'<' if self.src.get(item_start + 1) == Some(&b'<') => {
                    self.pos = self.scan_nested(item_start);
                    Operand::Dict(&self.src[item_start..self.pos])
                }
                b'<' => {
                    self.pos = self.scan_hex(item_start);
                    Operand::Hex(&self.src[item_start..self.pos])
                }
                b'[' => {
                    self.pos = self.scan_nested(item_start);
                    Operand::Array(&self.src[item_start..self.pos])
                }
                b'/' => {
                    self.pos = self.scan_regular(item_start + 1);
                    Operand::Name(&self.src[item_start..self.pos])
                }
                b')' | b'>' | b']' | b'{' | b'}' => {
                    self.pos = item_start + 1;
                    Operand::Other(&self.src[item_start..self.pos])
                }
                _ => {
                    self.pos = self.scan_regular(item_start);
                    let word = &self.src[item_start..self.pos];
                    match classify_word(word) {
                        Some(operand) => operand,
                        None => {
                            if word == b"ID" {
                                self.pos = self.scan_inline_image(self.pos);
                            }
                            return Some(Token {
                                raw: &self.src[start..self.pos],
                                operands,
                                operand_text: span_text(self.src, operand_span),
                                operator: Some(word),
                            });
                        }
                    }
                }
            };

            operands.push(operand);
            operand_span = Some((operand_span.map_or(item_start, |(s, _)| s), self.pos));
        }
    }
}

/// Tokenize a whole stream.
pub fn tokenize(src: &[u8]) -> Vec<Token<'_>> {
    Lexer::new(src).collect()
}

fn span_text(src: &[u8], span: Option<(usize, usize)>) -> &[u8] {
    span.map_or(&src[0..0], |(s, e)| &src[s..e])
}

/// `None` means the word is an operator.
fn classify_word(word: &[u8]) -> Option<Operand<'_>> {
    match word {
        b"true" | b"false" | b"null" => Some(Operand::Other(word)),
        [first, ..] if first.is_ascii_digit() || matches!(first, b'+' | b'-' | b'.') => {
            let number = word
                .iter()
                .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
                .then(|| std::str::from_utf8(word).ok())
                .flatten()
                .and_then(|s| s.parse::<f64>().ok());
            Some(number.map_or(Operand::Other(word), Operand::Number))
        }
        _ => None,
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\0')
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}
