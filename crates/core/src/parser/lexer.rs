//! PDF object-syntax tokenizer.
//!
//! Works on a cursor into a borrowed byte slice. Every token is returned
//! together with the offset where it starts; the cursor can be saved and
//! restored freely, which is how the grammar does its lookahead.

use crate::error::{PdfError, Result};

/// Keywords of the PDF file structure. Anything else is kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword<'a> {
    True,
    False,
    Null,
    R,
    Obj,
    EndObj,
    Stream,
    EndStream,
    Xref,
    Trailer,
    StartXref,
    Unknown(&'a [u8]),
}

impl<'a> Keyword<'a> {
    pub fn from_bytes(b: &'a [u8]) -> Self {
        match b {
            b"true" => Keyword::True,
            b"false" => Keyword::False,
            b"null" => Keyword::Null,
            b"R" => Keyword::R,
            b"obj" => Keyword::Obj,
            b"endobj" => Keyword::EndObj,
            b"stream" => Keyword::Stream,
            b"endstream" => Keyword::EndStream,
            b"xref" => Keyword::Xref,
            b"trailer" => Keyword::Trailer,
            b"startxref" => Keyword::StartXref,
            _ => Keyword::Unknown(b),
        }
    }

    pub fn as_bytes(self) -> &'a [u8] {
        match self {
            Keyword::True => b"true",
            Keyword::False => b"false",
            Keyword::Null => b"null",
            Keyword::R => b"R",
            Keyword::Obj => b"obj",
            Keyword::EndObj => b"endobj",
            Keyword::Stream => b"stream",
            Keyword::EndStream => b"endstream",
            Keyword::Xref => b"xref",
            Keyword::Trailer => b"trailer",
            Keyword::StartXref => b"startxref",
            Keyword::Unknown(bytes) => bytes,
        }
    }
}

/// Lexical tokens. Byte payloads borrow from the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    /// `%...` up to (not including) the line end
    Comment(&'a [u8]),
    /// Name bytes after the slash, `#xx` escapes left as written
    Name(&'a [u8]),
    /// Unsigned integer written with digits only
    UInt(u64),
    /// Any other number (signed, real, or too large for `UInt`)
    Number(f64),
    /// Literal or hex string including its delimiters
    String(&'a [u8]),
    DictBegin,
    DictEnd,
    ArrayBegin,
    ArrayEnd,
    Keyword(Keyword<'a>),
}

impl Token<'_> {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Comment(_) => "comment".into(),
            Token::Name(raw) => format!("name /{}", String::from_utf8_lossy(raw)),
            Token::UInt(n) => format!("number {n}"),
            Token::Number(v) => format!("number {v}"),
            Token::String(_) => "string".into(),
            Token::DictBegin => "'<<'".into(),
            Token::DictEnd => "'>>'".into(),
            Token::ArrayBegin => "'['".into(),
            Token::ArrayEnd => "']'".into(),
            Token::Keyword(kw) => format!("keyword '{}'", String::from_utf8_lossy(kw.as_bytes())),
        }
    }
}

/// Check if byte is whitespace
pub(crate) const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

/// Check if byte is delimiter
pub(crate) const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position in the input
    pub const fn tell(&self) -> usize {
        self.pos
    }

    /// Set current position in the input.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get remaining unparsed data
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub const fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Peek at current byte without advancing
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skip whitespace only. Comments are tokens of their own.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                return;
            }
            self.pos += 1;
        }
    }

    /// Consume one end-of-line marker (CRLF, LF or CR) if present.
    pub fn skip_eol(&mut self) {
        match self.peek() {
            Some(b'\r') => {
                self.pos += 1;
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.pos += 1,
            _ => {}
        }
    }

    /// Consume `literal` if the input continues with it.
    pub fn eat(&mut self, literal: &[u8]) -> bool {
        if self.remaining().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume exactly `count` ASCII digits.
    pub fn eat_digits(&mut self, count: usize) -> bool {
        let rest = self.remaining();
        if rest.len() >= count && rest[..count].iter().all(u8::is_ascii_digit) {
            self.pos += count;
            true
        } else {
            false
        }
    }

    /// Read a run of digits as an unsigned integer, without skipping
    /// whitespace first.
    pub fn read_uint(&mut self) -> Option<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
            self.pos += 1;
        }
        if self.pos == start { None } else { Some(value) }
    }

    /// Position of the first literal `needle` at or after the cursor.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        let rest = self.remaining();
        if needle.is_empty() || rest.len() < needle.len() {
            return None;
        }
        rest.windows(needle.len())
            .position(|w| w == needle)
            .map(|i| self.pos + i)
    }

    fn parse_comment(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let text = &self.data[start..self.pos];
        self.skip_eol();
        Token::Comment(text)
    }

    fn parse_name(&mut self) -> Token<'a> {
        self.advance(); // Skip '/'
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            self.pos += 1;
        }
        Token::Name(&self.data[start..self.pos])
    }

    /// Parse a number (integer or real)
    fn parse_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let mut signed = false;
        let mut has_dot = false;
        let mut digits = 0usize;

        if matches!(self.peek(), Some(b'+' | b'-')) {
            signed = true;
            self.advance();
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if b == b'.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(PdfError::token(start, "malformed number"));
        }
        if let Some(b) = self.peek()
            && is_regular(b)
        {
            return Err(PdfError::token(start, "malformed number"));
        }

        let text = &self.data[start..self.pos];
        if !signed && !has_dot {
            let mut probe = Lexer::new(text);
            if let Some(n) = probe.read_uint() {
                return Ok(Token::UInt(n));
            }
        }

        let s = std::str::from_utf8(text).map_err(|_| PdfError::token(start, "malformed number"))?;
        // "5." and ".5" are valid PDF reals; Rust's parser accepts both
        let val: f64 = s
            .parse()
            .map_err(|_| PdfError::token(start, format!("malformed number: {s}")))?;
        // Overflowing values would be written back as `inf`
        if !val.is_finite() {
            return Err(PdfError::token(start, "malformed number: out of range"));
        }
        Ok(Token::Number(val))
    }

    /// Parse a literal string (...), keeping the raw bytes
    fn parse_string(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        self.advance(); // Skip '('
        let mut depth = 1usize;

        while depth > 0 {
            match self.advance() {
                Some(b'(') => depth += 1,
                Some(b')') => depth -= 1,
                Some(b'\\') => {
                    if self.advance().is_none() {
                        return Err(PdfError::token(start, "unterminated string"));
                    }
                }
                Some(_) => {}
                None => return Err(PdfError::token(start, "unterminated string")),
            }
        }

        Ok(Token::String(&self.data[start..self.pos]))
    }

    /// Parse a hex string <...>, keeping the raw bytes
    fn parse_hex_string(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        self.advance(); // Skip '<'

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) if c.is_ascii_hexdigit() || is_whitespace(c) => {}
                Some(_) => {
                    return Err(PdfError::token(self.pos - 1, "malformed hex string"));
                }
                None => return Err(PdfError::token(start, "unterminated hex string")),
            }
        }

        Ok(Token::String(&self.data[start..self.pos]))
    }

    fn parse_keyword(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            self.advance();
        }
        Token::Keyword(Keyword::from_bytes(&self.data[start..self.pos]))
    }

    /// Get next token, skipping leading whitespace.
    pub fn next_token(&mut self) -> Result<Option<(usize, Token<'a>)>> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(b) = self.peek() else {
            return Ok(None);
        };

        let token = match b {
            b'%' => self.parse_comment(),
            b'/' => self.parse_name(),
            b'(' => self.parse_string()?,
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    Token::DictBegin
                } else {
                    self.parse_hex_string()?
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Token::DictEnd
                } else {
                    return Err(PdfError::token(start, "unexpected '>'"));
                }
            }
            b'[' => {
                self.advance();
                Token::ArrayBegin
            }
            b']' => {
                self.advance();
                Token::ArrayEnd
            }
            b')' | b'{' | b'}' => {
                return Err(PdfError::token(
                    start,
                    format!("unexpected '{}'", char::from(b)),
                ));
            }
            b'+' | b'-' | b'.' => self.parse_number()?,
            c if c.is_ascii_digit() => self.parse_number()?,
            _ => self.parse_keyword(),
        };

        Ok(Some((start, token)))
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Option<(usize, Token<'a>)>> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }
}

/// Resolve `#xx` escapes in a raw name.
///
/// A `#` not followed by two hex digits is kept as written.
pub fn decode_name(raw: &[u8]) -> Vec<u8> {
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b == b'#'
            && i + 2 < raw.len()
            && let (Some(h1), Some(h2)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2]))
        {
            name.push((h1 << 4) | h2);
            i += 3;
            continue;
        }
        name.push(b);
        i += 1;
    }
    name
}

/// Decode a raw literal `(...)` or hex `<...>` string token.
pub fn decode_string(raw: &[u8]) -> Vec<u8> {
    match raw.first() {
        Some(b'(') => decode_literal(raw),
        Some(b'<') => decode_hex(raw),
        _ => raw.to_vec(),
    }
}

fn decode_literal(raw: &[u8]) -> Vec<u8> {
    // Strip the outer parentheses
    let end = if raw.len() > 1 && raw.ends_with(b")") {
        raw.len() - 1
    } else {
        raw.len()
    };
    let inner = &raw[1..end];
    let mut result = Vec::with_capacity(inner.len());
    let mut i = 0;

    while i < inner.len() {
        let b = inner[i];
        i += 1;
        if b != b'\\' {
            result.push(b);
            continue;
        }
        let Some(&c) = inner.get(i) else {
            break;
        };
        i += 1;
        match c {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(0x08),
            b'f' => result.push(0x0c),
            b'\r' => {
                // Line continuation - skip \r and optional \n
                if inner.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {}
            b'0'..=b'7' => {
                // Octal escape (1-3 digits)
                let mut octal = u32::from(c - b'0');
                for _ in 0..2 {
                    match inner.get(i) {
                        Some(&d) if (b'0'..=b'7').contains(&d) => {
                            octal = octal * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                result.push((octal & 0xFF) as u8);
            }
            // Unknown escape, just keep the character
            other => result.push(other),
        }
    }

    result
}

fn decode_hex(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len() / 2);
    let mut pending: Option<u8> = None;
    for &c in raw {
        let Some(nibble) = hex_value(c) else {
            continue;
        };
        if let Some(high) = pending.take() {
            result.push((high << 4) | nibble);
        } else {
            pending = Some(nibble);
        }
    }
    // An odd trailing digit is padded with zero
    if let Some(high) = pending {
        result.push(high << 4);
    }
    result
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
