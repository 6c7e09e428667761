//! Recursive-descent grammar for the PDF file structure.
//!
//! Productions are matched directly against the [`Lexer`] cursor and each
//! match is reported to the [`Builder`]. Nesting of dictionaries and
//! arrays is not tracked here: `<<`, `>>`, `[` and `]` are plain elements
//! and the builder's container stack decides whether they balance.
//!
//! ```text
//! file         := [header] (comment | object | xref? trailer | startxref_tail | stream)*
//! object       := uint uint "obj" (dict_element | stream)* "endobj"
//! trailer      := "trailer" dict_element* "startxref" uint "%%EOF"
//! xref         := "xref" (uint uint entry*)+
//! dict_element := "<<" | ">>" | "[" | "]" | comment | uint uint "R" | value
//! ```

use tracing::{debug, trace};

use crate::error::{PdfError, Result};
use crate::model::PdfTree;

use super::builder::Builder;
use super::lexer::{Keyword, Lexer, Token, is_whitespace};

const ENDSTREAM: &[u8] = b"endstream";

pub struct Grammar<'a> {
    lexer: Lexer<'a>,
    builder: Builder,
}

impl<'a> Grammar<'a> {
    pub fn new(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            lexer: Lexer::new(data),
            builder: Builder::new(max_depth),
        }
    }

    /// Run the whole input through the grammar and return the tree.
    pub fn parse(mut self) -> Result<PdfTree> {
        self.file()?;
        self.builder.finish()
    }

    fn next(&mut self) -> Result<(usize, Token<'a>)> {
        match self.lexer.next_token()? {
            Some(token) => Ok(token),
            None => Err(PdfError::UnexpectedEof {
                pos: self.lexer.tell(),
            }),
        }
    }

    fn file(&mut self) -> Result<()> {
        while let Some((pos, token)) = self.lexer.next_token()? {
            match token {
                Token::Comment(text) => match header_version(text) {
                    Some((major, minor)) => {
                        debug!(major, minor, offset = pos, "file header");
                        self.builder.have_file(pos, major, minor)?;
                    }
                    None => self.builder.push_comment(pos, text)?,
                },
                Token::Keyword(Keyword::Xref) => {
                    self.xref(pos)?;
                    self.trailer_after_xref(pos)?;
                }
                Token::Keyword(Keyword::Trailer) => self.trailer(pos)?,
                Token::Keyword(Keyword::StartXref) => {
                    let start = self.startxref_tail()?;
                    debug!(start, offset = pos, "startxref without trailer");
                }
                Token::Keyword(Keyword::Stream) => self.stream(pos)?,
                Token::Keyword(Keyword::EndObj) => self.builder.end_object(pos)?,
                other => self.dict_element(pos, other)?,
            }
        }
        Ok(())
    }

    fn object_body(&mut self) -> Result<()> {
        loop {
            let (pos, token) = self.next()?;
            match token {
                Token::Keyword(Keyword::EndObj) => return self.builder.end_object(pos),
                Token::Keyword(Keyword::Stream) => self.stream(pos)?,
                Token::Keyword(Keyword::Trailer) => self.trailer(pos)?,
                other => self.dict_element(pos, other)?,
            }
        }
    }

    fn dict_element(&mut self, pos: usize, token: Token<'a>) -> Result<()> {
        match token {
            Token::Comment(text) => self.builder.push_comment(pos, text),
            Token::DictBegin => self.builder.begin_dict(pos),
            Token::DictEnd => self.builder.end_dict(pos),
            Token::ArrayBegin => self.builder.begin_array(pos),
            Token::ArrayEnd => self.builder.end_array(pos),
            Token::Name(raw) => self.builder.push_name(pos, raw),
            Token::String(raw) => self.builder.push_string(pos, raw),
            Token::Number(value) => self.builder.push_number(pos, value),
            Token::UInt(n) => self.uint_element(pos, n),
            Token::Keyword(Keyword::True) => self.builder.push_bool(pos, true),
            Token::Keyword(Keyword::False) => self.builder.push_bool(pos, false),
            Token::Keyword(Keyword::Null) => self.builder.push_null(pos),
            Token::Keyword(kw) => Err(PdfError::structure(
                pos,
                format!(
                    "unexpected keyword '{}'",
                    String::from_utf8_lossy(kw.as_bytes())
                ),
            )),
        }
    }

    /// An unsigned integer opens `N G R`, `N G obj`, or is a plain number.
    fn uint_element(&mut self, pos: usize, n: u64) -> Result<()> {
        let saved = self.lexer.tell();
        if let Some((_, Token::UInt(generation))) = self.lexer.next_token()?
            && let Some((_, Token::Keyword(kw @ (Keyword::R | Keyword::Obj)))) =
                self.lexer.next_token()?
            && let (Ok(number), Ok(generation)) = (u32::try_from(n), u32::try_from(generation))
        {
            self.builder.push_uint(number);
            self.builder.push_uint(generation);
            if kw == Keyword::R {
                return self.builder.push_object_ref(pos);
            }
            self.builder.begin_object(pos)?;
            debug!(number, generation, offset = pos, "object");
            return self.object_body();
        }
        self.lexer.set_pos(saved);
        self.builder.push_number(pos, n as f64)
    }

    /// `stream`, one end-of-line, then everything up to the first `endstream`.
    fn stream(&mut self, pos: usize) -> Result<()> {
        self.lexer.skip_eol();
        let begin = self.lexer.tell();
        let Some(end) = self.lexer.find(ENDSTREAM) else {
            return Err(PdfError::structure(pos, "unterminated stream"));
        };
        trace!(begin, end, "stream body");
        self.builder.emit_stream(pos, begin, end)?;
        self.lexer.set_pos(end + ENDSTREAM.len());
        Ok(())
    }

    fn trailer(&mut self, pos: usize) -> Result<()> {
        self.builder.begin_trailer(pos)?;
        loop {
            let (token_pos, token) = self.next()?;
            match token {
                Token::Keyword(Keyword::StartXref) => {
                    let start = self.startxref_tail()?;
                    debug!(start, offset = pos, "trailer");
                    return self.builder.end_trailer(token_pos, Some(start));
                }
                other => self.dict_element(token_pos, other)?,
            }
        }
    }

    /// After `startxref`: the offset value and the `%%EOF` marker.
    fn startxref_tail(&mut self) -> Result<u64> {
        let start = match self.next()? {
            (_, Token::UInt(n)) => n,
            (pos, other) => {
                return Err(PdfError::structure(
                    pos,
                    format!("expected startxref offset, found {}", other.describe()),
                ));
            }
        };
        match self.next()? {
            (_, Token::Comment(text)) if text.starts_with(b"%%EOF") => Ok(start),
            (pos, other) => Err(PdfError::structure(
                pos,
                format!("expected %%EOF, found {}", other.describe()),
            )),
        }
    }

    /// An xref section is always followed by its trailer; comments may sit
    /// in between.
    fn trailer_after_xref(&mut self, xref_pos: usize) -> Result<()> {
        loop {
            match self.lexer.next_token()? {
                Some((pos, Token::Comment(text))) => self.builder.push_comment(pos, text)?,
                Some((pos, Token::Keyword(Keyword::Trailer))) => return self.trailer(pos),
                Some((pos, other)) => {
                    return Err(PdfError::structure(
                        pos,
                        format!("expected trailer after xref, found {}", other.describe()),
                    ));
                }
                None => return Err(PdfError::structure(xref_pos, "xref without trailer")),
            }
        }
    }

    /// Consume an xref section. Entries are checked for shape and dropped.
    fn xref(&mut self, pos: usize) -> Result<()> {
        let mut subsections = 0usize;
        let mut entries = 0usize;
        loop {
            self.lexer.skip_whitespace();
            let header_pos = self.lexer.tell();
            let Some(first) = self.lexer.read_uint() else {
                break;
            };
            self.lexer.skip_whitespace();
            let Some(count) = self.lexer.read_uint() else {
                return Err(PdfError::structure(header_pos, "malformed xref subsection"));
            };
            self.lexer.skip_whitespace();

            let mut found = 0u64;
            while self.xref_entry() {
                found += 1;
            }
            if found != count {
                debug!(first, count, found, "xref subsection entry count mismatch");
            }
            subsections += 1;
            entries += found as usize;
        }
        if subsections == 0 {
            return Err(PdfError::structure(pos, "malformed xref section"));
        }
        debug!(subsections, entries, offset = pos, "skipped xref section");
        Ok(())
    }

    /// `nnnnnnnnnn ggggg n` plus one or two whitespace bytes.
    fn xref_entry(&mut self) -> bool {
        let start = self.lexer.tell();
        let shaped = self.lexer.eat_digits(10)
            && self.lexer.eat(b" ")
            && self.lexer.eat_digits(5)
            && self.lexer.eat(b" ")
            && (self.lexer.eat(b"n") || self.lexer.eat(b"f"));
        let mut terminator = 0;
        while shaped && terminator < 2 && self.lexer.peek().is_some_and(is_whitespace) {
            self.lexer.set_pos(self.lexer.tell() + 1);
            terminator += 1;
        }
        if !shaped || terminator == 0 {
            self.lexer.set_pos(start);
            return false;
        }
        true
    }
}

/// `(major, minor)` if the comment is a `%PDF-M.m` header.
fn header_version(text: &[u8]) -> Option<(u32, u32)> {
    let rest = text.strip_prefix(b"%PDF-")?;
    let mut lexer = Lexer::new(rest);
    let major = u32::try_from(lexer.read_uint()?).ok()?;
    if !lexer.eat(b".") {
        return None;
    }
    let minor = u32::try_from(lexer.read_uint()?).ok()?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::builder::DEFAULT_MAX_DEPTH;
    use crate::model::{Entry, Kind};

    fn parse(data: &[u8]) -> Result<PdfTree> {
        Grammar::new(data, DEFAULT_MAX_DEPTH).parse()
    }

    fn error(data: &[u8]) -> String {
        parse(data).unwrap_err().to_string()
    }

    #[test]
    fn test_header_version() {
        assert_eq!(header_version(b"%PDF-1.7"), Some((1, 7)));
        assert_eq!(header_version(b"%PDF-2.0 trailing"), Some((2, 0)));
        assert_eq!(header_version(b"%PDF-x.y"), None);
        assert_eq!(header_version(b"%PDF-1"), None);
        assert_eq!(header_version(b"%comment"), None);
    }

    #[test]
    fn test_reference_lookahead() {
        let tree = parse(b"1 0 obj [ 1 2 R 3 4 5 ] endobj").unwrap();
        let obj = tree.find_object(1, 0).unwrap();
        let array = tree.entry(obj).as_object().unwrap().value.unwrap();
        let kinds: Vec<Kind> = tree
            .children(array)
            .iter()
            .map(|&id| tree.kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![Kind::ObjectReference, Kind::Number, Kind::Number, Kind::Number]
        );
    }

    #[test]
    fn test_stream_body_range() {
        let data = b"1 0 obj << /Length 5 >>\nstream\r\nhello\nendstream\nendobj";
        let tree = parse(data).unwrap();
        let obj = tree.find_object(1, 0).unwrap();
        let stream = tree.entry(obj).as_object().unwrap().stream.unwrap();
        let Entry::Stream(stream) = tree.entry(stream) else {
            panic!("expected stream");
        };
        assert_eq!(&data[stream.begin..stream.end], b"hello\n");
        assert_eq!(tree.stream_body(data, obj), Some(&b"hello"[..]));
    }

    #[test]
    fn test_stream_body_is_not_tokenized() {
        let data = b"1 0 obj <<>> stream\n) ( << ]]] \xff\xfe\nendstream endobj";
        assert!(parse(data).is_ok());
    }

    #[test]
    fn test_unterminated_stream() {
        assert!(error(b"1 0 obj <<>> stream\nabc endobj").contains("unterminated stream"));
    }

    #[test]
    fn test_xref_is_consumed() {
        let data = b"xref\n0 2\n0000000000 65535 f\r\n0000000017 00000 n\n\
                     3 1\n0000000081 00000 n \n\
                     trailer << /Size 4 >> startxref 99 %%EOF";
        let tree = parse(data).unwrap();
        assert_eq!(tree.kind(tree.root()), Kind::Part);
        let trailer = tree.trailers().next().unwrap();
        assert_eq!(tree.entry(trailer).as_trailer().unwrap().start_xref, Some(99));
    }

    #[test]
    fn test_xref_requires_trailer() {
        assert!(error(b"xref\n0 1\n0000000000 65535 f\r\n").contains("xref without trailer"));
        assert!(error(b"xref\ntrailer").contains("malformed xref section"));
    }

    #[test]
    fn test_trailer_needs_eof_marker() {
        assert!(error(b"trailer << >> startxref 5 endobj").contains("expected %%EOF"));
    }

    #[test]
    fn test_object_nested_in_object() {
        assert!(error(b"1 0 obj 2 0 obj endobj endobj").contains("object in wrong place"));
        assert!(error(b"1 0 obj trailer").contains("trailer in wrong place"));
    }

    #[test]
    fn test_unexpected_eof_in_object() {
        let err = parse(b"1 0 obj << >>").unwrap_err();
        assert!(matches!(err, PdfError::UnexpectedEof { pos: 13 }));
    }

    #[test]
    fn test_stray_keyword() {
        assert!(error(b"%PDF-1.4\nendstream").contains("unexpected keyword 'endstream'"));
        assert!(error(b"%PDF-1.4\nendobj").contains("spurious object end"));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse(b""), Err(PdfError::Empty)));
        assert!(matches!(parse(b" \r\n\t"), Err(PdfError::Empty)));
    }
}
