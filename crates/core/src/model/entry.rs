//! Parse-tree node types.
//!
//! Nodes live in an arena owned by [`PdfTree`](super::PdfTree) and refer to
//! each other through [`NodeId`]. Each node is plain data; the parse-stack
//! builder is what enforces the nesting rules.

use crate::error::{PdfError, Result};
use crate::parser::lexer::{decode_name, decode_string};
use smol_str::SmolStr;

use super::dict::Dictionary;

/// Stable index of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Node kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Comment,
    Boolean,
    Number,
    Name,
    String,
    Null,
    ObjectReference,
    Dictionary,
    Array,
    Stream,
    Object,
    Trailer,
    Part,
    File,
}

impl Kind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Name => "name",
            Self::String => "string",
            Self::Null => "null",
            Self::ObjectReference => "reference",
            Self::Dictionary => "dictionary",
            Self::Array => "array",
            Self::Stream => "stream",
            Self::Object => "object",
            Self::Trailer => "trailer",
            Self::Part => "part",
            Self::File => "file",
        }
    }

    /// Whether nodes of this kind own children.
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Dictionary | Self::Array | Self::Object | Self::Trailer | Self::Part | Self::File
        )
    }
}

/// `%...` comment, stored without its line end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: Vec<u8>,
}

/// PDF name (e.g. `/Type`), stored as written after the slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    raw: Vec<u8>,
}

impl Name {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    /// Bytes as they appear in the file (without the slash).
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Name with `#xx` escapes resolved.
    pub fn decoded(&self) -> Vec<u8> {
        decode_name(&self.raw)
    }

    /// Key text used for dictionary lookup: the raw bytes, one char per byte.
    pub fn key(&self) -> SmolStr {
        name_from_bytes(&self.raw)
    }
}

/// Literal `(...)` or hex `<...>` string, stored with its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString {
    raw: Vec<u8>,
}

impl PdfString {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_hex(&self) -> bool {
        self.raw.first() == Some(&b'<')
    }

    /// String contents with escapes or hex digits resolved.
    pub fn decoded(&self) -> Vec<u8> {
        decode_string(&self.raw)
    }
}

/// PDF indirect object reference (`N G R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub number: u32,
    pub generation: u32,
}

impl ObjRef {
    pub const fn new(number: u32, generation: u32) -> Self {
        Self { number, generation }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    pub children: Vec<NodeId>,
}

/// Stream payload location. The body is never copied out of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stream {
    /// First byte of the (still encoded) body
    pub begin: usize,
    /// One past the last body byte; where `endstream` starts
    pub end: usize,
    /// Dictionary describing the stream (`/Length`, `/Filter`, ...)
    pub dict: NodeId,
}

impl Stream {
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }

    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Indirect object `N G obj ... endobj`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub number: u32,
    pub generation: u32,
    /// The single direct value, also present in `children`
    pub value: Option<NodeId>,
    /// The single stream, also present in `children`
    pub stream: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl IndirectObject {
    pub const fn new(number: u32, generation: u32) -> Self {
        Self {
            number,
            generation,
            value: None,
            stream: None,
            children: Vec::new(),
        }
    }

    pub const fn reference(&self) -> ObjRef {
        ObjRef::new(self.number, self.generation)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trailer {
    /// The trailer dictionary, also present in `children`
    pub dict: Option<NodeId>,
    /// Value written after `startxref`
    pub start_xref: Option<u64>,
    pub children: Vec<NodeId>,
}

/// A run of objects without a file header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Part {
    pub children: Vec<NodeId>,
}

/// Whole input, opened by a `%PDF-M.m` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    pub major: u32,
    pub minor: u32,
    pub children: Vec<NodeId>,
}

/// A parse-tree node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Comment(Comment),
    Boolean(bool),
    /// Integer and real forms share one representation
    Number(f64),
    Name(Name),
    String(PdfString),
    Null,
    ObjectReference(ObjRef),
    Dictionary(Dictionary),
    Array(Array),
    Stream(Stream),
    Object(IndirectObject),
    Trailer(Trailer),
    Part(Part),
    File(File),
}

impl Entry {
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Comment(_) => Kind::Comment,
            Self::Boolean(_) => Kind::Boolean,
            Self::Number(_) => Kind::Number,
            Self::Name(_) => Kind::Name,
            Self::String(_) => Kind::String,
            Self::Null => Kind::Null,
            Self::ObjectReference(_) => Kind::ObjectReference,
            Self::Dictionary(_) => Kind::Dictionary,
            Self::Array(_) => Kind::Array,
            Self::Stream(_) => Kind::Stream,
            Self::Object(_) => Kind::Object,
            Self::Trailer(_) => Kind::Trailer,
            Self::Part(_) => Kind::Part,
            Self::File(_) => Kind::File,
        }
    }

    /// Children in source order; empty for scalars.
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Dictionary(d) => d.children(),
            Self::Array(a) => &a.children,
            Self::Object(o) => &o.children,
            Self::Trailer(t) => &t.children,
            Self::Part(p) => &p.children,
            Self::File(f) => &f.children,
            _ => &[],
        }
    }

    fn type_error<T>(&self, expected: &'static str) -> Result<T> {
        Err(PdfError::TypeError {
            expected,
            got: self.kind().name(),
        })
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            _ => self.type_error("boolean"),
        }
    }

    /// Get numeric value
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            _ => self.type_error("number"),
        }
    }

    pub fn as_name(&self) -> Result<&Name> {
        match self {
            Self::Name(n) => Ok(n),
            _ => self.type_error("name"),
        }
    }

    pub fn as_string(&self) -> Result<&PdfString> {
        match self {
            Self::String(s) => Ok(s),
            _ => self.type_error("string"),
        }
    }

    pub fn as_reference(&self) -> Result<ObjRef> {
        match self {
            Self::ObjectReference(r) => Ok(*r),
            _ => self.type_error("reference"),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Self::Dictionary(d) => Ok(d),
            _ => self.type_error("dictionary"),
        }
    }

    pub fn as_array(&self) -> Result<&Array> {
        match self {
            Self::Array(a) => Ok(a),
            _ => self.type_error("array"),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => self.type_error("stream"),
        }
    }

    pub fn as_object(&self) -> Result<&IndirectObject> {
        match self {
            Self::Object(o) => Ok(o),
            _ => self.type_error("object"),
        }
    }

    pub fn as_trailer(&self) -> Result<&Trailer> {
        match self {
            Self::Trailer(t) => Ok(t),
            _ => self.type_error("trailer"),
        }
    }

    pub fn as_file(&self) -> Result<&File> {
        match self {
            Self::File(f) => Ok(f),
            _ => self.type_error("file"),
        }
    }
}

/// A node slot in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub entry: Entry,
    /// Where the node's text begins in the source; `None` if synthesized
    pub offset: Option<usize>,
    pub parent: Option<NodeId>,
}

pub(crate) fn name_from_bytes(bytes: &[u8]) -> SmolStr {
    bytes.iter().map(|&b| char::from(b)).collect()
}
