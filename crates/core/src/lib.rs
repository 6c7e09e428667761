//! pdfparse - a structural parser for the PDF file syntax.
//!
//! Parsing produces a [`PdfTree`]: every comment, value, object, stream and
//! trailer of the input as a node carrying the byte offset where it starts.
//! Stream bodies are captured as byte ranges, never copied or tokenized.

pub mod api;
pub mod codec;
pub mod emit;
pub mod error;
pub mod model;
pub mod parser;

pub use api::{ParseOptions, PdfDocument, PdfReader, parse, parse_with};
pub use emit::{EmitContext, MemoryEmitter, WriteEmitter};
pub use error::{PdfError, Result};
pub use model::{Entry, Kind, NodeId, PdfTree};
