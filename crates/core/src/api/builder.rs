//! Builder pattern for configuring a parse.
//!
//! # Example
//! ```no_run
//! use pdfparse_core::api::PdfReader;
//!
//! let doc = PdfReader::new()
//!     .max_depth(64)
//!     .max_input_len(64 << 20)
//!     .read_file("document.pdf")?;
//! println!("{} nodes", doc.tree().len());
//! # Ok::<(), pdfparse_core::PdfError>(())
//! ```

use std::path::Path;

use bytes::Bytes;

use crate::error::Result;
use crate::model::PdfTree;

use super::document::PdfDocument;
use super::high_level::{ParseOptions, parse_with};

/// Fluent wrapper around [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub struct PdfReader {
    options: ParseOptions,
}

impl PdfReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of simultaneously open containers.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    /// Sets the largest accepted input, in bytes.
    pub fn max_input_len(mut self, len: usize) -> Self {
        self.options.max_input_len = len;
        self
    }

    /// Sets the largest accepted output when decoding one stream filter.
    pub fn max_decoded_len(mut self, len: usize) -> Self {
        self.options.max_decoded_len = len;
        self
    }

    pub const fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses a borrowed byte range into a bare tree.
    pub fn read_bytes(&self, data: &[u8]) -> Result<PdfTree> {
        parse_with(data, &self.options)
    }

    /// Parses shared bytes into a document that keeps them alive.
    pub fn read_shared(&self, data: Bytes) -> Result<PdfDocument> {
        PdfDocument::from_bytes_with(data, &self.options)
    }

    /// Memory-maps and parses a file.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<PdfDocument> {
        PdfDocument::open_with(path, &self.options)
    }
}
