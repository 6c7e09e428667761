//! Parsing entry points.
//!
//! - `parse()` - parse a byte range with default limits
//! - `parse_with()` - parse with explicit [`ParseOptions`]

use tracing::debug;

use crate::codec::DEFAULT_MAX_DECODED_LEN;
use crate::error::{PdfError, Result};
use crate::model::PdfTree;
use crate::parser::{DEFAULT_MAX_DEPTH, Grammar};

/// Limits applied while parsing and while decoding stream bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Inputs longer than this are rejected before parsing starts.
    pub max_input_len: usize,

    /// Maximum number of simultaneously open containers, the File or
    /// Part root included.
    pub max_depth: usize,

    /// Largest output of one decode step for
    /// [`PdfDocument::decoded_stream`](super::PdfDocument::decoded_stream).
    pub max_decoded_len: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_input_len: usize::MAX,
            max_depth: DEFAULT_MAX_DEPTH,
            max_decoded_len: DEFAULT_MAX_DECODED_LEN,
        }
    }
}

/// Parse `data` into a tree with default options.
///
/// # Example
/// ```
/// let tree = pdfparse_core::parse(b"%PDF-1.4\n1 0 obj << >> endobj").unwrap();
/// assert_eq!(tree.version(), Some((1, 4)));
/// ```
pub fn parse(data: &[u8]) -> Result<PdfTree> {
    parse_with(data, &ParseOptions::default())
}

/// Parse `data` into a tree.
///
/// The first syntax or structure error aborts the parse; no partial tree
/// is returned.
pub fn parse_with(data: &[u8], options: &ParseOptions) -> Result<PdfTree> {
    if data.len() > options.max_input_len {
        return Err(PdfError::InputTooLarge {
            len: data.len(),
            limit: options.max_input_len,
        });
    }
    debug!(len = data.len(), max_depth = options.max_depth, "parsing");
    let tree = Grammar::new(data, options.max_depth).parse()?;
    debug!(nodes = tree.len(), "parsed");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_limit() {
        let options = ParseOptions {
            max_input_len: 4,
            ..Default::default()
        };
        let err = parse_with(b"%PDF-1.4", &options).unwrap_err();
        assert!(matches!(err, PdfError::InputTooLarge { len: 8, limit: 4 }));
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_depth_limit() {
        let options = ParseOptions {
            max_depth: 4,
            ..Default::default()
        };
        assert!(parse_with(b"1 0 obj [[]] endobj", &options).is_ok());
        let err = parse_with(b"1 0 obj [[[]]] endobj", &options).unwrap_err();
        assert!(matches!(err, PdfError::NestingTooDeep { pos: 10, limit: 4 }));
    }
}
