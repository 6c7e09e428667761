//! A parsed document that owns its source bytes.

use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use memmap2::Mmap;
use tracing::warn;

use crate::codec::flate::{flate_decode, flate_decode_lenient};
use crate::emit::WriteEmitter;
use crate::error::{PdfError, Result};
use crate::model::{Entry, NodeId, PdfTree};

use super::high_level::{ParseOptions, parse_with};

/// Source bytes plus the tree parsed from them.
///
/// Stream nodes only record offsets, so anything that needs body bytes
/// goes through the document rather than the bare tree.
pub struct PdfDocument {
    data: Bytes,
    tree: PdfTree,
    max_decoded_len: usize,
}

impl PdfDocument {
    /// Memory-map and parse the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ParseOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file) }?;
        Self::from_mmap_with(mmap, options)
    }

    pub fn from_mmap(mmap: Mmap) -> Result<Self> {
        Self::from_mmap_with(mmap, &ParseOptions::default())
    }

    pub fn from_mmap_with(mmap: Mmap, options: &ParseOptions) -> Result<Self> {
        Self::from_bytes_with(Bytes::from_owner(mmap), options)
    }

    /// Parse shared bytes (zero-copy).
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        Self::from_bytes_with(data, &ParseOptions::default())
    }

    pub fn from_bytes_with(data: Bytes, options: &ParseOptions) -> Result<Self> {
        let tree = parse_with(&data, options)?;
        Ok(Self {
            data,
            tree,
            max_decoded_len: options.max_decoded_len,
        })
    }

    /// Copy `data` and parse it.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Self::from_bytes(Bytes::copy_from_slice(data))
    }

    /// Raw source bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub const fn tree(&self) -> &PdfTree {
        &self.tree
    }

    pub fn into_tree(self) -> PdfTree {
        self.tree
    }

    /// Encoded body of the stream owned by `object`.
    pub fn stream_body(&self, object: NodeId) -> Option<&[u8]> {
        self.tree.stream_body(&self.data, object)
    }

    /// Filter names of the stream owned by `object`, in application order.
    pub fn stream_filters(&self, object: NodeId) -> Vec<Vec<u8>> {
        let tree = &self.tree;
        let Some(dict) = tree
            .entry(object)
            .as_object()
            .ok()
            .and_then(|o| o.stream)
            .and_then(|s| tree.entry(s).as_stream().ok())
            .map(|s| s.dict)
        else {
            return Vec::new();
        };
        let Some(filter) = tree.dict_get(dict, "Filter") else {
            return Vec::new();
        };
        match tree.entry(filter) {
            Entry::Name(name) => vec![name.decoded()],
            Entry::Array(array) => array
                .children
                .iter()
                .filter_map(|&id| tree.resolve(id))
                .filter_map(|id| tree.entry(id).as_name().ok())
                .map(|name| name.decoded())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Body of the stream owned by `object` with its filters undone.
    ///
    /// Only FlateDecode is understood; any other filter is an error, as is
    /// a document with an `/Encrypt` entry. Each filter's output is capped
    /// at [`ParseOptions::max_decoded_len`].
    pub fn decoded_stream(&self, object: NodeId) -> Result<Cow<'_, [u8]>> {
        let body = self.stream_body(object).ok_or_else(|| {
            PdfError::DecodeError(format!("node {} has no stream", object.index()))
        })?;
        let filters = self.stream_filters(object);
        if filters.is_empty() {
            return Ok(Cow::Borrowed(body));
        }
        if self.tree.is_encrypted() {
            return Err(PdfError::DecodeError("stream data is encrypted".into()));
        }

        let mut data = Cow::Borrowed(body);
        for filter in &filters {
            data = match filter.as_slice() {
                b"FlateDecode" | b"Fl" => Cow::Owned(inflate(&data, self.max_decoded_len)?),
                other => {
                    return Err(PdfError::DecodeError(format!(
                        "unsupported filter /{}",
                        String::from_utf8_lossy(other)
                    )));
                }
            };
        }
        Ok(data)
    }

    /// Re-serialize the whole tree, copying stream bodies from the source.
    pub fn emit_to<W: Write>(&self, out: W) -> Result<W> {
        let mut emitter = WriteEmitter::new(out, &self.data);
        self.tree.emit(&mut emitter)?;
        Ok(emitter.into_inner())
    }

    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        self.emit_to(Vec::with_capacity(self.data.len()))
    }
}

/// Strict inflate, falling back to the decodable prefix of a damaged stream.
///
/// Exceeding `max_len` is never recovered from.
fn inflate(data: &[u8], max_len: usize) -> Result<Vec<u8>> {
    flate_decode(data, Some(max_len)).or_else(|err| {
        if matches!(err, PdfError::DecodedTooLarge { .. }) {
            return Err(err);
        }
        let partial = flate_decode_lenient(data, max_len);
        if partial.is_empty() {
            return Err(err);
        }
        warn!(error = %err, recovered = partial.len(), "damaged flate stream");
        Ok(partial)
    })
}
