//! Emitting parse trees back to bytes.
//!
//! - `memory` - buffer-backed sink, also used to render diagnostics
//! - `writer` - sink over any `io::Write`, copying stream bodies from the source
//! - `render` - canonical byte form of every node kind

pub mod memory;
pub mod render;
pub mod writer;

use std::collections::BTreeMap;
use std::io;

pub use memory::MemoryEmitter;
pub use render::format_number;
pub use writer::WriteEmitter;

/// Append-only byte sink.
pub trait EmitContext {
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Number of bytes written so far.
    fn current_pos(&self) -> usize;

    /// Append `len` bytes found at `offset` of the original input.
    ///
    /// Returns `Ok(false)` without writing anything when the range is not
    /// available.
    fn copy_orig_bytes(&mut self, offset: usize, len: usize) -> io::Result<bool>;

    /// Read up to `buf.len()` bytes of the original input at `offset`.
    ///
    /// Returns the number of bytes read; 0 when the range is not available.
    fn read_orig_bytes(&self, offset: usize, buf: &mut [u8]) -> usize;

    /// Object positions recorded while emitting, used for the xref table.
    fn xref(&mut self) -> &mut XrefTable;
}

/// Positions of emitted objects, keyed by object number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XrefTable {
    entries: BTreeMap<u32, (u32, usize)>,
}

impl XrefTable {
    pub fn insert(&mut self, number: u32, generation: u32, pos: usize) {
        self.entries.insert(number, (generation, pos));
    }

    pub fn get(&self, number: u32) -> Option<(u32, usize)> {
        self.entries.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render a single-section `xref` table covering objects `0..=max`.
    ///
    /// Object 0 heads the free list; numbers never emitted are free too.
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.entries.keys().next_back().map_or(1, |&max| max + 1);
        let mut out = Vec::with_capacity(20 * size as usize + 16);
        out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
        out.extend_from_slice(b"0000000000 65535 f\r\n");
        for number in 1..size {
            match self.entries.get(&number) {
                Some(&(generation, pos)) => {
                    out.extend_from_slice(format!("{pos:010} {generation:05} n\r\n").as_bytes());
                }
                None => out.extend_from_slice(b"0000000000 00000 f\r\n"),
            }
        }
        out
    }
}
