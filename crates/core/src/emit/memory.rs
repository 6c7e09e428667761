use std::io;

use super::{EmitContext, XrefTable};

/// Growable in-memory sink.
///
/// Its "original bytes" are its own history: copying or reading a range
/// only works within what has already been written.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    buf: Vec<u8>,
    xref: XrefTable,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Contents as text, with non-UTF-8 bytes replaced.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    fn range(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.buf.get(offset..end)
    }
}

impl EmitContext for MemoryEmitter {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn current_pos(&self) -> usize {
        self.buf.len()
    }

    fn copy_orig_bytes(&mut self, offset: usize, len: usize) -> io::Result<bool> {
        if self.range(offset, len).is_none() {
            return Ok(false);
        }
        self.buf.extend_from_within(offset..offset + len);
        Ok(true)
    }

    fn read_orig_bytes(&self, offset: usize, buf: &mut [u8]) -> usize {
        match self.range(offset, buf.len()) {
            Some(src) => {
                buf.copy_from_slice(src);
                src.len()
            }
            None => 0,
        }
    }

    fn xref(&mut self) -> &mut XrefTable {
        &mut self.xref
    }
}
