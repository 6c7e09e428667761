use std::io::{self, Write};

use super::{EmitContext, XrefTable};

/// Sink over any writer; original bytes come from the parsed source.
///
/// This is what re-serializes a whole document: stream bodies are copied
/// verbatim from `source` instead of being re-encoded.
pub struct WriteEmitter<'s, W: Write> {
    out: W,
    source: &'s [u8],
    pos: usize,
    xref: XrefTable,
}

impl<'s, W: Write> WriteEmitter<'s, W> {
    pub fn new(out: W, source: &'s [u8]) -> Self {
        Self {
            out,
            source,
            pos: 0,
            xref: XrefTable::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn range(&self, offset: usize, len: usize) -> Option<&'s [u8]> {
        let end = offset.checked_add(len)?;
        self.source.get(offset..end)
    }
}

impl<W: Write> EmitContext for WriteEmitter<'_, W> {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)?;
        self.pos += data.len();
        Ok(())
    }

    fn current_pos(&self) -> usize {
        self.pos
    }

    fn copy_orig_bytes(&mut self, offset: usize, len: usize) -> io::Result<bool> {
        let Some(src) = self.range(offset, len) else {
            return Ok(false);
        };
        self.write(src)?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_from_source_not_output() {
        let source = b"0123456789";
        let mut out = WriteEmitter::new(Vec::new(), source);
        out.write(b"ab").unwrap();
        assert!(out.copy_orig_bytes(4, 3).unwrap());
        assert!(!out.copy_orig_bytes(8, 3).unwrap());
        assert_eq!(out.current_pos(), 5);
        assert_eq!(out.into_inner(), b"ab456");
    }
}
