//! FlateDecode (zlib) for captured stream bodies.

use std::io::Read;

use flate2::read::ZlibDecoder;
use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{PdfError, Result};

/// Default cap on the output of a single decode step.
pub const DEFAULT_MAX_DECODED_LEN: usize = 256 << 20;

/// Inflate `data`, failing if the output would exceed `max_len`.
pub fn flate_decode(data: &[u8], max_len: Option<usize>) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = decoder
            .read(&mut buf)
            .map_err(|e| PdfError::DecodeError(format!("FlateDecode error: {e}")))?;
        if n == 0 {
            break;
        }
        if let Some(max) = max_len
            && out.len().saturating_add(n) > max
        {
            return Err(PdfError::DecodedTooLarge { limit: max });
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Best-effort inflate: returns whatever decoded before the data went bad,
/// at most `max_len` bytes.
///
/// Streams with a broken checksum or a truncated tail are common; feeding
/// the decoder one byte at a time keeps every byte it managed to produce.
pub fn flate_decode_lenient(data: &[u8], max_len: usize) -> Vec<u8> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).min(max_len));
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        out.extend_from_slice(&buf[..produced]);
        if out.len() >= max_len {
            out.truncate(max_len);
            break;
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}
