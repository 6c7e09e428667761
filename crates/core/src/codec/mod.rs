//! Stream body decoding.
//!
//! - `flate`: FlateDecode with a strict and a best-effort variant

pub mod flate;

pub use flate::{DEFAULT_MAX_DECODED_LEN, flate_decode, flate_decode_lenient};
