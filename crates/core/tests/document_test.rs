//! Tests for documents that own their source bytes: file access, stream
//! decoding and re-emission.

use std::borrow::Cow;
use std::io::Write;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdfparse_core::{PdfDocument, PdfError, PdfReader, parse};

const CONTENT: &[u8] = b"BT /F1 12 Tf 72 720 Td (Hello, world) Tj ET\n";

fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A small file whose content stream is deflated and whose `/Length` is an
/// indirect object defined after the stream.
fn flate_pdf(trailer_extra: &str) -> Vec<u8> {
    let packed = compress(CONTENT);
    let mut data = Vec::new();
    data.extend_from_slice(b"%PDF-1.6\n1 0 obj\n<< /Length 2 0 R /Filter /FlateDecode >>\nstream\n");
    data.extend_from_slice(&packed);
    data.extend_from_slice(b"\nendstream\nendobj\n");
    data.extend_from_slice(format!("2 0 obj\n{}\nendobj\n", packed.len()).as_bytes());
    data.extend_from_slice(
        format!("trailer\n<< /Size 3 {trailer_extra}>>\nstartxref\n0\n%%EOF\n").as_bytes(),
    );
    data
}

#[test]
fn test_open_and_decode_file() {
    let data = flate_pdf("");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let doc = PdfDocument::open(file.path()).unwrap();
    assert_eq!(doc.bytes(), &data[..]);
    assert_eq!(doc.tree().version(), Some((1, 6)));

    let obj = doc.tree().find_object(1, 0).unwrap();
    assert_eq!(doc.stream_filters(obj), vec![b"FlateDecode".to_vec()]);
    assert_eq!(doc.stream_body(obj).unwrap(), &compress(CONTENT)[..]);

    let decoded = doc.decoded_stream(obj).unwrap();
    assert!(matches!(decoded, Cow::Owned(_)));
    assert_eq!(&*decoded, CONTENT);
}

#[test]
fn test_reader_reads_file_with_options() {
    let data = flate_pdf("");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let doc = PdfReader::new().max_depth(8).read_file(file.path()).unwrap();
    assert_eq!(doc.tree().objects().count(), 2);

    let err = PdfReader::new()
        .max_input_len(16)
        .read_file(file.path())
        .err()
        .unwrap();
    assert!(matches!(err, PdfError::InputTooLarge { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PdfDocument::open(dir.path().join("absent.pdf")).err().unwrap();
    assert!(matches!(err, PdfError::Io(_)));
}

#[test]
fn test_filter_array_is_applied_in_order() {
    let packed = compress(&compress(CONTENT));
    let mut data = format!(
        "1 0 obj << /Length {} /Filter [ /FlateDecode /Fl ] >> stream\n",
        packed.len()
    )
    .into_bytes();
    data.extend_from_slice(&packed);
    data.extend_from_slice(b"\nendstream endobj");

    let doc = PdfDocument::from_slice(&data).unwrap();
    let obj = doc.tree().find_object(1, 0).unwrap();
    assert_eq!(&*doc.decoded_stream(obj).unwrap(), CONTENT);
}

#[test]
fn test_damaged_stream_yields_prefix() {
    let text: Vec<u8> = CONTENT.iter().copied().cycle().take(6000).collect();
    let packed = compress(&text);
    let damaged = &packed[..packed.len() - 4];
    let mut data = b"1 0 obj << /Filter /FlateDecode >> stream\n".to_vec();
    data.extend_from_slice(damaged);
    data.extend_from_slice(b"endstream endobj");

    let doc = PdfDocument::from_slice(&data).unwrap();
    let obj = doc.tree().find_object(1, 0).unwrap();
    let decoded = doc.decoded_stream(obj).unwrap();
    assert!(!decoded.is_empty());
    assert!(text.starts_with(&decoded));
}

#[test]
fn test_decoded_size_is_limited() {
    let packed = compress(&vec![0u8; 1 << 20]);
    assert!(packed.len() < 4096);
    let mut data = format!(
        "1 0 obj << /Length {} /Filter /FlateDecode >> stream\n",
        packed.len()
    )
    .into_bytes();
    data.extend_from_slice(&packed);
    data.extend_from_slice(b"\nendstream endobj");

    let doc = PdfReader::new()
        .max_decoded_len(64 << 10)
        .read_shared(Bytes::from(data.clone()))
        .unwrap();
    let obj = doc.tree().find_object(1, 0).unwrap();
    let err = doc.decoded_stream(obj).unwrap_err();
    assert!(matches!(err, PdfError::DecodedTooLarge { limit: 65536 }));

    // The default limit lets the same stream through
    let doc = PdfDocument::from_slice(&data).unwrap();
    let obj = doc.tree().find_object(1, 0).unwrap();
    assert_eq!(doc.decoded_stream(obj).unwrap().len(), 1 << 20);
}

#[test]
fn test_encrypted_document_refuses_to_decode() {
    let data = flate_pdf("/Encrypt 9 0 R ");
    let doc = PdfDocument::from_bytes(Bytes::from(data)).unwrap();
    assert!(doc.tree().is_encrypted());

    let obj = doc.tree().find_object(1, 0).unwrap();
    let err = doc.decoded_stream(obj).unwrap_err();
    assert!(matches!(err, PdfError::DecodeError(_)));
    // The raw body is still reachable
    assert!(doc.stream_body(obj).is_some());
}

#[test]
fn test_document_emit_round_trip() {
    let data = flate_pdf("");
    let doc = PdfDocument::from_slice(&data).unwrap();
    let emitted = doc.to_pdf_bytes().unwrap();
    assert!(emitted.starts_with(b"%PDF-1.6\n"));
    assert!(emitted.ends_with(b"%%EOF\n"));

    let again = PdfDocument::from_slice(&emitted).unwrap();
    let obj = again.tree().find_object(1, 0).unwrap();
    assert_eq!(&*again.decoded_stream(obj).unwrap(), CONTENT);

    let written = doc.emit_to(Vec::new()).unwrap();
    assert_eq!(written, emitted);
    assert_eq!(parse(&written).unwrap().objects().count(), 2);
}

#[test]
fn test_into_tree_outlives_document() {
    let tree = PdfDocument::from_slice(b"%PDF-1.3\n7 0 obj (x) endobj")
        .unwrap()
        .into_tree();
    assert!(tree.find_object(7, 0).is_some());
}
