use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use pdfparse_core::{PdfDocument, PdfReader, PdfTree, parse};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn parse_results_are_send_and_sync() {
    assert_send_sync::<PdfTree>();
    assert_send_sync::<PdfDocument>();
    assert_send_sync::<PdfReader>();
}

#[test]
fn documents_parse_concurrently_from_shared_bytes() {
    let data = Bytes::from_static(
        b"%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
          2 0 obj << /Type /Pages /Kids [ ] /Count 0 >> endobj\n\
          trailer << /Root 1 0 R >> startxref 0 %%EOF\n",
    );
    let reader = Arc::new(PdfReader::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let data = data.clone();
            let reader = Arc::clone(&reader);
            thread::spawn(move || reader.read_shared(data).unwrap())
        })
        .collect();

    let expected = parse(&data).unwrap();
    for handle in handles {
        let doc = handle.join().unwrap();
        assert_eq!(doc.tree().len(), expected.len());
        assert!(doc.tree().trailer_dict().is_some());
    }
}

#[test]
fn tree_is_shared_across_threads() {
    let tree = Arc::new(parse(b"%PDF-1.7\n1 0 obj [ 1 2 3 ] endobj").unwrap());
    let counts: Vec<usize> = (0..3)
        .map(|_| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || tree.walk().count())
        })
        .map(|handle| handle.join().unwrap())
        .collect();
    let expected = tree.walk().count();
    assert!(counts.iter().all(|&n| n == expected));
}
