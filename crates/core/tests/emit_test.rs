//! Tests for re-serializing parse trees.

use pdfparse_core::emit::{EmitContext, MemoryEmitter, WriteEmitter};
use pdfparse_core::model::{Kind, PdfTree};
use pdfparse_core::{PdfError, parse};

const SCENARIO: &[u8] = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [ ] /Count 0 >>
endobj
trailer
<< /Root 1 0 R >>
startxref
0
%%EOF
";

const WITH_STREAM: &[u8] = b"%PDF-1.5
%\xc7\xec\x8f\xa2
3 0 obj
<< /Length 4 0 R >>
stream\r
q 1 0 0 1 72 720 cm\n(endobj) Tj Q
endstream
endobj
4 0 obj
33
endobj
5 0 obj
[ 1.25 -0.5 (a\\)b) <48 69> /A#20B true null 3 0 R ]
endobj
trailer
<< /Size 6 /Root 5 0 R >>
startxref
999
%%EOF
";

fn emit(tree: &PdfTree, source: &[u8]) -> Vec<u8> {
    let mut out = WriteEmitter::new(Vec::new(), source);
    tree.emit(&mut out).unwrap();
    out.into_inner()
}

/// Canonical text of every object and trailer, in source order.
fn structure(tree: &PdfTree) -> Vec<String> {
    tree.walk()
        .filter(|&id| matches!(tree.kind(id), Kind::Object | Kind::Trailer | Kind::Comment))
        .filter(|&id| tree.parent(id) == Some(tree.root()))
        .map(|id| match tree.kind(id) {
            Kind::Trailer => {
                let dict = tree.entry(id).as_trailer().unwrap().dict.unwrap();
                format!("trailer {}", tree.render(dict))
            }
            _ => tree.render(id),
        })
        .collect()
}

#[test]
fn test_emit_scenario() {
    let tree = parse(SCENARIO).unwrap();
    let text = String::from_utf8(emit(&tree, SCENARIO)).unwrap();
    insta::assert_snapshot!(text.replace('\r', ""), @r"
    %PDF-1.4

    1 0 obj
     << /Type /Catalog /Pages 2 0 R >>
    endobj

    2 0 obj
     << /Type /Pages /Kids [ ] /Count 0 >>
    endobj
    xref
    0 3
    0000000000 65535 f
    0000000010 00000 n
    0000000061 00000 n
    trailer
     << /Root 1 0 R >>
    startxref
    115
    %%EOF
    ");
}

#[test]
fn test_render_object() {
    let tree = parse(SCENARIO).unwrap();
    let obj = tree.find_object(1, 0).unwrap();
    insta::assert_snapshot!(tree.render(obj), @r"
    1 0 obj
     << /Type /Catalog /Pages 2 0 R >>
    endobj
    ");
}

#[test]
fn test_round_trip_preserves_structure() {
    for source in [SCENARIO, WITH_STREAM] {
        let tree = parse(source).unwrap();
        let emitted = emit(&tree, source);
        let reparsed = parse(&emitted).unwrap();

        assert_eq!(reparsed.version(), tree.version());
        assert_eq!(structure(&reparsed), structure(&tree));
        assert_eq!(reparsed.objects().count(), tree.objects().count());

        // Emitting again is a fixed point
        assert_eq!(emit(&reparsed, &emitted), emitted);
    }
}

#[test]
fn test_round_trip_stream_bodies() {
    let tree = parse(WITH_STREAM).unwrap();
    let emitted = emit(&tree, WITH_STREAM);
    let reparsed = parse(&emitted).unwrap();

    let before = tree.find_object(3, 0).unwrap();
    let after = reparsed.find_object(3, 0).unwrap();
    assert_eq!(
        tree.stream_body(WITH_STREAM, before).unwrap(),
        b"q 1 0 0 1 72 720 cm\n(endobj) Tj Q"
    );
    assert_eq!(
        reparsed.stream_body(&emitted, after),
        tree.stream_body(WITH_STREAM, before)
    );
}

#[test]
fn test_regenerated_xref_points_at_objects() {
    let tree = parse(WITH_STREAM).unwrap();
    let emitted = emit(&tree, WITH_STREAM);
    let reparsed = parse(&emitted).unwrap();

    let trailer = reparsed.trailers().next().unwrap();
    let start = reparsed.entry(trailer).as_trailer().unwrap().start_xref.unwrap() as usize;
    assert!(emitted[start..].starts_with(b"xref\n0 6\n"));

    let table = &emitted[start + b"xref\n0 6\n".len()..];
    for obj in reparsed.objects() {
        let o = reparsed.entry(obj).as_object().unwrap();
        let line = &table[20 * o.number as usize..20 * (o.number as usize + 1)];
        let pos: usize = std::str::from_utf8(&line[..10]).unwrap().parse().unwrap();
        assert_eq!(Some(pos), reparsed.offset(obj));
        assert!(emitted[pos..].starts_with(format!("{} 0 obj", o.number).as_bytes()));
    }
    // Numbers never written are free entries
    assert_eq!(&table[20..40], b"0000000000 00000 f\r\n");
}

#[test]
fn test_scalars_keep_raw_form() {
    let tree = parse(WITH_STREAM).unwrap();
    let obj = tree.find_object(5, 0).unwrap();
    let array = tree.entry(obj).as_object().unwrap().value.unwrap();
    insta::assert_snapshot!(
        tree.render(array),
        @r"[ 1.25 -0.5 (a\)b) <48 69> /A#20B true null 3 0 R ]"
    );
}

#[test]
fn test_memory_emitter_cannot_copy_foreign_stream() {
    let tree = parse(WITH_STREAM).unwrap();
    let obj = tree.find_object(3, 0).unwrap();
    let mut out = MemoryEmitter::new();
    let err = tree.emit_node(obj, &mut out).unwrap_err();
    assert!(matches!(err, PdfError::EmitError(_)));
}

#[test]
fn test_emit_node_records_xref_position() {
    let tree = parse(SCENARIO).unwrap();
    let obj = tree.find_object(2, 0).unwrap();
    let mut out = MemoryEmitter::new();
    out.write(b"prefix").unwrap();
    tree.emit_node(obj, &mut out).unwrap();
    assert_eq!(out.xref().get(2), Some((0, 7)));
    assert!(out.as_bytes()[7..].starts_with(b"2 0 obj\n"));
}
