//! pdfunzip - Inspect, re-emit, or unpack the structure of a PDF file
//!
//! By default prints an outline of the parse tree. `--emit` writes the
//! tree back out as a PDF with a regenerated xref table, and `--extract`
//! writes every stream body to a directory, one file per object.

use clap::{ArgAction, ArgGroup, Parser};
use pdfparse_core::api::{PdfDocument, PdfReader};
use pdfparse_core::error::Result;
use pdfparse_core::model::{Entry, NodeId, PdfTree};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Short printable form of a byte string for the outline.
fn preview(raw: &[u8], limit: usize) -> String {
    let mut result = String::new();
    for &byte in raw.iter().take(limit) {
        match byte {
            0x20..=0x7e => result.push(byte as char),
            _ => result.push_str(&format!("\\x{byte:02x}")),
        }
    }
    if raw.len() > limit {
        result.push_str("...");
    }
    result
}

fn describe(tree: &PdfTree, id: NodeId) -> String {
    match tree.entry(id) {
        Entry::Comment(c) => format!("comment {}", preview(&c.text, 40)),
        Entry::Boolean(b) => format!("boolean {b}"),
        Entry::Number(n) => format!("number {}", pdfparse_core::emit::format_number(*n)),
        Entry::Name(name) => format!("name /{}", preview(name.raw(), 40)),
        Entry::String(s) => format!("string {}", preview(s.raw(), 40)),
        Entry::Null => "null".to_string(),
        Entry::ObjectReference(r) => format!("reference {} {} R", r.number, r.generation),
        Entry::Dictionary(d) => format!("dictionary ({} keys)", d.len()),
        Entry::Array(a) => format!("array ({} items)", a.children.len()),
        Entry::Stream(s) => format!("stream {}..{} ({} bytes)", s.begin, s.end, s.len()),
        Entry::Object(o) => format!("object {} {}", o.number, o.generation),
        Entry::Trailer(t) => match t.start_xref {
            Some(start) => format!("trailer (startxref {start})"),
            None => "trailer".to_string(),
        },
        Entry::Part(_) => "part".to_string(),
        Entry::File(f) => format!("file PDF-{}.{}", f.major, f.minor),
    }
}

/// Print the tree indented by depth, one node per line.
fn dumpoutline<W: Write + ?Sized>(out: &mut W, tree: &PdfTree, id: NodeId, depth: usize) -> Result<()> {
    let offset = tree
        .offset(id)
        .map_or_else(|| "-".to_string(), |o| o.to_string());
    writeln!(
        out,
        "{:indent$}{} @{offset}",
        "",
        describe(tree, id),
        indent = depth * 2
    )?;
    for &child in tree.children(id) {
        dumpoutline(out, tree, child, depth + 1)?;
    }
    Ok(())
}

/// File name for the stream of object `number generation`.
///
/// Incrementally updated files may define the same object more than once;
/// later definitions get their source offset appended so nothing is
/// overwritten.
fn stream_file_name(
    seen: &mut HashSet<(u32, u32)>,
    number: u32,
    generation: u32,
    offset: Option<usize>,
) -> String {
    if seen.insert((number, generation)) {
        return format!("obj_{number}_{generation}.bin");
    }
    let at = offset.map_or_else(|| "x".to_string(), |o| o.to_string());
    warn!(number, generation, offset = ?offset, "object redefined, keeping both streams");
    format!("obj_{number}_{generation}_at{at}.bin")
}

/// Write each stream body to `dir/obj_<n>_<g>.bin`.
fn extractstreams(doc: &PdfDocument, dir: &Path, raw: bool) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    let tree = doc.tree();
    let mut seen = HashSet::new();
    let mut written = 0;
    for id in tree.objects() {
        let Ok(obj) = tree.entry(id).as_object() else {
            continue;
        };
        if obj.stream.is_none() {
            continue;
        }
        let data = if raw {
            doc.stream_body(id).map(Cow::Borrowed)
        } else {
            match doc.decoded_stream(id) {
                Ok(data) => Some(data),
                Err(err) => {
                    warn!(number = obj.number, generation = obj.generation, error = %err, "writing stream undecoded");
                    doc.stream_body(id).map(Cow::Borrowed)
                }
            }
        };
        let Some(data) = data else {
            continue;
        };
        let name = stream_file_name(&mut seen, obj.number, obj.generation, tree.offset(id));
        let path = dir.join(name);
        std::fs::write(&path, &data)?;
        info!(path = %path.display(), bytes = data.len(), "extracted stream");
        written += 1;
    }
    Ok(written)
}

/// A command line tool for unpacking PDF file structure.
#[derive(Parser, Debug)]
#[command(name = "pdfunzip")]
#[command(author, version, about = "Inspect, re-emit or unpack PDF file structure", long_about = None)]
#[command(disable_version_flag = true)]
#[command(group(
    ArgGroup::new("procedure")
        .args(["emit", "extract"])
))]
struct Args {
    /// One or more paths to PDF files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: (),

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    // === Procedure options (mutually exclusive) ===
    /// Re-emit the parsed tree as a PDF with a regenerated xref table
    #[arg(short = 'e', long, action = ArgAction::SetTrue)]
    emit: bool,

    /// Write every stream body to the specified directory
    #[arg(short = 'x', long)]
    extract: Option<PathBuf>,

    // === Parser options ===
    /// Maximum nesting of open containers
    #[arg(long = "max-depth", default_value_t = pdfparse_core::parser::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    // === Output options ===
    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// With --extract, write stream bodies without undoing their filters
    #[arg(short = 'r', long = "raw-stream", action = ArgAction::SetTrue)]
    raw_stream: bool,
}

fn main() -> core::result::Result<(), Box<dyn core::error::Error>> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)?;
        Box::new(BufWriter::new(file))
    };

    // Output for files already processed is kept even when a later one fails
    let result = run(&args, &mut output);
    output.flush()?;
    result
}

fn run(args: &Args, output: &mut dyn Write) -> core::result::Result<(), Box<dyn core::error::Error>> {
    let reader = PdfReader::new().max_depth(args.max_depth);

    for path in &args.files {
        if !path.exists() {
            return Err(format!("file not found: {}", path.display()).into());
        }

        let doc = reader
            .read_file(path)
            .map_err(|err| format!("{}: {err}", path.display()))?;
        if doc.tree().is_encrypted() {
            warn!(path = %path.display(), "document is encrypted; stream bodies stay encrypted");
        }

        if args.emit {
            doc.emit_to(&mut *output)?;
        } else if let Some(ref dir) = args.extract {
            let count = extractstreams(&doc, dir, args.raw_stream)?;
            writeln!(output, "{}: {count} streams written", path.display())?;
        } else {
            dumpoutline(output, doc.tree(), doc.tree().root(), 0)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(files: Vec<PathBuf>) -> Args {
        Args {
            files,
            version: (),
            debug: false,
            emit: false,
            extract: None,
            max_depth: pdfparse_core::parser::DEFAULT_MAX_DEPTH,
            outfile: "-".to_string(),
            raw_stream: false,
        }
    }

    #[test]
    fn test_redefined_objects_get_distinct_names() {
        let mut seen = HashSet::new();
        assert_eq!(stream_file_name(&mut seen, 1, 0, Some(9)), "obj_1_0.bin");
        assert_eq!(stream_file_name(&mut seen, 2, 0, Some(60)), "obj_2_0.bin");
        assert_eq!(stream_file_name(&mut seen, 1, 0, Some(120)), "obj_1_0_at120.bin");
    }

    #[test]
    fn test_extract_keeps_every_definition() {
        let dir = tempfile::tempdir().unwrap();
        let data = b"%PDF-1.4\n\
            1 0 obj << >> stream\nold\nendstream endobj\n\
            1 0 obj << >> stream\nnew\nendstream endobj\n";
        let doc = PdfDocument::from_slice(data).unwrap();
        let out = dir.path().join("streams");
        assert_eq!(extractstreams(&doc, &out, true).unwrap(), 2);

        let mut names: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert_eq!(std::fs::read(out.join("obj_1_0.bin")).unwrap(), b"old\n");
        assert!(names[1].starts_with("obj_1_0_at"));
    }

    #[test]
    fn test_error_keeps_earlier_output() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        std::fs::write(&good, b"%PDF-1.4\n1 0 obj null endobj\n").unwrap();
        let missing = dir.path().join("missing.pdf");

        let mut output = Vec::new();
        let err = run(&args(vec![good, missing]), &mut output).unwrap_err();
        assert!(err.to_string().contains("file not found"));
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("file PDF-1.4 @0\n"));
        assert!(text.contains("object 1 0 @9"));
    }
}
