//! Canonical byte form of parse-tree nodes.
//!
//! Scalars and nested containers carry a leading space so that children can
//! be concatenated without separators. Whitespace of the source is not
//! preserved; everything else is, including raw name and string bytes.

use crate::error::{PdfError, Result};
use crate::model::{Entry, Node, NodeId, PdfTree};

use super::{EmitContext, MemoryEmitter};

/// Fractional digits kept when writing reals.
const NUMBER_PRECISION: usize = 5;

/// Format a number the way it is written back into a PDF.
///
/// Integral values have no fraction; reals keep at most five fractional
/// digits with trailing zeros removed.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let mut s = format!("{:.*}", NUMBER_PRECISION, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" { "0".to_string() } else { s }
}

fn emit_children<C: EmitContext + ?Sized>(
    nodes: &[Node],
    children: &[NodeId],
    ctx: &mut C,
) -> Result<()> {
    for &child in children {
        emit_node(nodes, child, ctx)?;
    }
    Ok(())
}

pub(crate) fn emit_node<C: EmitContext + ?Sized>(
    nodes: &[Node],
    id: NodeId,
    ctx: &mut C,
) -> Result<()> {
    match &nodes[id.index()].entry {
        Entry::Comment(c) => {
            ctx.write(&c.text)?;
            ctx.write(b"\n")?;
        }
        Entry::Boolean(b) => ctx.write(if *b { &b" true"[..] } else { &b" false"[..] })?,
        Entry::Number(v) => {
            ctx.write(b" ")?;
            ctx.write(format_number(*v).as_bytes())?;
        }
        Entry::Name(name) => {
            ctx.write(b" /")?;
            ctx.write(name.raw())?;
        }
        Entry::String(s) => {
            ctx.write(b" ")?;
            ctx.write(s.raw())?;
        }
        Entry::Null => ctx.write(b" null")?,
        Entry::ObjectReference(r) => {
            ctx.write(format!(" {} {} R", r.number, r.generation).as_bytes())?;
        }
        Entry::Dictionary(d) => {
            ctx.write(b" <<")?;
            emit_children(nodes, d.children(), ctx)?;
            ctx.write(b" >>")?;
        }
        Entry::Array(a) => {
            ctx.write(b" [")?;
            emit_children(nodes, &a.children, ctx)?;
            ctx.write(b" ]")?;
        }
        Entry::Stream(s) => {
            ctx.write(b"\nstream\n")?;
            if !ctx.copy_orig_bytes(s.begin, s.len())? {
                return Err(PdfError::EmitError(format!(
                    "stream body {}..{} is not available",
                    s.begin, s.end
                )));
            }
            ctx.write(b"endstream")?;
        }
        Entry::Object(obj) => {
            ctx.write(b"\n")?;
            let pos = ctx.current_pos();
            ctx.xref().insert(obj.number, obj.generation, pos);
            ctx.write(format!("{} {} obj\n", obj.number, obj.generation).as_bytes())?;
            emit_children(nodes, &obj.children, ctx)?;
            ctx.write(b"\nendobj\n")?;
        }
        Entry::Trailer(t) => {
            let xref_pos = ctx.current_pos();
            let table = ctx.xref().to_bytes();
            ctx.write(&table)?;
            ctx.write(b"trailer\n")?;
            emit_children(nodes, &t.children, ctx)?;
            ctx.write(format!("\nstartxref\n{xref_pos}\n%%EOF\n").as_bytes())?;
        }
        Entry::Part(p) => emit_children(nodes, &p.children, ctx)?,
        Entry::File(f) => {
            ctx.write(format!("%PDF-{}.{}\n", f.major, f.minor).as_bytes())?;
            emit_children(nodes, &f.children, ctx)?;
        }
    }
    Ok(())
}

/// Render nodes as trimmed text, for diagnostics.
pub(crate) fn render_nodes(nodes: &[Node], ids: &[NodeId]) -> String {
    let mut out = MemoryEmitter::new();
    for &id in ids {
        if emit_node(nodes, id, &mut out).is_err() {
            break;
        }
    }
    out.to_string_lossy().trim().to_string()
}

impl PdfTree {
    /// Emit the whole tree, starting at the root.
    pub fn emit<C: EmitContext + ?Sized>(&self, ctx: &mut C) -> Result<()> {
        self.emit_node(self.root(), ctx)
    }

    /// Emit one node and its subtree.
    pub fn emit_node<C: EmitContext + ?Sized>(&self, id: NodeId, ctx: &mut C) -> Result<()> {
        emit_node(self.nodes(), id, ctx)
    }

    /// Text rendering of one node, as used in error messages.
    pub fn render(&self, id: NodeId) -> String {
        render_nodes(self.nodes(), &[id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.234), "1.234");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(3.141592653), "3.14159");
        assert_eq!(format_number(-0.000001), "0");
    }
}
