//! Parse-stack builder: the semantic actions behind the grammar.
//!
//! The builder owns the node arena while parsing. Open containers live on
//! a stack of frames; every value is inserted into the frame on top
//! through one shared rule, so the nesting invariants are checked in a
//! single place. Any error leaves the arena to be dropped by the caller.

use tracing::warn;

use crate::emit::render::render_nodes;
use crate::error::{PdfError, Result};
use crate::model::{
    Array, Comment, DictConflict, DictionaryBuilder, Entry, File, IndirectObject, Name, Node, NodeId, ObjRef,
    Part, PdfString, PdfTree, Stream, Trailer,
};

/// Default limit on simultaneously open containers.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug)]
enum Frame {
    /// Open `<<`; its children are collected until `>>`
    Dictionary(DictionaryBuilder),
    Container(NodeId),
}

impl Frame {
    const fn id(&self) -> NodeId {
        match self {
            Frame::Dictionary(dict) => dict.id(),
            Frame::Container(id) => *id,
        }
    }
}

/// Where a new value goes in the container on top of the stack.
enum Slot {
    Append,
    ObjectValue,
    TrailerDict,
}

#[derive(Debug)]
pub struct Builder {
    nodes: Vec<Node>,
    stack: Vec<Frame>,
    /// Pending unsigned integers (`N G obj`, `N G R`)
    uints: Vec<u32>,
    max_depth: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Builder {
    pub fn new(max_depth: usize) -> Self {
        Self {
            nodes: Vec::new(),
            stack: Vec::new(),
            uints: Vec::new(),
            max_depth,
        }
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push_uint(&mut self, value: u32) {
        self.uints.push(value);
    }

    fn pop_uint(&mut self, pos: usize) -> Result<u32> {
        self.uints
            .pop()
            .ok_or_else(|| PdfError::structure(pos, "missing object number"))
    }

    fn alloc(&mut self, offset: Option<usize>, entry: Entry, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            entry,
            offset,
            parent,
        });
        id
    }

    fn open(&mut self, pos: usize, frame: Frame) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(PdfError::NestingTooDeep {
                pos,
                limit: self.max_depth,
            });
        }
        self.stack.push(frame);
        Ok(())
    }

    /// Append `child` to whatever container is on top of the stack.
    fn append_to_top(&mut self, child: NodeId) {
        match self.stack.last_mut() {
            Some(Frame::Dictionary(dict)) => dict.push(child),
            Some(Frame::Container(id)) => {
                if let Some(children) = children_mut(&mut self.nodes[id.index()].entry) {
                    children.push(child);
                }
            }
            None => {}
        }
    }

    fn top_entry(&self) -> Option<&Entry> {
        self.stack
            .last()
            .map(|frame| &self.nodes[frame.id().index()].entry)
    }

    /// Synthesize a Part root when content arrives before any header.
    fn ensure_root(&mut self, pos: usize) -> Result<()> {
        if self.stack.is_empty() {
            let id = self.alloc(None, Entry::Part(Part::default()), None);
            self.open(pos, Frame::Container(id))?;
        }
        Ok(())
    }

    /// Insert a new value into the top container and return its id.
    ///
    /// Dictionaries and arrays take anything; an object takes one direct
    /// value; a trailer takes one dictionary.
    fn insert_value(&mut self, pos: usize, entry: Entry) -> Result<NodeId> {
        let is_dict = matches!(entry, Entry::Dictionary(_));
        let without_container = || {
            let msg = if matches!(entry, Entry::Array(_)) {
                "array without container"
            } else {
                "value without container"
            };
            PdfError::structure(pos, msg)
        };

        let Some(frame) = self.stack.last() else {
            return Err(without_container());
        };
        let parent = frame.id();
        let slot = match (frame, &self.nodes[parent.index()].entry) {
            (Frame::Dictionary(_), _) | (_, Entry::Array(_)) => Slot::Append,
            (_, Entry::Object(obj)) => {
                if obj.value.is_some() {
                    return Err(PdfError::structure(pos, "second value for object"));
                }
                Slot::ObjectValue
            }
            (_, Entry::Trailer(trailer)) if is_dict => {
                if trailer.dict.is_some() {
                    return Err(PdfError::structure(pos, "second dictionary for trailer"));
                }
                Slot::TrailerDict
            }
            _ => return Err(without_container()),
        };

        let id = self.alloc(Some(pos), entry, Some(parent));
        match slot {
            Slot::Append => {}
            Slot::ObjectValue => {
                if let Entry::Object(obj) = &mut self.nodes[parent.index()].entry {
                    obj.value = Some(id);
                }
            }
            Slot::TrailerDict => {
                if let Entry::Trailer(trailer) = &mut self.nodes[parent.index()].entry {
                    trailer.dict = Some(id);
                }
            }
        }
        self.append_to_top(id);
        Ok(id)
    }

    /// `%PDF-major.minor`; only valid before anything else was opened.
    pub fn have_file(&mut self, pos: usize, major: u32, minor: u32) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(PdfError::structure(
                pos,
                "found file header in unusual place",
            ));
        }
        let file = File {
            major,
            minor,
            children: Vec::new(),
        };
        let id = self.alloc(Some(pos), Entry::File(file), None);
        self.open(pos, Frame::Container(id))
    }

    /// Open a top-level container (object or trailer) in the File or Part root.
    fn begin_top_level(&mut self, pos: usize, entry: Entry, what: &str) -> Result<()> {
        self.ensure_root(pos)?;
        if !matches!(self.top_entry(), Some(Entry::File(_) | Entry::Part(_))) {
            return Err(PdfError::structure(pos, format!("{what} in wrong place")));
        }
        let parent = self.stack.last().map(Frame::id);
        let id = self.alloc(Some(pos), entry, parent);
        self.append_to_top(id);
        self.open(pos, Frame::Container(id))
    }

    /// `N G obj`; number and generation come from the uint stack.
    pub fn begin_object(&mut self, pos: usize) -> Result<()> {
        let generation = self.pop_uint(pos)?;
        let number = self.pop_uint(pos)?;
        let obj = IndirectObject::new(number, generation);
        self.begin_top_level(pos, Entry::Object(obj), "object")
    }

    pub fn end_object(&mut self, pos: usize) -> Result<()> {
        self.close_container(pos, "object", |e| matches!(e, Entry::Object(_)))
    }

    pub fn begin_trailer(&mut self, pos: usize) -> Result<()> {
        self.begin_top_level(pos, Entry::Trailer(Trailer::default()), "trailer")
    }

    pub fn end_trailer(&mut self, pos: usize, start_xref: Option<u64>) -> Result<()> {
        if let Some(Frame::Container(id)) = self.stack.last()
            && let Entry::Trailer(trailer) = &mut self.nodes[id.index()].entry
        {
            trailer.start_xref = start_xref;
        }
        self.close_container(pos, "trailer", |e| matches!(e, Entry::Trailer(_)))
    }

    pub fn begin_array(&mut self, pos: usize) -> Result<()> {
        let id = self.insert_value(pos, Entry::Array(Array::default()))?;
        self.open(pos, Frame::Container(id))
    }

    pub fn end_array(&mut self, pos: usize) -> Result<()> {
        self.close_container(pos, "array", |e| matches!(e, Entry::Array(_)))
    }

    pub fn begin_dict(&mut self, pos: usize) -> Result<()> {
        let id = self.insert_value(pos, Entry::Dictionary(Default::default()))?;
        self.open(pos, Frame::Dictionary(DictionaryBuilder::new(id)))
    }

    /// `>>`: close the dictionary and build its key map.
    pub fn end_dict(&mut self, pos: usize) -> Result<()> {
        let builder = match self.stack.pop() {
            Some(Frame::Dictionary(builder)) => builder,
            Some(other) => {
                self.stack.push(other);
                return Err(PdfError::structure(pos, "spurious dictionary end"));
            }
            None => return Err(PdfError::structure(pos, "dictionary end without begin")),
        };
        let id = builder.id();
        match builder.finish(&self.nodes) {
            Ok(dict) => {
                self.nodes[id.index()].entry = Entry::Dictionary(dict);
                Ok(())
            }
            Err(conflict) => Err(self.dictionary_error(pos, conflict)),
        }
    }

    fn close_container(
        &mut self,
        pos: usize,
        what: &str,
        expected: impl Fn(&Entry) -> bool,
    ) -> Result<()> {
        match self.top_entry().map(expected) {
            Some(true) => {
                self.stack.pop();
                Ok(())
            }
            Some(false) => Err(PdfError::structure(pos, format!("spurious {what} end"))),
            None => Err(PdfError::structure(pos, format!("{what} end without begin"))),
        }
    }

    pub fn push_name(&mut self, pos: usize, raw: &[u8]) -> Result<()> {
        self.insert_value(pos, Entry::Name(Name::new(raw))).map(drop)
    }

    pub fn push_number(&mut self, pos: usize, value: f64) -> Result<()> {
        self.insert_value(pos, Entry::Number(value)).map(drop)
    }

    pub fn push_string(&mut self, pos: usize, raw: &[u8]) -> Result<()> {
        self.insert_value(pos, Entry::String(PdfString::new(raw)))
            .map(drop)
    }

    pub fn push_bool(&mut self, pos: usize, value: bool) -> Result<()> {
        self.insert_value(pos, Entry::Boolean(value)).map(drop)
    }

    pub fn push_null(&mut self, pos: usize) -> Result<()> {
        self.insert_value(pos, Entry::Null).map(drop)
    }

    /// `N G R`; number and generation come from the uint stack.
    pub fn push_object_ref(&mut self, pos: usize) -> Result<()> {
        let generation = self.pop_uint(pos)?;
        let number = self.pop_uint(pos)?;
        self.insert_value(
            pos,
            Entry::ObjectReference(ObjRef::new(number, generation)),
        )
        .map(drop)
    }

    /// Comments go into whatever container is open, never into a value slot.
    pub fn push_comment(&mut self, pos: usize, text: &[u8]) -> Result<()> {
        self.ensure_root(pos)?;
        let parent = self.stack.last().map(Frame::id);
        let comment = Comment {
            text: text.to_vec(),
        };
        let id = self.alloc(Some(pos), Entry::Comment(comment), parent);
        self.append_to_top(id);
        Ok(())
    }

    /// Attach the body `[begin, end)` to the object on top of the stack.
    pub fn emit_stream(&mut self, pos: usize, begin: usize, end: usize) -> Result<()> {
        let Some(Entry::Object(obj)) = self.top_entry() else {
            return Err(PdfError::structure(pos, "stream without object"));
        };
        if obj.stream.is_some() {
            return Err(PdfError::structure(pos, "multiple streams in object"));
        }
        let Some(dict) = obj.value else {
            return Err(PdfError::structure(pos, "stream without object"));
        };
        if !matches!(self.nodes[dict.index()].entry, Entry::Dictionary(_)) {
            return Err(PdfError::structure(pos, "stream without dictionary"));
        }

        let parent = self.stack.last().map(Frame::id);
        let stream = Stream { begin, end, dict };
        let id = self.alloc(Some(pos), Entry::Stream(stream), parent);
        if let Some(parent) = parent
            && let Entry::Object(obj) = &mut self.nodes[parent.index()].entry
        {
            obj.stream = Some(id);
        }
        self.append_to_top(id);
        Ok(())
    }

    /// Drain the stack and hand over the tree.
    ///
    /// Only File, Part and Trailer frames may still be open; a dictionary,
    /// array or object left open is an error at its start offset. If several
    /// roots are left, every one but the bottom entry is reported and dropped
    /// from the result.
    pub fn finish(mut self) -> Result<PdfTree> {
        let mut root: Option<NodeId> = None;
        while let Some(frame) = self.stack.pop() {
            let id = match frame {
                Frame::Dictionary(builder) => {
                    let id = builder.id();
                    let pos = self.nodes[id.index()].offset.unwrap_or(0);
                    if let Err(conflict) = builder.finish(&self.nodes) {
                        return Err(self.dictionary_error(pos, conflict));
                    }
                    return Err(PdfError::structure(pos, "dictionary without end"));
                }
                Frame::Container(id) => id,
            };
            let node = &self.nodes[id.index()];
            if !matches!(node.entry, Entry::File(_) | Entry::Part(_) | Entry::Trailer(_)) {
                return Err(PdfError::structure(
                    node.offset.unwrap_or(0),
                    format!("{} without end", node.entry.kind().name()),
                ));
            }
            if let Some(previous) = root.replace(id) {
                warn!(
                    kind = self.nodes[previous.index()].entry.kind().name(),
                    offset = ?self.nodes[previous.index()].offset,
                    "multiple roots left after parsing, discarding one"
                );
            }
        }
        let root = root.ok_or(PdfError::Empty)?;
        self.nodes[root.index()].parent = None;
        Ok(PdfTree::new(self.nodes, root))
    }

    fn dictionary_error(&self, pos: usize, conflict: DictConflict) -> PdfError {
        let mut shown = vec![conflict.element];
        shown.extend(conflict.value);
        PdfError::DictionaryError {
            pos,
            msg: conflict.reason.message().to_string(),
            element: render_nodes(&self.nodes, &shown),
        }
    }
}

fn children_mut(entry: &mut Entry) -> Option<&mut Vec<NodeId>> {
    match entry {
        Entry::Array(a) => Some(&mut a.children),
        Entry::Object(o) => Some(&mut o.children),
        Entry::Trailer(t) => Some(&mut t.children),
        Entry::Part(p) => Some(&mut p.children),
        Entry::File(f) => Some(&mut f.children),
        _ => None,
    }
}
