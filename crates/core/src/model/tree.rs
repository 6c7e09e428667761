//! The parsed tree: node arena, root, and object index.

use std::collections::HashMap;

use super::entry::{Entry, Kind, Node, NodeId, ObjRef};

/// Reference chains longer than this are treated as cycles.
const MAX_REFERENCE_HOPS: usize = 32;

/// Parse result: an arena of nodes rooted at a File (or Part).
///
/// Owns no source bytes; stream bodies are addressed by offsets into the
/// input the tree was parsed from.
#[derive(Debug, Clone)]
pub struct PdfTree {
    nodes: Vec<Node>,
    root: NodeId,
    objects: HashMap<ObjRef, NodeId>,
}

impl PdfTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId) -> Self {
        let mut objects = HashMap::new();
        for (index, node) in nodes.iter().enumerate() {
            if let Entry::Object(obj) = &node.entry {
                // Later revisions of an incrementally updated file win
                objects.insert(obj.reference(), NodeId::new(index));
            }
        }
        Self {
            nodes,
            root,
            objects,
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn entry(&self, id: NodeId) -> &Entry {
        &self.node(id).entry
    }

    pub fn kind(&self, id: NodeId) -> Kind {
        self.entry(id).kind()
    }

    pub fn offset(&self, id: NodeId) -> Option<usize> {
        self.node(id).offset
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).children()
    }

    /// `(major, minor)` from the file header, if there was one.
    pub fn version(&self) -> Option<(u32, u32)> {
        match self.entry(self.root) {
            Entry::File(f) => Some((f.major, f.minor)),
            _ => None,
        }
    }

    /// Depth-first, source-order traversal starting at the root.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Indirect objects in source order.
    pub fn objects(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk().filter(|&id| self.kind(id) == Kind::Object)
    }

    /// Trailers in source order.
    pub fn trailers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk().filter(|&id| self.kind(id) == Kind::Trailer)
    }

    /// Object node for `number generation obj`; the last definition wins.
    pub fn find_object(&self, number: u32, generation: u32) -> Option<NodeId> {
        self.objects
            .get(&ObjRef::new(number, generation))
            .copied()
    }

    /// Follow references until a non-reference value is reached.
    ///
    /// Objects resolve to their direct value. Unknown references and
    /// reference cycles resolve to `None`.
    pub fn resolve(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        for _ in 0..MAX_REFERENCE_HOPS {
            match self.entry(current) {
                Entry::ObjectReference(r) => {
                    let obj = self.find_object(r.number, r.generation)?;
                    current = obj;
                }
                Entry::Object(obj) => current = obj.value?,
                _ => return Some(current),
            }
        }
        None
    }

    /// Value stored under `key` in the dictionary `dict`, references followed.
    pub fn dict_get(&self, dict: NodeId, key: &str) -> Option<NodeId> {
        let dict = self.resolve(dict)?;
        let value = self.entry(dict).as_dict().ok()?.get(key)?;
        self.resolve(value)
    }

    /// Dictionary of the last trailer that has one.
    pub fn trailer_dict(&self) -> Option<NodeId> {
        self.trailers()
            .filter_map(|id| self.entry(id).as_trailer().ok()?.dict)
            .last()
    }

    /// Whether any trailer names an `/Encrypt` dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.trailers().any(|id| {
            self.entry(id)
                .as_trailer()
                .ok()
                .and_then(|t| t.dict)
                .and_then(|d| self.entry(d).as_dict().ok())
                .is_some_and(|d| d.contains_key("Encrypt"))
        })
    }

    /// Declared `/Length` of the stream owned by `object`.
    pub fn stream_length(&self, object: NodeId) -> Option<usize> {
        let stream = self.entry(object).as_object().ok()?.stream?;
        let dict = self.entry(stream).as_stream().ok()?.dict;
        let length = self.dict_get(dict, "Length")?;
        let value = self.entry(length).as_number().ok()?;
        (value >= 0.0).then_some(value as usize)
    }

    /// Encoded body bytes of the stream owned by `object`.
    ///
    /// `source` must be the input the tree was parsed from. A `/Length`
    /// shorter than the captured body trims it; a longer one is ignored.
    pub fn stream_body<'s>(&self, source: &'s [u8], object: NodeId) -> Option<&'s [u8]> {
        let stream_id = self.entry(object).as_object().ok()?.stream?;
        let stream = self.entry(stream_id).as_stream().ok()?;
        let body = source.get(stream.begin..stream.end)?;
        match self.stream_length(object) {
            Some(len) if len < body.len() => Some(&body[..len]),
            _ => Some(body),
        }
    }
}

/// Pre-order iterator over a [`PdfTree`].
pub struct Walk<'t> {
    tree: &'t PdfTree,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
