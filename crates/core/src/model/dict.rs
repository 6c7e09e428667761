//! Two-phase dictionary construction.
//!
//! While `<< ... >>` is open its children are collected by an append-only
//! [`DictionaryBuilder`]. Closing the dictionary consumes the builder and
//! produces an immutable [`Dictionary`] whose key map is complete, or the
//! first child that breaks the key/value pairing.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::entry::{Entry, Node, NodeId};

/// Closed dictionary: children in source order plus a key → value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    children: Vec<NodeId>,
    map: IndexMap<SmolStr, NodeId>,
}

impl Dictionary {
    /// Keys, values and comments in source order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Value node stored under `key` (raw name text, without the slash).
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.map.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Keys in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(SmolStr::as_str)
    }

    /// Key/value pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.map.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The key was already present
    DuplicateKey,
    /// A non-name appeared where a key was expected
    NotAName,
    /// The last key has no value
    MissingValue,
}

impl ConflictReason {
    pub const fn message(self) -> &'static str {
        match self {
            Self::DuplicateKey => "duplicate key in dictionary",
            Self::NotAName => "non-name key in dictionary",
            Self::MissingValue => "key without value in dictionary",
        }
    }
}

/// First child that prevented the key map from being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictConflict {
    pub reason: ConflictReason,
    /// The offending element (for duplicates, the repeated key)
    pub element: NodeId,
    /// The value following a duplicate key
    pub value: Option<NodeId>,
}

/// Append-only collector for an open dictionary.
#[derive(Debug, Clone)]
pub struct DictionaryBuilder {
    id: NodeId,
    children: Vec<NodeId>,
}

impl DictionaryBuilder {
    pub const fn new(id: NodeId) -> Self {
        Self {
            id,
            children: Vec::new(),
        }
    }

    /// Arena slot of the dictionary being built.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub fn push(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Build the key map in one pass over the collected children.
    ///
    /// Comments are skipped. Nothing is overwritten: the first duplicate,
    /// misplaced or dangling key is reported instead.
    pub fn finish(self, nodes: &[Node]) -> Result<Dictionary, DictConflict> {
        let mut map = IndexMap::with_capacity(self.children.len() / 2);
        let mut pending: Option<(NodeId, SmolStr)> = None;

        for &child in &self.children {
            let entry = &nodes[child.index()].entry;
            if matches!(entry, Entry::Comment(_)) {
                continue;
            }
            match pending.take() {
                Some((key_id, key)) => {
                    if map.contains_key(&key) {
                        return Err(DictConflict {
                            reason: ConflictReason::DuplicateKey,
                            element: key_id,
                            value: Some(child),
                        });
                    }
                    map.insert(key, child);
                }
                None => match entry {
                    Entry::Name(name) => pending = Some((child, name.key())),
                    _ => {
                        return Err(DictConflict {
                            reason: ConflictReason::NotAName,
                            element: child,
                            value: None,
                        });
                    }
                },
            }
        }

        if let Some((key_id, _)) = pending {
            return Err(DictConflict {
                reason: ConflictReason::MissingValue,
                element: key_id,
                value: None,
            });
        }

        Ok(Dictionary {
            children: self.children,
            map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::{Comment, Name};

    fn node(entry: Entry) -> Node {
        Node {
            entry,
            offset: None,
            parent: None,
        }
    }

    fn build(entries: Vec<Entry>) -> Result<Dictionary, DictConflict> {
        let nodes: Vec<Node> = entries.into_iter().map(node).collect();
        let mut builder = DictionaryBuilder::new(NodeId::new(usize::MAX));
        for i in 0..nodes.len() {
            builder.push(NodeId::new(i));
        }
        builder.finish(&nodes)
    }

    fn name(s: &str) -> Entry {
        Entry::Name(Name::new(s.as_bytes()))
    }

    #[test]
    fn test_map_in_source_order() {
        let dict = build(vec![
            name("Type"),
            name("Page"),
            Entry::Comment(Comment {
                text: b"%note".to_vec(),
            }),
            name("Count"),
            Entry::Number(5.0),
        ])
        .unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["Type", "Count"]);
        assert_eq!(dict.get("Count"), Some(NodeId::new(4)));
        assert_eq!(dict.children().len(), 5);
        assert!(dict.get("Missing").is_none());
    }

    #[test]
    fn test_duplicate_key_reports_second_occurrence() {
        let conflict = build(vec![
            name("A"),
            Entry::Number(1.0),
            name("A"),
            Entry::Number(2.0),
        ])
        .unwrap_err();
        assert_eq!(conflict.reason, ConflictReason::DuplicateKey);
        assert_eq!(conflict.element, NodeId::new(2));
        assert_eq!(conflict.value, Some(NodeId::new(3)));
    }

    #[test]
    fn test_non_name_key() {
        let conflict = build(vec![Entry::Number(1.0), name("A")]).unwrap_err();
        assert_eq!(conflict.reason, ConflictReason::NotAName);
        assert_eq!(conflict.element, NodeId::new(0));
    }

    #[test]
    fn test_dangling_key() {
        let conflict = build(vec![name("A"), Entry::Null, name("B")]).unwrap_err();
        assert_eq!(conflict.reason, ConflictReason::MissingValue);
        assert_eq!(conflict.element, NodeId::new(2));
    }

    #[test]
    fn test_empty_dictionary() {
        let dict = build(Vec::new()).unwrap();
        assert!(dict.is_empty());
    }
}
