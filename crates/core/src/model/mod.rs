//! PDF parse-tree model.
//!
//! - `entry` - node kinds (`Entry`, `Kind`) and their payloads
//! - `dict` - two-phase dictionary construction
//! - `tree` - the arena-backed `PdfTree`

pub mod dict;
pub mod entry;
pub mod tree;

pub use dict::{ConflictReason, DictConflict, Dictionary, DictionaryBuilder};
pub use entry::{
    Array, Comment, Entry, File, IndirectObject, Kind, Name, Node, NodeId, ObjRef, Part, PdfString,
    Stream, Trailer,
};
pub use tree::{PdfTree, Walk};
