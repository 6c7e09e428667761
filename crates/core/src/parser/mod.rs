//! PDF file-structure parsing.
//!
//! - `lexer` - tokenizer over a byte cursor
//! - `grammar` - recursive-descent productions
//! - `builder` - parse-stack semantic actions that fill the node arena

pub mod builder;
pub mod grammar;
pub mod lexer;

pub use builder::{Builder, DEFAULT_MAX_DEPTH};
pub use grammar::Grammar;
pub use lexer::{Keyword, Lexer, Token, decode_name, decode_string};
