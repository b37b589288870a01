//! Tokenizer, node model, parser and canonicalizer for Paradox-style
//! declarative script (spec §3, §4.1–§4.3).

pub mod canon;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod token;

pub use node::{AttachedComments, Node, Op, Value};
pub use parser::parse_source;
pub use token::{Token, TokenKind};
