//! Lexer and error-tolerant recursive descent parser for Spargel source code.
//!
//! This crate turns a [`SourceBuffer`] into a lossless concrete syntax tree:
//! every byte of input, whitespace and comments included, is owned by exactly
//! one token in the tree. Malformed input never aborts the parse; it shows up
//! as missing token slots, `Unexpected` nodes and diagnostics.

pub mod cst;
pub mod dump;
pub mod lexer;
pub mod parser;
pub mod token;

use spargel_source::SourceBuffer;

pub use cst::{SourceFile, SyntaxElement, SyntaxNode, SyntaxNodeKind};
pub use dump::dump_tree;
pub use lexer::{LexOptions, lex, lex_with_options};
pub use parser::{Parse, parse};
pub use token::{KeywordKind, SyntaxToken, Token, TokenKind, reconstruct_source};

/// Lex and parse a buffer in one step.
pub fn parse_source(buffer: &SourceBuffer) -> Parse {
    parse(lex(buffer), buffer.bytes())
}
