//! Lua AST Library
//!
//! Provides the Abstract Syntax Tree definitions consumed by the semantic
//! analyzer. The tree is produced by a collaborating parser with byte-offset
//! ranges enabled.

pub mod ast;

pub use ast::{Indexer, Node, NodeKind};
pub use lua_position_tracking::ByteSpan;
