//! Semantic analysis and symbol model construction for Lua.
//!
//! Given a parse tree for a single document, the analyzer produces a module
//! symbol: a hierarchical map of declarations, their inferred (possibly
//! deferred) types, their lexical scopes, and the cross-document dependencies
//! the file introduces. Language-service hosts answer hover, completion, and
//! go-to-definition queries from that model.
//!
//! # Usage
//!
//! ```ignore
//! use lua_semantic_analyzer::Analyzer;
//!
//! // `tree` is the chunk produced by the collaborating parser.
//! let module = Analyzer::new().analyze(&tree, "file:///project/socket.lua");
//! for child in &module.read().children {
//!     println!("{}", child.read().name);
//! }
//! ```
//!
//! Analyses through [`Analyzer::new`] share the process-wide global
//! environment: globals assigned by one document resolve from any other, and
//! `module(...)`-mode documents register themselves under their module name.
//! Hosts that need isolation construct their own
//! [`GlobalEnvironment`](analysis::global::GlobalEnvironment).

#![deny(unsafe_code)]
#![deny(unreachable_pub)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Analysis pipeline modules.
pub mod analysis;

pub use analysis::analyzer::Analyzer;
pub use analysis::global::GlobalEnvironment;
pub use analysis::query::{NullQuery, TypeQuery};
pub use analysis::scope::ScopeStack;
pub use analysis::symbol::{
    FunctionType, LazyType, LuaType, ModuleType, Symbol, SymbolInfo, SymbolKind, SymbolRef,
    TableType, ValidityFlag,
};
