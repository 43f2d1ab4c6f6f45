//! Unified Lua symbol taxonomy for language-service tooling.
//!
//! This crate provides a single, authoritative definition of Lua symbol kinds
//! used across the analyzer, the global environment, and LSP providers.
//!
//! # Design Goals
//!
//! - **Single source of truth**: All symbol classification flows through this crate
//! - **Lua semantics**: Distinguishes tables that act as classes from plain tables
//! - **LSP compatibility**: Direct mapping to LSP protocol symbol kinds
//! - **Zero-cost abstractions**: Enum variants are `Copy` types with inline methods

use serde::{Deserialize, Serialize};

/// Unified Lua symbol classification for language-service tooling.
///
/// This enum represents all meaningful declaration shapes the analyzer emits,
/// designed to be the canonical taxonomy across the analysis crates.
///
/// # LSP Protocol Mapping
///
/// Each variant maps to an LSP `SymbolKind` number via [`Self::to_lsp_kind()`]:
///
/// | Variant | LSP Kind | Number | Description |
/// |---------|----------|--------|-------------|
/// | `Module` | Module | 2 | A required or `module(...)`-declared module |
/// | `Class` | Class | 5 | A table that receives method definitions |
/// | `Table` | Object | 19 | A plain table constructor |
/// | `Function` | Function | 12 | Function declaration |
/// | `Parameter` | Variable | 13 | Formal parameter (including implicit `self`) |
/// | `Variable` | Variable | 13 | Local or global variable |
/// | `Property` | Property | 7 | String-keyed table field |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Module symbol: the per-document root, a `require`d import, or a
    /// `module(...)` declaration
    Module,
    /// Table upgraded to a class by a method definition
    Class,
    /// Plain table constructor
    Table,
    /// Function declaration (named, anonymous, or method)
    Function,
    /// Formal parameter, including the synthesized `self` of method syntax
    Parameter,
    /// Local or global variable
    Variable,
    /// String-keyed field of a table
    Property,
}

impl SymbolKind {
    /// Convert to LSP-compliant symbol kind number.
    ///
    /// Maps Lua symbol types to the closest LSP protocol equivalents.
    /// See the enum documentation for the full mapping table.
    #[inline]
    pub const fn to_lsp_kind(self) -> u32 {
        match self {
            SymbolKind::Module => 2,     // Module
            SymbolKind::Class => 5,      // Class
            SymbolKind::Table => 19,     // Object
            SymbolKind::Function => 12,  // Function
            SymbolKind::Parameter => 13, // Variable
            SymbolKind::Variable => 13,  // Variable
            SymbolKind::Property => 7,   // Property
        }
    }

    /// Returns true if this kind names a value that other symbols can live in.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, SymbolKind::Module | SymbolKind::Class | SymbolKind::Table)
    }

    /// Returns true if this is a callable kind.
    #[inline]
    pub const fn is_callable(self) -> bool {
        matches!(self, SymbolKind::Function)
    }

    /// Returns true if this kind binds a name inside a function or block scope.
    #[inline]
    pub const fn is_binding(self) -> bool {
        matches!(self, SymbolKind::Parameter | SymbolKind::Variable)
    }
}
