//! Symbol model for Lua semantic analysis.
//!
//! This module defines the entity set the analyzer produces: [`Symbol`] and
//! the type variants behind [`LuaType`]. The symbol graph is cyclic by nature
//! (a table owns its method, the method's `self` references the table), so
//! tables, functions, and modules are held through shared handles; cloning a
//! [`LuaType`] clones a handle, not the structure behind it.
//!
//! Consumers on the host side read symbols through the same handles the
//! analyzer wrote, which keeps deferred type references valid after analysis
//! completes.

use lua_ast::Node;
use lua_position_tracking::ByteSpan;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Re-export the unified symbol taxonomy.
pub use lua_symbol_types::SymbolKind;

use crate::analysis::scope::ScopeStack;

/// Shared handle to a [`Symbol`].
pub type SymbolRef = Arc<RwLock<Symbol>>;
/// Shared handle to a [`TableType`].
pub type TableRef = Arc<RwLock<TableType>>;
/// Shared handle to a [`FunctionType`].
pub type FunctionRef = Arc<RwLock<FunctionType>>;
/// Shared handle to a [`ModuleType`].
pub type ModuleRef = Arc<RwLock<ModuleType>>;

/// The virtual span of the global environment: everything is inside it.
pub const GLOBAL_SPAN: ByteSpan = ByteSpan { start: 0, end: usize::MAX };

/// Shared validity flag for one analysis pass.
///
/// Every symbol minted by a pass holds the same flag; re-analyzing the
/// document flips it once and every stale symbol reads as invalid, wherever
/// it ended up (scope stack, module fields, `_G`).
#[derive(Clone)]
pub struct ValidityFlag(Arc<AtomicBool>);

impl ValidityFlag {
    /// Create a flag with the given initial validity.
    pub fn new(valid: bool) -> Self {
        ValidityFlag(Arc::new(AtomicBool::new(valid)))
    }

    /// Whether symbols of this pass are still current.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the whole pass stale.
    #[inline]
    pub fn invalidate(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for ValidityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for ValidityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidityFlag({})", self.is_valid())
    }
}

/// A named declaration with its location, visibility, and inferred type.
pub struct Symbol {
    /// Identifier text
    pub name: String,
    /// Span of the defining identifier token
    pub location: ByteSpan,
    /// Span of the definition expression (function body span for functions)
    pub range: ByteSpan,
    /// Span over which the symbol is name-resolvable
    pub scope: ByteSpan,
    /// Declared with `local`
    pub is_local: bool,
    /// Owning document identifier
    pub uri: Arc<str>,
    /// Classification of the declaration
    pub kind: SymbolKind,
    /// Inferred (possibly deferred) type
    pub ty: LuaType,
    /// Validity flag shared by all symbols of the same pass
    pub state: ValidityFlag,
    /// Child symbols in source order, for outline construction
    pub children: Vec<SymbolRef>,
}

impl Symbol {
    /// Wrap this symbol in a shared handle.
    pub fn into_ref(self) -> SymbolRef {
        Arc::new(RwLock::new(self))
    }

    /// Whether this symbol's pass is still current.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    /// Serializable snapshot of this symbol and its children.
    ///
    /// Cycles through types are not followed; the snapshot is the outline
    /// tree, not the type graph.
    pub fn snapshot(&self) -> SymbolInfo {
        SymbolInfo {
            name: self.name.clone(),
            kind: self.kind,
            type_name: self.ty.type_name(),
            location: self.location,
            range: self.range,
            scope: self.scope,
            is_local: self.is_local,
            children: self.children.iter().map(|c| c.read().snapshot()).collect(),
        }
    }
}

// Hand-written: the type graph is cyclic, a derived Debug would recurse.
impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type", &self.ty.type_name())
            .field("location", &self.location)
            .field("range", &self.range)
            .field("scope", &self.scope)
            .field("is_local", &self.is_local)
            .field("valid", &self.state.is_valid())
            .finish()
    }
}

/// Serializable outline node produced by [`Symbol::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct SymbolInfo {
    /// Symbol name
    pub name: String,
    /// Symbol classification
    pub kind: SymbolKind,
    /// Name of the symbol's type variant
    pub type_name: &'static str,
    /// Span of the defining identifier
    pub location: ByteSpan,
    /// Span of the definition expression
    pub range: ByteSpan,
    /// Visibility span
    pub scope: ByteSpan,
    /// Declared with `local`
    pub is_local: bool,
    /// Child outline nodes
    pub children: Vec<SymbolInfo>,
}

/// The type of a Lua value as the analyzer sees it.
///
/// Basic tags are carried inline; structured types are shared handles so that
/// later definitions (a method added to a table, a return slot filled in)
/// are observed by every symbol already pointing at the structure.
#[derive(Clone)]
pub enum LuaType {
    /// Unknown
    Any,
    /// Number
    Number,
    /// String
    String,
    /// Boolean
    Boolean,
    /// Nil
    Nil,
    /// Table with known string-keyed fields
    Table(TableRef),
    /// Function with parameter and return slots
    Function(FunctionRef),
    /// Module (a table plus a module environment)
    Module(ModuleRef),
    /// Deferred reference, resolved on demand by the type-query engine
    Lazy(Arc<LazyType>),
}

impl LuaType {
    /// The variant's name, for debugging and outline snapshots.
    pub fn type_name(&self) -> &'static str {
        match self {
            LuaType::Any => "any",
            LuaType::Number => "number",
            LuaType::String => "string",
            LuaType::Boolean => "boolean",
            LuaType::Nil => "nil",
            LuaType::Table(_) => "table",
            LuaType::Function(_) => "function",
            LuaType::Module(_) => "module",
            LuaType::Lazy(_) => "lazy",
        }
    }

    /// True for the unknown type.
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, LuaType::Any)
    }

    /// The field-holding handle behind this type, if it has one.
    ///
    /// Modules expose their underlying table, so field operations treat
    /// tables and modules uniformly.
    pub fn table_handle(&self) -> Option<TableRef> {
        match self {
            LuaType::Table(t) => Some(t.clone()),
            LuaType::Module(m) => Some(m.read().table.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for LuaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaType::Lazy(lazy) => write!(f, "lazy({}#{})", lazy.name, lazy.index),
            other => f.write_str(other.type_name()),
        }
    }
}

/// A table: insertion-ordered string-keyed fields plus an optional metatable.
#[derive(Default)]
pub struct TableType {
    fields: FxHashMap<String, SymbolRef>,
    order: Vec<String>,
    /// Attached metatable symbol, if any; its type is itself a table
    pub metatable: Option<SymbolRef>,
}

impl TableType {
    /// Create an empty table type behind a shared handle.
    pub fn new_ref() -> TableRef {
        Arc::new(RwLock::new(TableType::default()))
    }

    /// Insert or overwrite a field. Overwriting keeps the insertion order of
    /// the first definition, so assignment-extended tables iterate stably.
    pub fn set(&mut self, name: &str, symbol: SymbolRef) {
        if self.fields.insert(name.to_string(), symbol).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<SymbolRef> {
        self.fields.get(name).cloned()
    }

    /// Whether a field of this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Attach a metatable symbol; repeated calls replace.
    pub fn set_metatable(&mut self, symbol: SymbolRef) {
        self.metatable = Some(symbol);
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SymbolRef)> {
        self.order.iter().filter_map(|k| self.fields.get(k).map(|v| (k.as_str(), v)))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the table has no fields.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableType {{ fields: {:?}, metatable: {} }}", self.order, self.metatable.is_some())
    }
}

/// A function: positional parameter and return slots plus an optional
/// tail-call type.
#[derive(Default)]
pub struct FunctionType {
    params: Vec<Option<SymbolRef>>,
    returns: Vec<Option<SymbolRef>>,
    /// Type of the tail-position call in a return statement, when present.
    /// Carrying the whole call type keeps multi-return chaining transparent.
    pub tail_call: Option<LuaType>,
}

impl FunctionType {
    /// Create an empty function type behind a shared handle.
    pub fn new_ref() -> FunctionRef {
        Arc::new(RwLock::new(FunctionType::default()))
    }

    /// Set parameter slot `index`, growing the slot vector as needed.
    pub fn set_param(&mut self, index: usize, symbol: SymbolRef) {
        if self.params.len() <= index {
            self.params.resize(index + 1, None);
        }
        self.params[index] = Some(symbol);
    }

    /// The symbol in parameter slot `index`, if set.
    pub fn param(&self, index: usize) -> Option<SymbolRef> {
        self.params.get(index).and_then(Clone::clone)
    }

    /// Number of parameter slots.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Set return slot `index`, growing the slot vector as needed.
    pub fn set_ret(&mut self, index: usize, symbol: SymbolRef) {
        if self.returns.len() <= index {
            self.returns.resize(index + 1, None);
        }
        self.returns[index] = Some(symbol);
    }

    /// The symbol in return slot `index`, if set.
    pub fn ret(&self, index: usize) -> Option<SymbolRef> {
        self.returns.get(index).and_then(Clone::clone)
    }

    /// Number of return slots.
    pub fn ret_count(&self) -> usize {
        self.returns.len()
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionType {{ params: {}, returns: {}, tail_call: {} }}",
            self.params.len(),
            self.returns.len(),
            self.tail_call.is_some()
        )
    }
}

/// The module environment: the document's scope stack and the names the
/// document assigned into the global namespace.
#[derive(Debug, Default)]
pub struct ModuleEnv {
    /// Full (never-popped) scope stack of the analysis pass
    pub stack: ScopeStack,
    /// Globals this document introduced, by name
    pub globals: FxHashMap<String, SymbolRef>,
}

/// A module: a table extended with a module environment, imports, and a
/// return slot.
pub struct ModuleType {
    /// Module name (from the URI, or from a `module(...)` call)
    pub name: String,
    /// Owning document identifier
    pub uri: Arc<str>,
    /// The module's field table (shared with field operations)
    pub table: TableRef,
    /// The module environment populated during analysis
    pub menv: ModuleEnv,
    /// True once a top-level `module(...)` call was seen
    pub module_mode: bool,
    /// The top-level return symbol, if the chunk returns
    pub ret: Option<SymbolRef>,
    /// Deferred symbols standing for `require`d modules, in source order
    pub imports: Vec<SymbolRef>,
}

impl ModuleType {
    /// Create a module type behind a shared handle.
    pub fn new_ref(name: &str, uri: &Arc<str>) -> ModuleRef {
        Arc::new(RwLock::new(ModuleType {
            name: name.to_string(),
            uri: uri.clone(),
            table: TableType::new_ref(),
            menv: ModuleEnv::default(),
            module_mode: false,
            ret: None,
            imports: Vec::new(),
        }))
    }

    /// Append an import symbol.
    pub fn import(&mut self, symbol: SymbolRef) {
        self.imports.push(symbol);
    }

    /// Resolve a name as seen from `position` in this module's document.
    ///
    /// Walks the scope stack (position-filtered), then the module's own
    /// fields, then follows the metatable `__index` chain, which for
    /// documents analyzed against the shared global metatable ends in `_G`.
    pub fn search(&self, name: &str, position: usize) -> Option<SymbolRef> {
        if let Some(found) = self.menv.stack.search_visible(name, position) {
            return Some(found);
        }
        if let Some(found) = self.table.read().get(name) {
            return Some(found);
        }

        // __index fallthrough, depth-limited since metatables may cycle.
        let mut meta = self.table.read().metatable.clone();
        for _ in 0..8 {
            let Some(meta_sym) = meta else { break };
            let meta_ty = meta_sym.read().ty.clone();
            let Some(meta_table) = meta_ty.table_handle() else { break };
            let Some(index_sym) = meta_table.read().get("__index") else { break };
            let index_ty = index_sym.read().ty.clone();
            let Some(indexed) = index_ty.table_handle() else { break };
            if let Some(found) = indexed.read().get(name) {
                return Some(found);
            }
            meta = indexed.read().metatable.clone();
        }
        None
    }
}

impl fmt::Debug for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleType")
            .field("name", &self.name)
            .field("uri", &self.uri)
            .field("module_mode", &self.module_mode)
            .field("fields", &self.table.read().len())
            .field("imports", &self.imports.len())
            .field("returns", &self.ret.is_some())
            .finish()
    }
}

/// A deferred type reference.
///
/// Remembers enough to reconstruct the type later: the owning module, the
/// expression node, a symbolic name for debugging, and the tuple position to
/// select from a multi-value expression. Forcing is performed by the
/// type-query engine outside the analyzer; the `Arc`ed node keeps the
/// referenced subtree alive however long that takes.
pub struct LazyType {
    /// The module the expression was analyzed in
    pub context: ModuleRef,
    /// The expression to re-walk when forcing
    pub node: Arc<Node>,
    /// Symbolic name, for debugging
    pub name: String,
    /// Tuple position to select from the expression's values
    pub index: usize,
}

impl LazyType {
    /// Create a deferred reference over `node` in `context`.
    pub fn new(context: ModuleRef, node: &Node, name: &str, index: usize) -> Arc<Self> {
        Arc::new(LazyType {
            context,
            node: Arc::new(node.clone()),
            name: name.to_string(),
            index,
        })
    }
}

impl fmt::Debug for LazyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LazyType {{ name: {:?}, index: {} }}", self.name, self.index)
    }
}
