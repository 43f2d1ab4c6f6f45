//! The process-wide global environment.
//!
//! `_G` is a [`ModuleType`] shared by every analyzed document: globals
//! assigned in one document resolve from any other. The environment also
//! tracks, per document, which globals the document introduced and the
//! validity flag of its latest analysis pass, so re-analysis can invalidate
//! the previous pass in one step.
//!
//! All access goes through one `RwLock`; analyses of different documents may
//! run in parallel as long as they share this environment value.

use lua_position_tracking::ByteSpan;
use lua_symbol_types::SymbolKind;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

use crate::analysis::symbol::{
    GLOBAL_SPAN, LuaType, ModuleRef, ModuleType, Symbol, SymbolRef, TableRef, TableType,
    ValidityFlag,
};

const GLOBAL_URI: &str = "lua:_G";

struct GlobalState {
    root_symbol: SymbolRef,
    root: ModuleRef,
    global_metatable: SymbolRef,
    /// Globals each document introduced, keyed by normalized URI
    document_globals: FxHashMap<String, FxHashMap<String, SymbolRef>>,
    /// Latest pass flag per document, keyed by normalized URI
    document_flags: FxHashMap<String, ValidityFlag>,
}

/// The shared global environment.
///
/// Obtain the process singleton with [`GlobalEnvironment::global`], or create
/// isolated instances with [`GlobalEnvironment::new`] (hosts running
/// independent workspaces, tests).
pub struct GlobalEnvironment {
    inner: RwLock<GlobalState>,
}

impl GlobalEnvironment {
    /// Create a fresh environment with an empty `_G`.
    pub fn new() -> Arc<Self> {
        let uri: Arc<str> = Arc::from(GLOBAL_URI);
        let root = ModuleType::new_ref("_G", &uri);
        let state = ValidityFlag::default();

        let root_symbol = Symbol {
            name: "_G".to_string(),
            location: ByteSpan::new(0, 1),
            range: GLOBAL_SPAN,
            scope: GLOBAL_SPAN,
            is_local: false,
            uri: uri.clone(),
            kind: SymbolKind::Module,
            ty: LuaType::Module(root.clone()),
            state: state.clone(),
            children: Vec::new(),
        }
        .into_ref();

        // The shared metatable attached to every analyzed module:
        // `__index` falls through to `_G`.
        let index_symbol = Symbol {
            name: "__index".to_string(),
            location: ByteSpan::new(0, 1),
            range: GLOBAL_SPAN,
            scope: GLOBAL_SPAN,
            is_local: false,
            uri: uri.clone(),
            kind: SymbolKind::Property,
            ty: LuaType::Module(root.clone()),
            state: state.clone(),
            children: Vec::new(),
        }
        .into_ref();
        let meta_table = TableType::new_ref();
        meta_table.write().set("__index", index_symbol);
        let global_metatable = Symbol {
            name: "__metatable".to_string(),
            location: ByteSpan::new(0, 1),
            range: GLOBAL_SPAN,
            scope: GLOBAL_SPAN,
            is_local: false,
            uri,
            kind: SymbolKind::Table,
            ty: LuaType::Table(meta_table),
            state,
            children: Vec::new(),
        }
        .into_ref();

        Arc::new(GlobalEnvironment {
            inner: RwLock::new(GlobalState {
                root_symbol,
                root,
                global_metatable,
                document_globals: FxHashMap::default(),
                document_flags: FxHashMap::default(),
            }),
        })
    }

    /// The process-wide singleton environment.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<GlobalEnvironment>> = OnceLock::new();
        GLOBAL.get_or_init(Self::new).clone()
    }

    /// The `_G` module.
    pub fn root(&self) -> ModuleRef {
        self.inner.read().root.clone()
    }

    /// The `_G` module symbol.
    pub fn root_symbol(&self) -> SymbolRef {
        self.inner.read().root_symbol.clone()
    }

    /// The metatable symbol every analyzed module is created with.
    pub fn global_metatable(&self) -> SymbolRef {
        self.inner.read().global_metatable.clone()
    }

    /// Look up a globally visible name.
    pub fn get(&self, name: &str) -> Option<SymbolRef> {
        let root = self.root();
        let table = root.read().table.clone();
        table.read().get(name)
    }

    /// Register a globally visible name.
    pub fn set(&self, name: &str, symbol: SymbolRef) {
        let root = self.root();
        let table = root.read().table.clone();
        table.write().set(name, symbol);
    }

    /// Register a global introduced by a specific document.
    ///
    /// The symbol lands both in `_G` and in the document's own globals map.
    pub fn set_document_global(&self, uri_key: &str, name: &str, symbol: SymbolRef) {
        self.set(name, symbol.clone());
        self.inner
            .write()
            .document_globals
            .entry(uri_key.to_string())
            .or_default()
            .insert(name.to_string(), symbol);
    }

    /// The globals a document introduced, in no particular order.
    pub fn document_globals(&self, uri_key: &str) -> Vec<(String, SymbolRef)> {
        self.inner
            .read()
            .document_globals
            .get(uri_key)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Start a new analysis pass for a document.
    ///
    /// The previous pass's flag (if any) is invalidated and the document's
    /// globals map is reset; the returned flag is shared by every symbol the
    /// new pass mints.
    pub fn begin_document(&self, uri_key: &str) -> ValidityFlag {
        let mut state = self.inner.write();
        if let Some(old) = state.document_flags.get(uri_key) {
            old.invalidate();
        }
        state.document_globals.remove(uri_key);
        let flag = ValidityFlag::default();
        state.document_flags.insert(uri_key.to_string(), flag.clone());
        flag
    }

    /// Drop a document's contribution: invalidate its latest pass and forget
    /// its globals map. `_G` entries are left to the merge rule, which treats
    /// invalid symbols as replaceable.
    pub fn invalidate_document(&self, uri_key: &str) {
        let mut state = self.inner.write();
        if let Some(flag) = state.document_flags.remove(uri_key) {
            flag.invalidate();
        }
        state.document_globals.remove(uri_key);
    }

    /// Insert a module-mode module under its name, or merge it into the
    /// already-registered module of the same name.
    ///
    /// The merge is monotone: a field from the new module is adopted only
    /// when the existing module has no entry of that name or the existing
    /// entry belongs to an invalidated pass. Fields that vanished from the
    /// new analysis are kept.
    pub fn insert_or_merge_module(&self, module_symbol: &SymbolRef) {
        let (name, new_table) = {
            let sym = module_symbol.read();
            (sym.name.clone(), sym.ty.table_handle())
        };
        let Some(new_table) = new_table else { return };

        let existing = self.get(&name);
        let existing_table = existing.as_ref().and_then(|s| s.read().ty.table_handle());
        match existing_table {
            Some(existing_table) if !Arc::ptr_eq(&existing_table, &new_table) => {
                merge_table_fields(&existing_table, &new_table);
            }
            Some(_) => {}
            None => self.set(&name, module_symbol.clone()),
        }
    }
}

/// Copy fields of `new` into `existing` where `existing` has no entry or the
/// entry is stale.
fn merge_table_fields(existing: &TableRef, new: &TableRef) {
    let incoming: Vec<(String, SymbolRef)> =
        new.read().fields().map(|(k, v)| (k.to_string(), v.clone())).collect();
    let mut dst = existing.write();
    for (name, symbol) in incoming {
        let adopt = match dst.get(&name) {
            None => true,
            Some(orig) => !orig.read().is_valid(),
        };
        if adopt {
            dst.set(&name, symbol);
        }
    }
}
