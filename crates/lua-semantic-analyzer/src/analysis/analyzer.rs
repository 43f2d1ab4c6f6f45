//! The syntax-directed analysis walk.
//!
//! One pass over the parse tree builds the document's module symbol: a scope
//! stack of declarations, a field table, imports, and a return slot. The walk
//! is total: node shapes it does not recognize, bases it cannot resolve, and
//! type mismatches are skipped, so even semantically incoherent documents
//! produce a usable outline.
//!
//! Most expression types are deferred: the walk records a
//! [`LazyType`](crate::analysis::symbol::LazyType) and leaves forcing to the
//! type-query engine. Literals are the exception, since they resolve to a
//! basic tag for free.

use lua_ast::{Indexer, Node, NodeKind};
use lua_position_tracking::ByteSpan;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

use crate::analysis::global::GlobalEnvironment;
use crate::analysis::query::{NullQuery, TypeQuery};
use crate::analysis::scope::ScopeStack;
use crate::analysis::symbol::{
    FunctionRef, FunctionType, GLOBAL_SPAN, LazyType, LuaType, ModuleRef, ModuleType, Symbol,
    SymbolKind, SymbolRef, TableRef, TableType, ValidityFlag,
};

/// Trailing module name of a `require` path: `"socket.core"` names `core`.
fn require_tail(path: &str) -> Option<String> {
    static TAIL_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let re = TAIL_RE.get_or_init(|| Regex::new(r"(\w+(?:-\w+)*)$")).as_ref().ok()?;
    re.captures(path).map(|c| c[1].to_string())
}

/// Spread a right-hand side over `count` left-hand slots: each slot gets the
/// most recent expression and its tuple offset, so a trailing multi-value
/// expression fills every remaining slot.
fn spread_inits(count: usize, init: &[Node]) -> Vec<(Option<&Node>, usize)> {
    let mut spread = Vec::with_capacity(count);
    let mut prev: Option<&Node> = None;
    let mut prev_index = 0usize;
    for i in 0..count {
        if let Some(rhs) = init.get(i) {
            prev = Some(rhs);
            prev_index = i;
        }
        spread.push((prev, i - prev_index));
    }
    spread
}

/// Semantic analyzer: parse tree in, module symbol out.
///
/// An analyzer is a thin handle over a [`GlobalEnvironment`] and a
/// [`TypeQuery`] collaborator; the per-document state lives in the walk.
/// Analyses through the same environment share `_G`.
pub struct Analyzer {
    env: Arc<GlobalEnvironment>,
    query: Arc<dyn TypeQuery>,
}

impl Analyzer {
    /// Analyzer over the process-wide global environment.
    pub fn new() -> Self {
        Self::with_env(GlobalEnvironment::global())
    }

    /// Analyzer over an explicit environment (isolated hosts, tests).
    pub fn with_env(env: Arc<GlobalEnvironment>) -> Self {
        Analyzer { env, query: Arc::new(NullQuery) }
    }

    /// Replace the type-query collaborator.
    pub fn with_query(mut self, query: Arc<dyn TypeQuery>) -> Self {
        self.query = query;
        self
    }

    /// The environment this analyzer writes into.
    pub fn env(&self) -> &Arc<GlobalEnvironment> {
        &self.env
    }

    /// Analyze a parsed document and return its module symbol.
    ///
    /// `tree` is the chunk produced by the collaborating parser with byte
    /// ranges enabled; `uri` is the opaque document identifier, whose
    /// trailing path component names the module until a `module(...)` call
    /// renames it. Re-analyzing a URI invalidates the previous pass first.
    pub fn analyze(&self, tree: &Node, uri: &str) -> SymbolRef {
        let uri_key = lua_uri::uri_key(uri);
        let name = lua_uri::module_name(uri).unwrap_or_else(|| uri.to_string());
        let doc_range = ByteSpan::new(0, tree.location.end + 1);

        let state = self.env.begin_document(&uri_key);
        let uri_arc: Arc<str> = Arc::from(uri);
        let module = ModuleType::new_ref(&name, &uri_arc);
        module.read().table.write().set_metatable(self.env.global_metatable());

        let module_symbol = Symbol {
            name,
            location: ByteSpan::new(0, 1),
            range: doc_range,
            scope: doc_range,
            is_local: false,
            uri: uri_arc.clone(),
            kind: SymbolKind::Module,
            ty: LuaType::Module(module.clone()),
            state: state.clone(),
            children: Vec::new(),
        }
        .into_ref();

        let mut walk = Walk {
            env: self.env.clone(),
            query: self.query.clone(),
            uri: uri_arc,
            uri_key,
            module: module.clone(),
            module_symbol: module_symbol.clone(),
            scope: ScopeStack::new(doc_range),
            funcs: Vec::new(),
            state,
            doc_range,
        };
        walk.node(tree);

        // Hand the pass's scope stack and global contributions to the module
        // environment, where position queries will find them.
        let globals: FxHashMap<String, SymbolRef> =
            walk.env.document_globals(&walk.uri_key).into_iter().collect();
        {
            let mut m = module.write();
            m.menv.stack = walk.scope;
            m.menv.globals = globals;
        }

        if module.read().module_mode {
            self.env.insert_or_merge_module(&module_symbol);
        }
        module_symbol
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Name and site a function declaration inherits when it is the right-hand
/// side of a binding.
struct Inherit<'a> {
    name: &'a str,
    location: ByteSpan,
    is_local: bool,
}

/// Where a named function declaration lands.
enum Place<'a> {
    /// The caller owns placement (init right-hand side)
    Inherited,
    /// `local function f`
    Local,
    /// `function a.b.c() end` / `function a.b:c() end`
    Method { base: &'a Node, colon: bool },
    /// `function f() end`
    Global,
    /// `function() end`
    Anonymous,
}

/// Mutable state of one analysis pass.
struct Walk {
    env: Arc<GlobalEnvironment>,
    query: Arc<dyn TypeQuery>,
    uri: Arc<str>,
    uri_key: String,
    module: ModuleRef,
    module_symbol: SymbolRef,
    scope: ScopeStack,
    /// Enclosing function stack, innermost last
    funcs: Vec<(SymbolRef, FunctionRef)>,
    state: ValidityFlag,
    doc_range: ByteSpan,
}

impl Walk {
    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn node(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Chunk { body } => self.block(body),
            NodeKind::LocalStatement { variables, init } => self.local_statement(variables, init),
            NodeKind::AssignmentStatement { variables, init } => {
                self.assignment_statement(variables, init)
            }
            NodeKind::FunctionDeclaration { .. } => {
                self.function_declaration(node, None);
            }
            NodeKind::CallStatement { expression } => self.node(expression),
            NodeKind::CallExpression { .. }
            | NodeKind::StringCallExpression { .. }
            | NodeKind::TableCallExpression { .. } => self.call_expression(node),
            NodeKind::IfStatement { clauses } => {
                for clause in clauses {
                    self.node(clause);
                }
            }
            NodeKind::IfClause { body, .. }
            | NodeKind::ElseifClause { body, .. }
            | NodeKind::ElseClause { body }
            | NodeKind::WhileStatement { body, .. }
            | NodeKind::RepeatStatement { body, .. }
            | NodeKind::DoStatement { body } => self.scoped_block(node.location, body),
            NodeKind::ForNumericStatement { variable, body, .. } => {
                self.for_numeric(node, variable, body)
            }
            NodeKind::ForGenericStatement { variables, iterators, body } => {
                self.for_generic(node, variables, iterators, body)
            }
            NodeKind::ReturnStatement { arguments } => self.return_statement(arguments),
            NodeKind::MemberExpression { base, .. } => self.node(base),
            _ => {}
        }
    }

    fn block(&mut self, body: &[Node]) {
        for statement in body {
            self.node(statement);
        }
    }

    fn scoped_block(&mut self, range: ByteSpan, body: &[Node]) {
        self.scope.enter(range);
        self.block(body);
        self.scope.exit(range.end);
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn make_symbol(
        &self,
        name: &str,
        location: ByteSpan,
        range: ByteSpan,
        scope: ByteSpan,
        is_local: bool,
        kind: SymbolKind,
        ty: LuaType,
    ) -> SymbolRef {
        Symbol {
            name: name.to_string(),
            location,
            range,
            scope,
            is_local,
            uri: self.uri.clone(),
            kind,
            ty,
            state: self.state.clone(),
            children: Vec::new(),
        }
        .into_ref()
    }

    /// Record a declaration in the outline of the enclosing function, or of
    /// the module at the top level.
    fn attach_child(&mut self, symbol: SymbolRef) {
        match self.funcs.last() {
            Some((fsym, _)) => fsym.write().children.push(symbol),
            None => self.module_symbol.write().children.push(symbol),
        }
    }

    /// Resolve a name as the walk sees it: scope stack, then module fields,
    /// then `_G`.
    fn lookup(&self, name: &str, position: usize) -> Option<SymbolRef> {
        if let Some(found) = self.scope.search_visible(name, position) {
            return Some(found);
        }
        let table = self.module.read().table.clone();
        if let Some(found) = table.read().get(name) {
            return Some(found);
        }
        self.env.get(name)
    }

    /// The field table behind a symbol, upgrading an untyped symbol to a
    /// fresh table. Returns `None` when the symbol is some other type.
    fn ensure_table(&self, symbol: &SymbolRef) -> Option<TableRef> {
        let ty = symbol.read().ty.clone();
        if let Some(table) = ty.table_handle() {
            return Some(table);
        }
        if ty.is_any() {
            let table = TableType::new_ref();
            symbol.write().ty = LuaType::Table(table.clone());
            return Some(table);
        }
        None
    }

    /// Resolve the base of an lvalue chain (`a`, `a.b`, `a.b["c"]`, ...).
    fn resolve_base(&self, node: &Node) -> Option<SymbolRef> {
        match &node.kind {
            NodeKind::Identifier { name } => self.lookup(name, node.location.start),
            NodeKind::MemberExpression { base, identifier, .. } => {
                let parent = self.resolve_base(base)?;
                let field = identifier.identifier_name()?;
                let ty = parent.read().ty.clone();
                ty.table_handle()?.read().get(field)
            }
            NodeKind::IndexExpression { base, index } => {
                let parent = self.resolve_base(base)?;
                let field = index.string_value()?.to_string();
                let ty = parent.read().ty.clone();
                ty.table_handle()?.read().get(&field)
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Build the symbol for one binding site.
    ///
    /// Classifies the initializer: table constructors and literals resolve
    /// eagerly, function expressions are analyzed in place, `setmetatable`
    /// calls attach a metatable, and everything else defers to a lazy
    /// reference at the binding's tuple offset.
    fn init_symbol(
        &mut self,
        name: &str,
        location: ByteSpan,
        is_local: bool,
        init: Option<&Node>,
        tuple_index: usize,
        default_kind: SymbolKind,
    ) -> SymbolRef {
        let frame = self.scope.current_frame();
        let scope_span =
            if is_local { ByteSpan::new(location.start, frame.end) } else { GLOBAL_SPAN };

        let Some(init) = init else {
            return self.make_symbol(
                name,
                location,
                location,
                scope_span,
                is_local,
                default_kind,
                LuaType::Any,
            );
        };

        let range = location.through(init.location);
        match &init.kind {
            NodeKind::TableConstructorExpression { fields } => {
                let table = self.table_from_constructor(fields);
                self.make_symbol(
                    name,
                    location,
                    range,
                    scope_span,
                    is_local,
                    SymbolKind::Table,
                    LuaType::Table(table),
                )
            }
            NodeKind::FunctionDeclaration { .. } => {
                let inherit = Inherit { name, location, is_local };
                match self.function_declaration(init, Some(inherit)) {
                    Some(fsym) => fsym,
                    None => self.make_symbol(
                        name,
                        location,
                        range,
                        scope_span,
                        is_local,
                        default_kind,
                        LuaType::Any,
                    ),
                }
            }
            NodeKind::CallExpression { base, arguments }
                if base.identifier_name() == Some("setmetatable") =>
            {
                self.setmetatable_init(name, location, range, scope_span, is_local, arguments)
            }
            _ if init.is_call() => {
                // Walk the call first so `require`/`module` interception
                // still happens when the call is an initializer.
                self.call_expression(init);
                let lazy = LazyType::new(self.module.clone(), init, name, tuple_index);
                self.make_symbol(
                    name,
                    location,
                    range,
                    scope_span,
                    is_local,
                    default_kind,
                    LuaType::Lazy(lazy),
                )
            }
            NodeKind::Identifier { name: rhs } if rhs.as_str() == name => {
                // `local x = x`: capture the shadowed local's current type,
                // or ask the query engine for the global.
                let ty = match self.scope.search_visible(rhs, init.location.start) {
                    Some(source) => {
                        let source = source.read();
                        if source.is_local {
                            source.ty.clone()
                        } else {
                            self.query.global_type(rhs)
                        }
                    }
                    None => self.query.global_type(rhs),
                };
                self.make_symbol(name, location, range, scope_span, is_local, default_kind, ty)
            }
            NodeKind::BooleanLiteral { .. }
            | NodeKind::NumericLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::NilLiteral => {
                // A literal yields exactly one value; later tuple slots are nil.
                let ty = if tuple_index > 0 {
                    LuaType::Nil
                } else {
                    match &init.kind {
                        NodeKind::BooleanLiteral { .. } => LuaType::Boolean,
                        NodeKind::NumericLiteral { .. } => LuaType::Number,
                        NodeKind::StringLiteral { .. } => LuaType::String,
                        _ => LuaType::Nil,
                    }
                };
                self.make_symbol(name, location, range, scope_span, is_local, default_kind, ty)
            }
            _ => {
                let lazy = LazyType::new(self.module.clone(), init, name, tuple_index);
                self.make_symbol(
                    name,
                    location,
                    range,
                    scope_span,
                    is_local,
                    default_kind,
                    LuaType::Lazy(lazy),
                )
            }
        }
    }

    fn local_statement(&mut self, variables: &[Node], init: &[Node]) {
        let spread = spread_inits(variables.len(), init);
        for (variable, (init_node, tuple_index)) in variables.iter().zip(spread) {
            let Some(name) = variable.identifier_name().map(str::to_string) else { continue };
            if name == "_" {
                continue;
            }
            let symbol = self.init_symbol(
                &name,
                variable.location,
                true,
                init_node,
                tuple_index,
                SymbolKind::Variable,
            );
            self.scope.push(symbol.clone());
            self.attach_child(symbol);
        }
    }

    fn assignment_statement(&mut self, variables: &[Node], init: &[Node]) {
        let spread = spread_inits(variables.len(), init);
        for (variable, (init_node, tuple_index)) in variables.iter().zip(spread) {
            match &variable.kind {
                NodeKind::Identifier { name } => {
                    if name == "_" {
                        continue;
                    }
                    self.assign_identifier(name.clone(), variable, init_node, tuple_index);
                }
                NodeKind::MemberExpression { base, identifier, .. } => {
                    let Some(field) = identifier.identifier_name().map(str::to_string) else {
                        continue;
                    };
                    self.assign_field(base, &field, identifier.location, init_node, tuple_index);
                }
                NodeKind::IndexExpression { base, index } => {
                    let Some(field) = index.string_value().map(str::to_string) else { continue };
                    self.assign_field(base, &field, index.location, init_node, tuple_index);
                }
                _ => {}
            }
        }
    }

    fn assign_identifier(
        &mut self,
        name: String,
        variable: &Node,
        init_node: Option<&Node>,
        tuple_index: usize,
    ) {
        match self.scope.search_visible(&name, variable.location.start) {
            // An already-typed declaration keeps its type.
            Some(existing) if !existing.read().ty.is_any() => {}
            // `local x; x = value` patches the declaration's type in place.
            Some(existing) => {
                let is_local = existing.read().is_local;
                let fresh = self.init_symbol(
                    &name,
                    variable.location,
                    is_local,
                    init_node,
                    tuple_index,
                    SymbolKind::Variable,
                );
                let ty = fresh.read().ty.clone();
                existing.write().ty = ty;
            }
            // A genuine global assignment.
            None => {
                let symbol = self.init_symbol(
                    &name,
                    variable.location,
                    false,
                    init_node,
                    tuple_index,
                    SymbolKind::Variable,
                );
                if self.module.read().module_mode {
                    let table = self.module.read().table.clone();
                    table.write().set(&name, symbol.clone());
                } else {
                    self.env.set_document_global(&self.uri_key, &name, symbol.clone());
                }
                self.attach_child(symbol);
            }
        }
    }

    fn assign_field(
        &mut self,
        base: &Node,
        field: &str,
        field_location: ByteSpan,
        init_node: Option<&Node>,
        tuple_index: usize,
    ) {
        let Some(base_symbol) = self.resolve_base(base) else { return };
        let base_ty = base_symbol.read().ty.clone();
        let Some(table) = base_ty.table_handle() else { return };
        let symbol = self.init_symbol(
            field,
            field_location,
            false,
            init_node,
            tuple_index,
            SymbolKind::Property,
        );
        table.write().set(field, symbol);
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Build a table type from a constructor's string-keyed fields.
    /// Computed and non-string keys are ignored.
    fn table_from_constructor(&mut self, fields: &[Node]) -> TableRef {
        let table = TableType::new_ref();
        for field in fields {
            let (key_name, key_location, value) = match &field.kind {
                NodeKind::TableKeyString { key, value } => {
                    match key.identifier_name() {
                        Some(name) => (name.to_string(), key.location, value.as_ref()),
                        None => continue,
                    }
                }
                NodeKind::TableKey { key, value } => match key.string_value() {
                    Some(name) => (name.to_string(), key.location, value.as_ref()),
                    None => continue,
                },
                _ => continue,
            };

            let ty = self.field_value_type(&key_name, value);
            let kind = match ty {
                LuaType::Table(_) => SymbolKind::Table,
                _ => SymbolKind::Property,
            };
            let range = key_location.through(value.location);
            let symbol = self.make_symbol(
                &key_name,
                key_location,
                range,
                key_location.visible_from(self.doc_range),
                false,
                kind,
                ty,
            );
            table.write().set(&key_name, symbol);
        }
        table
    }

    fn field_value_type(&mut self, name: &str, value: &Node) -> LuaType {
        match &value.kind {
            NodeKind::TableConstructorExpression { fields } => {
                LuaType::Table(self.table_from_constructor(fields))
            }
            NodeKind::BooleanLiteral { .. } => LuaType::Boolean,
            NodeKind::NumericLiteral { .. } => LuaType::Number,
            NodeKind::StringLiteral { .. } => LuaType::String,
            NodeKind::NilLiteral => LuaType::Nil,
            _ => {
                if value.is_call() {
                    self.call_expression(value);
                }
                LuaType::Lazy(LazyType::new(self.module.clone(), value, name, 0))
            }
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Analyze a function declaration and place its symbol.
    ///
    /// Returns the function's symbol so an initializer call site can perform
    /// its own placement; statement call sites ignore the return value.
    fn function_declaration(&mut self, node: &Node, inherit: Option<Inherit<'_>>) -> Option<SymbolRef> {
        let NodeKind::FunctionDeclaration { identifier, is_local, parameters, body } = &node.kind
        else {
            return None;
        };

        let frame = self.scope.current_frame();
        let ftype = FunctionType::new_ref();

        let (name, location, fn_is_local, place) = match (&inherit, identifier) {
            (Some(inh), _) => (inh.name.to_string(), inh.location, inh.is_local, Place::Inherited),
            (None, Some(id)) => match &id.kind {
                NodeKind::Identifier { name } => {
                    // `function foo() end` assigns to a visible local `foo`
                    // when one exists, so it places like a local declaration.
                    let shadows_local = self
                        .scope
                        .search_visible(name, node.location.start)
                        .is_some_and(|s| s.read().is_local);
                    if *is_local || shadows_local {
                        (name.clone(), id.location, true, Place::Local)
                    } else {
                        (name.clone(), id.location, false, Place::Global)
                    }
                }
                NodeKind::MemberExpression { base, indexer, identifier: method } => {
                    let method_name = method.identifier_name()?.to_string();
                    (
                        method_name,
                        method.location,
                        false,
                        Place::Method { base: base.as_ref(), colon: *indexer == Indexer::Colon },
                    )
                }
                _ => (format!("@anonymous:{}", node.location.start), node.location, false, Place::Anonymous),
            },
            (None, None) => {
                (format!("@anonymous:{}", node.location.start), node.location, false, Place::Anonymous)
            }
        };

        let range =
            ByteSpan::new(location.start.min(node.location.start), node.location.end);
        let scope_span = if fn_is_local {
            ByteSpan::new(range.start, frame.end)
        } else {
            match &place {
                Place::Method { .. } => ByteSpan::new(range.start, self.doc_range.end),
                Place::Anonymous => range,
                _ => GLOBAL_SPAN,
            }
        };

        let mut fsymbol = self.make_symbol(
            &name,
            location,
            range,
            scope_span,
            fn_is_local,
            SymbolKind::Function,
            LuaType::Function(ftype.clone()),
        );

        let mut self_param: Option<SymbolRef> = None;
        match place {
            Place::Inherited => {}
            Place::Local => {
                // `local foo; function foo() end` retargets the earlier
                // declaration in place instead of shadowing it.
                let prior = self.scope.search(|s| {
                    s.is_local
                        && s.name == name
                        && s.location.start <= node.location.start
                        && s.scope.contains(node.location.start)
                });
                match prior {
                    Some(existing) => {
                        {
                            let mut sym = existing.write();
                            sym.location = location;
                            sym.range = range;
                            sym.scope = scope_span;
                            sym.kind = SymbolKind::Function;
                            sym.ty = LuaType::Function(ftype.clone());
                        }
                        fsymbol = existing;
                    }
                    None => {
                        self.scope.push(fsymbol.clone());
                        self.attach_child(fsymbol.clone());
                    }
                }
            }
            Place::Method { base, colon } => {
                let Some(parent) = self.resolve_base(base) else { return Some(fsymbol) };
                let Some(table) = self.ensure_table(&parent) else { return Some(fsymbol) };
                {
                    let mut p = parent.write();
                    if matches!(p.kind, SymbolKind::Table | SymbolKind::Variable) {
                        p.kind = SymbolKind::Class;
                    }
                }
                table.write().set(&name, fsymbol.clone());
                self.attach_child(fsymbol.clone());
                if colon {
                    let parent_ty = parent.read().ty.clone();
                    self_param = Some(self.make_symbol(
                        "self",
                        ByteSpan::at(node.location.start),
                        node.location,
                        node.location,
                        true,
                        SymbolKind::Parameter,
                        parent_ty,
                    ));
                }
            }
            Place::Global => {
                self.attach_child(fsymbol.clone());
                if self.module.read().module_mode {
                    let table = self.module.read().table.clone();
                    table.write().set(&name, fsymbol.clone());
                } else {
                    self.env.set_document_global(&self.uri_key, &name, fsymbol.clone());
                }
            }
            Place::Anonymous => {
                self.attach_child(fsymbol.clone());
            }
        }

        // Body scope: formals first, then the synthesized `self`.
        self.scope.enter(node.location);
        let slot_offset = usize::from(self_param.is_some());
        if let Some(selfp) = &self_param {
            ftype.write().set_param(0, selfp.clone());
        }
        for (i, parameter) in parameters.iter().enumerate() {
            let Some(param_name) = parameter.identifier_name() else { continue };
            if param_name == "_" {
                continue;
            }
            let psym = self.make_symbol(
                param_name,
                parameter.location,
                parameter.location,
                ByteSpan::new(parameter.location.start, node.location.end),
                true,
                SymbolKind::Parameter,
                LuaType::Any,
            );
            ftype.write().set_param(slot_offset + i, psym.clone());
            self.scope.push(psym);
        }
        if let Some(selfp) = self_param {
            self.scope.push(selfp);
        }

        self.funcs.push((fsymbol.clone(), ftype));
        self.block(body);
        self.funcs.pop();
        self.scope.exit(node.location.end);

        Some(fsymbol)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn call_expression(&mut self, node: &Node) {
        let (base, arguments): (&Node, Vec<&Node>) = match &node.kind {
            NodeKind::CallExpression { base, arguments } => (base, arguments.iter().collect()),
            NodeKind::StringCallExpression { base, argument }
            | NodeKind::TableCallExpression { base, argument } => (base, vec![argument.as_ref()]),
            _ => return,
        };

        match base.identifier_name() {
            Some("module") => {
                if let Some(new_name) = arguments.first().and_then(|a| a.string_value()) {
                    {
                        let mut m = self.module.write();
                        m.name = new_name.to_string();
                        m.module_mode = true;
                    }
                    self.module_symbol.write().name = new_name.to_string();
                }
            }
            Some("require") => {
                self.require_import(node, arguments.first().copied());
            }
            Some("pcall") => {
                let target = arguments.first();
                let is_require = target.is_some_and(|t| {
                    t.string_value() == Some("require") || t.identifier_name() == Some("require")
                });
                if is_require {
                    self.require_import(node, arguments.get(1).copied());
                } else {
                    for argument in &arguments {
                        self.node(argument);
                    }
                }
            }
            Some("setmetatable") => {
                self.setmetatable_statement(&arguments);
            }
            _ => {
                self.node(base);
                for argument in &arguments {
                    self.node(argument);
                }
            }
        }
    }

    /// Register a deferred import for a `require`d path.
    ///
    /// Only literal paths are importable; a computed path is dropped.
    fn require_import(&mut self, call: &Node, argument: Option<&Node>) {
        let Some(argument) = argument else { return };
        let Some(path) = argument.string_value() else { return };
        let Some(tail) = require_tail(path) else { return };

        let lazy = LazyType::new(self.module.clone(), call, &tail, 0);
        let symbol = self.make_symbol(
            &tail,
            argument.location,
            argument.location,
            ByteSpan::new(argument.location.start, self.doc_range.end),
            false,
            SymbolKind::Module,
            LuaType::Lazy(lazy),
        );
        self.module.write().import(symbol);
    }

    // ------------------------------------------------------------------
    // setmetatable
    // ------------------------------------------------------------------

    /// Standalone `setmetatable(T, M)`: attach to the named target.
    fn setmetatable_statement(&mut self, arguments: &[&Node]) {
        let Some(target) = arguments.first() else { return };
        let NodeKind::Identifier { name } = &target.kind else { return };
        let Some(target_symbol) = self.lookup(name, target.location.start) else { return };
        let Some(table) = self.ensure_table(&target_symbol) else { return };
        if let Some(meta) = arguments.get(1) {
            let meta_symbol = self.metatable_symbol(meta);
            table.write().set_metatable(meta_symbol);
        }
    }

    /// `local x = setmetatable(T, M)`: bind `T`'s type under the left-hand
    /// name and attach the metatable. When the names coincide the original
    /// symbol is reused directly.
    fn setmetatable_init(
        &mut self,
        name: &str,
        location: ByteSpan,
        range: ByteSpan,
        scope_span: ByteSpan,
        is_local: bool,
        arguments: &[Node],
    ) -> SymbolRef {
        let meta = arguments.get(1);
        match arguments.first().map(|t| (&t.kind, t)) {
            Some((NodeKind::Identifier { name: target_name }, target)) => {
                match self.lookup(target_name, target.location.start) {
                    Some(target_symbol) => {
                        if let Some(table) = self.ensure_table(&target_symbol) {
                            if let Some(meta) = meta {
                                let meta_symbol = self.metatable_symbol(meta);
                                table.write().set_metatable(meta_symbol);
                            }
                        }
                        if target_name == name {
                            return target_symbol;
                        }
                        let ty = target_symbol.read().ty.clone();
                        let kind = match ty {
                            LuaType::Table(_) | LuaType::Module(_) => SymbolKind::Table,
                            _ => SymbolKind::Variable,
                        };
                        self.make_symbol(name, location, range, scope_span, is_local, kind, ty)
                    }
                    None => self.make_symbol(
                        name,
                        location,
                        range,
                        scope_span,
                        is_local,
                        SymbolKind::Variable,
                        LuaType::Any,
                    ),
                }
            }
            Some((NodeKind::TableConstructorExpression { fields }, _)) => {
                let table = self.table_from_constructor(fields);
                if let Some(meta) = meta {
                    let meta_symbol = self.metatable_symbol(meta);
                    table.write().set_metatable(meta_symbol);
                }
                self.make_symbol(
                    name,
                    location,
                    range,
                    scope_span,
                    is_local,
                    SymbolKind::Table,
                    LuaType::Table(table),
                )
            }
            _ => self.make_symbol(
                name,
                location,
                range,
                scope_span,
                is_local,
                SymbolKind::Variable,
                LuaType::Any,
            ),
        }
    }

    /// The `__metatable` symbol for a metatable argument: a parsed table
    /// constructor, or a deferred reference to any other expression.
    fn metatable_symbol(&mut self, meta: &Node) -> SymbolRef {
        let ty = match &meta.kind {
            NodeKind::TableConstructorExpression { fields } => {
                LuaType::Table(self.table_from_constructor(fields))
            }
            _ => LuaType::Lazy(LazyType::new(self.module.clone(), meta, "__metatable", 0)),
        };
        self.make_symbol(
            "__metatable",
            meta.location,
            meta.location,
            meta.location.visible_from(self.doc_range),
            false,
            SymbolKind::Table,
            ty,
        )
    }

    // ------------------------------------------------------------------
    // Returns and loops
    // ------------------------------------------------------------------

    fn return_statement(&mut self, arguments: &[Node]) {
        let last = arguments.len().saturating_sub(1);
        for (i, argument) in arguments.iter().enumerate() {
            let name = format!("R{}", i);
            let symbol =
                self.init_symbol(&name, argument.location, true, Some(argument), 0, SymbolKind::Variable);

            if i == last && argument.is_call() {
                if let Some((_, ftype)) = self.funcs.last() {
                    ftype.write().tail_call = Some(symbol.read().ty.clone());
                }
            }

            match self.funcs.last() {
                Some((_, ftype)) => ftype.write().set_ret(i, symbol),
                None => self.module.write().ret = Some(symbol),
            }
        }
    }

    fn for_numeric(&mut self, node: &Node, variable: &Node, body: &[Node]) {
        self.scope.enter(node.location);
        if let Some(name) = variable.identifier_name() {
            if name != "_" {
                let symbol = self.make_symbol(
                    name,
                    variable.location,
                    variable.location,
                    ByteSpan::new(variable.location.start, node.location.end),
                    true,
                    SymbolKind::Variable,
                    LuaType::Number,
                );
                self.scope.push(symbol.clone());
                self.attach_child(symbol);
            }
        }
        self.block(body);
        self.scope.exit(node.location.end);
    }

    fn for_generic(
        &mut self,
        node: &Node,
        variables: &[Node],
        iterators: &[Node],
        body: &[Node],
    ) {
        self.scope.enter(node.location);
        for (i, variable) in variables.iter().enumerate() {
            let Some(name) = variable.identifier_name() else { continue };
            if name == "_" {
                continue;
            }
            let ty = match iterators.first() {
                Some(iterator) => {
                    LuaType::Lazy(LazyType::new(self.module.clone(), iterator, name, i))
                }
                None => LuaType::Any,
            };
            let symbol = self.make_symbol(
                name,
                variable.location,
                variable.location,
                ByteSpan::new(variable.location.start, node.location.end),
                true,
                SymbolKind::Variable,
                ty,
            );
            self.scope.push(symbol.clone());
            self.attach_child(symbol);
        }
        self.block(body);
        self.scope.exit(node.location.end);
    }
}
