//! Hand-built parse trees for analyzer tests.
//!
//! The syntactic parser is a collaborator outside this workspace, so tests
//! construct the trees it would produce: every builder takes explicit byte
//! offsets, and each test lays out its notional source in a comment so the
//! offsets can be checked against it.

#![allow(dead_code)]

use lua_ast::{Indexer, Node, NodeKind};
use lua_position_tracking::ByteSpan;
use lua_semantic_analyzer::analysis::symbol::SymbolRef;
use std::collections::HashSet;
use std::sync::Arc;

pub fn sp(start: usize, end: usize) -> ByteSpan {
    ByteSpan::new(start, end)
}

pub fn ident(name: &str, at: usize) -> Node {
    Node::new(NodeKind::Identifier { name: name.to_string() }, sp(at, at + name.len()))
}

/// A string literal; the span covers the quotes.
pub fn string(value: &str, at: usize) -> Node {
    Node::new(NodeKind::StringLiteral { value: value.to_string() }, sp(at, at + value.len() + 2))
}

pub fn number(value: f64, at: usize, width: usize) -> Node {
    Node::new(NodeKind::NumericLiteral { value }, sp(at, at + width))
}

pub fn boolean(value: bool, at: usize) -> Node {
    let width = if value { 4 } else { 5 };
    Node::new(NodeKind::BooleanLiteral { value }, sp(at, at + width))
}

pub fn nil(at: usize) -> Node {
    Node::new(NodeKind::NilLiteral, sp(at, at + 3))
}

pub fn chunk(body: Vec<Node>, end: usize) -> Node {
    Node::new(NodeKind::Chunk { body }, sp(0, end))
}

pub fn local_stmt(variables: Vec<Node>, init: Vec<Node>, span: ByteSpan) -> Node {
    Node::new(NodeKind::LocalStatement { variables, init }, span)
}

pub fn assign_stmt(variables: Vec<Node>, init: Vec<Node>, span: ByteSpan) -> Node {
    Node::new(NodeKind::AssignmentStatement { variables, init }, span)
}

pub fn call(base: Node, arguments: Vec<Node>, end: usize) -> Node {
    let start = base.location.start;
    Node::new(NodeKind::CallExpression { base: Box::new(base), arguments }, sp(start, end))
}

pub fn call_stmt(expression: Node) -> Node {
    let location = expression.location;
    Node::new(NodeKind::CallStatement { expression: Box::new(expression) }, location)
}

pub fn member(base: Node, indexer: Indexer, identifier: Node) -> Node {
    let span = sp(base.location.start, identifier.location.end);
    Node::new(
        NodeKind::MemberExpression {
            base: Box::new(base),
            indexer,
            identifier: Box::new(identifier),
        },
        span,
    )
}

pub fn table(fields: Vec<Node>, span: ByteSpan) -> Node {
    Node::new(NodeKind::TableConstructorExpression { fields }, span)
}

pub fn field(key: Node, value: Node) -> Node {
    let span = sp(key.location.start, value.location.end);
    Node::new(NodeKind::TableKeyString { key: Box::new(key), value: Box::new(value) }, span)
}

pub fn function(
    identifier: Option<Node>,
    is_local: bool,
    parameters: Vec<Node>,
    body: Vec<Node>,
    span: ByteSpan,
) -> Node {
    Node::new(
        NodeKind::FunctionDeclaration {
            identifier: identifier.map(Box::new),
            is_local,
            parameters,
            body,
        },
        span,
    )
}

pub fn return_stmt(arguments: Vec<Node>, span: ByteSpan) -> Node {
    Node::new(NodeKind::ReturnStatement { arguments }, span)
}

pub fn for_numeric(
    variable: Node,
    start: Node,
    limit: Node,
    body: Vec<Node>,
    span: ByteSpan,
) -> Node {
    Node::new(
        NodeKind::ForNumericStatement {
            variable: Box::new(variable),
            start: Box::new(start),
            limit: Box::new(limit),
            step: None,
            body,
        },
        span,
    )
}

pub fn for_generic(
    variables: Vec<Node>,
    iterators: Vec<Node>,
    body: Vec<Node>,
    span: ByteSpan,
) -> Node {
    Node::new(NodeKind::ForGenericStatement { variables, iterators, body }, span)
}

pub fn do_stmt(body: Vec<Node>, span: ByteSpan) -> Node {
    Node::new(NodeKind::DoStatement { body }, span)
}

/// Collect every symbol reachable from the module symbol: outline children,
/// the scope stack, table fields, imports, and the return slot. Cycles are
/// cut by pointer identity.
pub fn collect_symbols(module_symbol: &SymbolRef) -> Vec<SymbolRef> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    let mut queue = vec![module_symbol.clone()];

    while let Some(symbol) = queue.pop() {
        if !seen.insert(Arc::as_ptr(&symbol) as usize) {
            continue;
        }
        out.push(symbol.clone());

        let (children, ty) = {
            let s = symbol.read();
            (s.children.clone(), s.ty.clone())
        };
        queue.extend(children);

        if let Some(table) = ty.table_handle() {
            let t = table.read();
            queue.extend(t.fields().map(|(_, v)| v.clone()));
            if let Some(meta) = t.metatable.clone() {
                queue.push(meta);
            }
        }
        if let lua_semantic_analyzer::LuaType::Module(module) = &ty {
            let m = module.read();
            queue.extend(m.menv.stack.symbols().iter().cloned());
            queue.extend(m.imports.iter().cloned());
            if let Some(ret) = m.ret.clone() {
                queue.push(ret);
            }
        }
    }
    out
}

/// Find a symbol by name among the reachable set.
pub fn find_symbol(module_symbol: &SymbolRef, name: &str) -> Option<SymbolRef> {
    collect_symbols(module_symbol).into_iter().find(|s| s.read().name == name)
}
