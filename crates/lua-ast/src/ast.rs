//! Abstract Syntax Tree definitions for Lua source documents.
//!
//! This module defines the node types a collaborating parser emits and the
//! semantic analyzer consumes. Every node carries a half-open byte span over
//! the source document; the analyzer leans on those spans to stamp symbol
//! locations and visibility scopes.
//!
//! # Memory Optimization
//!
//! The tree is optimized for single-pass analysis of real documents:
//! - `Box<Node>` for recursive positions keeps enum variants small
//! - `Vec<Node>` bodies preserve source order for outline construction
//! - Cheap cloning so deferred type references can own their subtrees
//!
//! # Usage Examples
//!
//! ```
//! use lua_ast::{Node, NodeKind};
//! use lua_position_tracking::ByteSpan;
//!
//! // local x = 1
//! let stmt = Node::new(
//!     NodeKind::LocalStatement {
//!         variables: vec![Node::new(
//!             NodeKind::Identifier { name: "x".to_string() },
//!             ByteSpan::new(6, 7),
//!         )],
//!         init: vec![Node::new(NodeKind::NumericLiteral { value: 1.0 }, ByteSpan::new(10, 11))],
//!     },
//!     ByteSpan::new(0, 11),
//! );
//! assert_eq!(stmt.to_sexp(), "(local (identifier x) (number 1))");
//! ```

use lua_position_tracking::ByteSpan;

/// Indexer token of a member expression: `a.b` versus `a:b`.
///
/// Colon indexing is method syntax; a function defined through it receives an
/// implicit `self` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexer {
    /// Dot access (`a.b`)
    Dot,
    /// Colon access (`a:b`), method syntax
    Colon,
}

impl Indexer {
    /// The token as it appears in source.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Indexer::Dot => ".",
            Indexer::Colon => ":",
        }
    }
}

/// Core AST node representing any Lua language construct.
///
/// Each node pairs the semantic content (`kind`) with the byte span of the
/// construct in the source document. Spans are half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The specific type and semantic content of this AST node
    pub kind: NodeKind,
    /// Source span of the construct
    pub location: ByteSpan,
}

/// The node kinds of the Lua syntax tree.
///
/// The analyzer dispatches on a subset of these; kinds it does not recognize
/// are skipped, so the enum can grow without breaking analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Top-level chunk containing all statements of a document
    Chunk {
        /// All top-level statements in source order
        body: Vec<Node>,
    },

    /// Local declaration: `local a, b = x, y`
    LocalStatement {
        /// Declared identifiers
        variables: Vec<Node>,
        /// Right-hand side expressions (may be shorter than `variables`)
        init: Vec<Node>,
    },

    /// Assignment to existing or new targets: `a, b.c = x, y`
    AssignmentStatement {
        /// Assignment targets (identifiers, member or index expressions)
        variables: Vec<Node>,
        /// Right-hand side expressions
        init: Vec<Node>,
    },

    /// Function declaration, named or anonymous, local or global
    ///
    /// `function f() end`, `local function f() end`, `function a.b:m() end`,
    /// and the anonymous `function() end` all share this kind.
    FunctionDeclaration {
        /// Name site: identifier or (possibly nested) member expression;
        /// `None` for anonymous functions
        identifier: Option<Box<Node>>,
        /// True for `local function`
        is_local: bool,
        /// Formal parameters (identifiers, final one may be vararg)
        parameters: Vec<Node>,
        /// Function body statements
        body: Vec<Node>,
    },

    /// Expression statement wrapping a call
    CallStatement {
        /// The call expression
        expression: Box<Node>,
    },

    /// Call with parenthesized arguments: `f(a, b)`
    CallExpression {
        /// Callee expression
        base: Box<Node>,
        /// Argument expressions
        arguments: Vec<Node>,
    },

    /// Call with a single string argument: `f "arg"`
    StringCallExpression {
        /// Callee expression
        base: Box<Node>,
        /// The string literal argument
        argument: Box<Node>,
    },

    /// Call with a single table-constructor argument: `f { ... }`
    TableCallExpression {
        /// Callee expression
        base: Box<Node>,
        /// The table constructor argument
        argument: Box<Node>,
    },

    /// `if` statement: an ordered sequence of clauses
    IfStatement {
        /// `IfClause`, then any `ElseifClause`s, then an optional `ElseClause`
        clauses: Vec<Node>,
    },

    /// Leading `if <cond> then <body>` clause
    IfClause {
        /// Condition expression
        condition: Box<Node>,
        /// Clause body
        body: Vec<Node>,
    },

    /// `elseif <cond> then <body>` clause
    ElseifClause {
        /// Condition expression
        condition: Box<Node>,
        /// Clause body
        body: Vec<Node>,
    },

    /// Trailing `else <body>` clause
    ElseClause {
        /// Clause body
        body: Vec<Node>,
    },

    /// `while <cond> do <body> end`
    WhileStatement {
        /// Loop condition
        condition: Box<Node>,
        /// Loop body
        body: Vec<Node>,
    },

    /// `repeat <body> until <cond>`
    RepeatStatement {
        /// Loop condition (evaluated in the body's scope)
        condition: Box<Node>,
        /// Loop body
        body: Vec<Node>,
    },

    /// `do <body> end` block
    DoStatement {
        /// Block body
        body: Vec<Node>,
    },

    /// Numeric for: `for i = start, limit [, step] do <body> end`
    ForNumericStatement {
        /// Control variable identifier
        variable: Box<Node>,
        /// Start expression
        start: Box<Node>,
        /// Limit expression
        limit: Box<Node>,
        /// Optional step expression
        step: Option<Box<Node>>,
        /// Loop body
        body: Vec<Node>,
    },

    /// Generic for: `for a, b in iter(...) do <body> end`
    ForGenericStatement {
        /// Iteration variable identifiers
        variables: Vec<Node>,
        /// Iterator expressions after `in`
        iterators: Vec<Node>,
        /// Loop body
        body: Vec<Node>,
    },

    /// `return [expr, ...]`
    ReturnStatement {
        /// Returned expressions, possibly empty
        arguments: Vec<Node>,
    },

    /// `break`
    BreakStatement,

    /// `::label::` (Lua 5.2)
    LabelStatement {
        /// Label identifier
        label: Box<Node>,
    },

    /// `goto label` (Lua 5.2)
    GotoStatement {
        /// Target label identifier
        label: Box<Node>,
    },

    /// A bare identifier
    Identifier {
        /// Identifier text
        name: String,
    },

    /// Member access with an identifier key: `base.name` or `base:name`
    MemberExpression {
        /// Base expression
        base: Box<Node>,
        /// Dot or colon
        indexer: Indexer,
        /// The member identifier
        identifier: Box<Node>,
    },

    /// Bracketed index access: `base[expr]`
    IndexExpression {
        /// Base expression
        base: Box<Node>,
        /// Index expression
        index: Box<Node>,
    },

    /// Table constructor: `{ ... }`
    TableConstructorExpression {
        /// Fields in source order
        fields: Vec<Node>,
    },

    /// Identifier-keyed table field: `name = value`
    TableKeyString {
        /// The field-name identifier
        key: Box<Node>,
        /// The field value expression
        value: Box<Node>,
    },

    /// Bracket-keyed table field: `[expr] = value`
    TableKey {
        /// The computed key expression
        key: Box<Node>,
        /// The field value expression
        value: Box<Node>,
    },

    /// Positional table field: a bare value
    TableValue {
        /// The value expression
        value: Box<Node>,
    },

    /// String literal (quotes stripped, escapes resolved by the parser)
    StringLiteral {
        /// The literal's value
        value: String,
    },

    /// Numeric literal
    NumericLiteral {
        /// The literal's value
        value: f64,
    },

    /// Boolean literal
    BooleanLiteral {
        /// The literal's value
        value: bool,
    },

    /// `nil`
    NilLiteral,

    /// `...`
    VarargLiteral,

    /// Binary operation: `left op right`
    BinaryExpression {
        /// Operator text (`+`, `..`, `==`, ...)
        operator: String,
        /// Left operand
        left: Box<Node>,
        /// Right operand
        right: Box<Node>,
    },

    /// Short-circuit operation: `left and/or right`
    LogicalExpression {
        /// `and` or `or`
        operator: String,
        /// Left operand
        left: Box<Node>,
        /// Right operand
        right: Box<Node>,
    },

    /// Unary operation: `op argument`
    UnaryExpression {
        /// Operator text (`not`, `-`, `#`, `~`)
        operator: String,
        /// Operand
        argument: Box<Node>,
    },
}

impl Node {
    /// Create a new AST node.
    pub fn new(kind: NodeKind, location: ByteSpan) -> Self {
        Node { kind, location }
    }

    /// The identifier text if this node is a bare identifier.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// The string value if this node is a string literal.
    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::StringLiteral { value } => Some(value),
            _ => None,
        }
    }

    /// True for the call-expression kinds (`f(..)`, `f ".."`, `f {..}`).
    pub fn is_call(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::CallExpression { .. }
                | NodeKind::StringCallExpression { .. }
                | NodeKind::TableCallExpression { .. }
        )
    }

    /// Render the tree as a compact S-expression.
    ///
    /// Intended for test diagnostics and debugging dumps, not serialization.
    pub fn to_sexp(&self) -> String {
        match &self.kind {
            NodeKind::Chunk { body } => format!("(chunk {})", sexp_list(body)),
            NodeKind::LocalStatement { variables, init } => {
                if init.is_empty() {
                    format!("(local {})", sexp_list(variables))
                } else {
                    format!("(local {} {})", sexp_list(variables), sexp_list(init))
                }
            }
            NodeKind::AssignmentStatement { variables, init } => {
                format!("(assign {} {})", sexp_list(variables), sexp_list(init))
            }
            NodeKind::FunctionDeclaration { identifier, is_local, parameters, body } => {
                let name = identifier.as_ref().map_or_else(String::new, |n| format!(" {}", n.to_sexp()));
                let local = if *is_local { " local" } else { "" };
                format!(
                    "(function{}{} (params {}) {})",
                    local,
                    name,
                    sexp_list(parameters),
                    sexp_list(body)
                )
            }
            NodeKind::CallStatement { expression } => {
                format!("(call_statement {})", expression.to_sexp())
            }
            NodeKind::CallExpression { base, arguments } => {
                format!("(call {} {})", base.to_sexp(), sexp_list(arguments))
            }
            NodeKind::StringCallExpression { base, argument } => {
                format!("(string_call {} {})", base.to_sexp(), argument.to_sexp())
            }
            NodeKind::TableCallExpression { base, argument } => {
                format!("(table_call {} {})", base.to_sexp(), argument.to_sexp())
            }
            NodeKind::IfStatement { clauses } => format!("(if {})", sexp_list(clauses)),
            NodeKind::IfClause { condition, body } => {
                format!("(if_clause {} {})", condition.to_sexp(), sexp_list(body))
            }
            NodeKind::ElseifClause { condition, body } => {
                format!("(elseif_clause {} {})", condition.to_sexp(), sexp_list(body))
            }
            NodeKind::ElseClause { body } => format!("(else_clause {})", sexp_list(body)),
            NodeKind::WhileStatement { condition, body } => {
                format!("(while {} {})", condition.to_sexp(), sexp_list(body))
            }
            NodeKind::RepeatStatement { condition, body } => {
                format!("(repeat {} {})", sexp_list(body), condition.to_sexp())
            }
            NodeKind::DoStatement { body } => format!("(do {})", sexp_list(body)),
            NodeKind::ForNumericStatement { variable, start, limit, step, body } => {
                let step_str =
                    step.as_ref().map_or_else(String::new, |s| format!(" {}", s.to_sexp()));
                format!(
                    "(for_numeric {} {} {}{} {})",
                    variable.to_sexp(),
                    start.to_sexp(),
                    limit.to_sexp(),
                    step_str,
                    sexp_list(body)
                )
            }
            NodeKind::ForGenericStatement { variables, iterators, body } => {
                format!(
                    "(for_generic ({}) ({}) {})",
                    sexp_list(variables),
                    sexp_list(iterators),
                    sexp_list(body)
                )
            }
            NodeKind::ReturnStatement { arguments } => {
                format!("(return {})", sexp_list(arguments))
            }
            NodeKind::BreakStatement => "(break)".to_string(),
            NodeKind::LabelStatement { label } => format!("(label {})", label.to_sexp()),
            NodeKind::GotoStatement { label } => format!("(goto {})", label.to_sexp()),
            NodeKind::Identifier { name } => format!("(identifier {})", name),
            NodeKind::MemberExpression { base, indexer, identifier } => {
                format!(
                    "(member {} {} {})",
                    base.to_sexp(),
                    indexer.as_str(),
                    identifier.to_sexp()
                )
            }
            NodeKind::IndexExpression { base, index } => {
                format!("(index {} {})", base.to_sexp(), index.to_sexp())
            }
            NodeKind::TableConstructorExpression { fields } => {
                format!("(table {})", sexp_list(fields))
            }
            NodeKind::TableKeyString { key, value } => {
                format!("(field {} {})", key.to_sexp(), value.to_sexp())
            }
            NodeKind::TableKey { key, value } => {
                format!("(computed_field {} {})", key.to_sexp(), value.to_sexp())
            }
            NodeKind::TableValue { value } => format!("(item {})", value.to_sexp()),
            NodeKind::StringLiteral { value } => format!("(string {:?})", value),
            NodeKind::NumericLiteral { value } => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("(number {})", *value as i64)
                } else {
                    format!("(number {})", value)
                }
            }
            NodeKind::BooleanLiteral { value } => format!("(boolean {})", value),
            NodeKind::NilLiteral => "(nil)".to_string(),
            NodeKind::VarargLiteral => "(vararg)".to_string(),
            NodeKind::BinaryExpression { operator, left, right } => {
                format!("(binary {} {} {})", operator, left.to_sexp(), right.to_sexp())
            }
            NodeKind::LogicalExpression { operator, left, right } => {
                format!("(logical {} {} {})", operator, left.to_sexp(), right.to_sexp())
            }
            NodeKind::UnaryExpression { operator, argument } => {
                format!("(unary {} {})", operator, argument.to_sexp())
            }
        }
    }
}

fn sexp_list(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_sexp).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: usize) -> Node {
        Node::new(
            NodeKind::Identifier { name: name.to_string() },
            ByteSpan::new(start, start + name.len()),
        )
    }

    #[test]
    fn test_local_statement_sexp() {
        // local x = 1
        let stmt = Node::new(
            NodeKind::LocalStatement {
                variables: vec![ident("x", 6)],
                init: vec![Node::new(
                    NodeKind::NumericLiteral { value: 1.0 },
                    ByteSpan::new(10, 11),
                )],
            },
            ByteSpan::new(0, 11),
        );
        assert_eq!(stmt.to_sexp(), "(local (identifier x) (number 1))");
    }

    #[test]
    fn test_member_expression_sexp() {
        // a.b and a:b render their indexer
        let dot = Node::new(
            NodeKind::MemberExpression {
                base: Box::new(ident("a", 0)),
                indexer: Indexer::Dot,
                identifier: Box::new(ident("b", 2)),
            },
            ByteSpan::new(0, 3),
        );
        assert_eq!(dot.to_sexp(), "(member (identifier a) . (identifier b))");
    }

    #[test]
    fn test_identifier_helpers() {
        let id = ident("foo", 0);
        assert_eq!(id.identifier_name(), Some("foo"));
        assert_eq!(id.string_value(), None);

        let lit = Node::new(
            NodeKind::StringLiteral { value: "bar".to_string() },
            ByteSpan::new(0, 5),
        );
        assert_eq!(lit.string_value(), Some("bar"));
        assert_eq!(lit.identifier_name(), None);
    }

    #[test]
    fn test_is_call() {
        let call = Node::new(
            NodeKind::CallExpression { base: Box::new(ident("f", 0)), arguments: vec![] },
            ByteSpan::new(0, 3),
        );
        assert!(call.is_call());

        let string_call = Node::new(
            NodeKind::StringCallExpression {
                base: Box::new(ident("f", 0)),
                argument: Box::new(Node::new(
                    NodeKind::StringLiteral { value: "x".to_string() },
                    ByteSpan::new(2, 5),
                )),
            },
            ByteSpan::new(0, 5),
        );
        assert!(string_call.is_call());
        assert!(!ident("f", 0).is_call());
    }

    #[test]
    fn test_function_declaration_sexp() {
        let f = Node::new(
            NodeKind::FunctionDeclaration {
                identifier: Some(Box::new(ident("f", 9))),
                is_local: false,
                parameters: vec![ident("x", 11)],
                body: vec![],
            },
            ByteSpan::new(0, 20),
        );
        assert_eq!(f.to_sexp(), "(function (identifier f) (params (identifier x)) )");
    }
}
