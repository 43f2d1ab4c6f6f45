//! Lexical scope stack for the analysis walk.
//!
//! The stack is a flat, append-only sequence of symbols plus a stack of open
//! frame ranges. Symbols are never popped: a lookup filters by declaration
//! offset and by position-in-scope instead, so the finished stack still
//! answers out-of-order queries (hover in the middle of the document) after
//! every frame has closed.

use lua_position_tracking::ByteSpan;

use crate::analysis::symbol::{GLOBAL_SPAN, SymbolRef};

/// An open lexical frame.
#[derive(Debug, Clone, Copy)]
struct Frame {
    range: ByteSpan,
    /// Index of the first symbol pushed inside this frame
    first_symbol: usize,
}

/// The scope stack of one analysis pass.
#[derive(Debug)]
pub struct ScopeStack {
    symbols: Vec<SymbolRef>,
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// Create a stack whose root frame spans the whole document.
    pub fn new(root: ByteSpan) -> Self {
        ScopeStack { symbols: Vec::new(), frames: vec![Frame { range: root, first_symbol: 0 }] }
    }

    /// The innermost open frame's range.
    pub fn current_frame(&self) -> ByteSpan {
        // The root frame is never popped.
        self.frames.last().map_or(GLOBAL_SPAN, |f| f.range)
    }

    /// Open a nested frame spanning `range`.
    pub fn enter(&mut self, range: ByteSpan) {
        self.frames.push(Frame { range, first_symbol: self.symbols.len() });
    }

    /// Close the innermost frame, clamping its symbols' visibility to `end`.
    ///
    /// Symbols stay on the stack; only their scope spans are re-stamped so a
    /// frame never leaks visibility past its closing offset.
    pub fn exit(&mut self, end: usize) {
        let Some(frame) = self.frames.pop() else { return };
        if self.frames.is_empty() {
            // Root frame: restore it, exit is a no-op at the top level.
            self.frames.push(frame);
            return;
        }
        for sym in &self.symbols[frame.first_symbol..] {
            sym.write().scope.clamp_end(end);
        }
    }

    /// Append a symbol to the innermost frame.
    pub fn push(&mut self, symbol: SymbolRef) {
        self.symbols.push(symbol);
    }

    /// Walk symbols tail-to-head, returning the first match.
    pub fn search<F>(&self, predicate: F) -> Option<SymbolRef>
    where
        F: Fn(&crate::analysis::symbol::Symbol) -> bool,
    {
        self.symbols.iter().rev().find(|s| predicate(&s.read())).cloned()
    }

    /// Find the latest declaration of `name` visible at `position`.
    ///
    /// A declaration is visible when its defining token starts at or before
    /// `position` and `position` falls inside its scope span.
    pub fn search_visible(&self, name: &str, position: usize) -> Option<SymbolRef> {
        self.search(|s| s.name == name && s.location.start <= position && s.scope.contains(position))
    }

    /// All symbols pushed so far, in declaration order.
    pub fn symbols(&self) -> &[SymbolRef] {
        &self.symbols
    }

    /// Number of symbols on the stack.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when no symbol has been pushed.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of open frames, the root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new(GLOBAL_SPAN)
    }
}
