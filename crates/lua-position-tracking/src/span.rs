//! Byte spans for symbol locations and visibility scopes.
//!
//! The analyzer stamps three spans on every symbol it emits: the defining
//! identifier token (`location`), the definition expression (`range`), and
//! the stretch of the document over which the name resolves (`scope`). All
//! three are the same type, and the nesting `location ⊆ range ⊆ scope` is
//! the model's core invariant, so the operations here are the ones that
//! build and check those spans: stamping visibility from a declaration site
//! to the end of its block, widening a name token over its initializer,
//! clamping a scope when its frame closes, and offset containment for
//! position queries.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` over a single document.
///
/// Offsets are bytes, not characters or lines; converting to editor
/// positions is the host's concern. The global environment uses a virtual
/// span ending at `usize::MAX`, so `end` is not necessarily a valid offset
/// into any document.
///
/// # Invariants
///
/// - `start <= end` (checked by [`ByteSpan::new`] in debug builds; the type
///   stays `Copy`, so the field values themselves are not sealed)
/// - Half-open: `start` is inside the span, `end` is not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ByteSpan {
    /// First byte offset inside the span
    pub start: usize,
    /// First byte offset past the span
    pub end: usize,
}

impl ByteSpan {
    /// Span from `start` up to, but not including, `end`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds when `start > end`.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "byte span runs backwards: [{start}, {end})");
        Self { start, end }
    }

    /// Zero-width span at `at`.
    ///
    /// Used as the location of synthesized declarations, such as the
    /// implicit `self` of method syntax, which have no token of their own.
    #[inline]
    pub const fn at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Whether `offset` falls inside the span.
    ///
    /// This is the scope-membership test: a symbol is visible at a query
    /// position only if the position is inside its scope span.
    ///
    /// ```
    /// use lua_position_tracking::ByteSpan;
    ///
    /// // local x = 1   -- `x` scoped to [6, 11)
    /// let scope = ByteSpan::new(6, 11);
    /// assert!(scope.contains(6));
    /// assert!(!scope.contains(11));
    /// ```
    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether `inner` lies entirely within this span.
    ///
    /// The symbol invariant is expressed with this: a symbol's range
    /// encloses its location, and its scope encloses its range. An empty
    /// `inner` on the boundary counts as enclosed.
    #[inline]
    pub const fn encloses(&self, inner: ByteSpan) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }

    /// Span from this span's start to the end of `outer`.
    ///
    /// Visibility stamping: a declaration is resolvable from its own site to
    /// the end of the enclosing block.
    ///
    /// ```
    /// use lua_position_tracking::ByteSpan;
    ///
    /// // do local n = 1 end   -- `n` at [9, 10), block [0, 18)
    /// let name = ByteSpan::new(9, 10);
    /// let block = ByteSpan::new(0, 18);
    /// assert_eq!(name.visible_from(block), ByteSpan::new(9, 18));
    /// ```
    #[inline]
    pub const fn visible_from(&self, outer: ByteSpan) -> ByteSpan {
        ByteSpan { start: self.start, end: outer.end }
    }

    /// Span from this span's start through the end of `other`, whichever
    /// ends later.
    ///
    /// Builds a definition range out of a name token and its initializer
    /// expression, and degrades to the name token alone when the
    /// initializer sits to its left or is missing.
    #[inline]
    pub fn through(&self, other: ByteSpan) -> ByteSpan {
        ByteSpan { start: self.start, end: self.end.max(other.end) }
    }

    /// Pull the span's end back to `end` if it currently reaches past it.
    ///
    /// Closing a lexical frame re-stamps the scopes declared inside it so no
    /// symbol stays resolvable past the frame's real end.
    #[inline]
    pub fn clamp_end(&mut self, end: usize) {
        if self.end > end {
            self.end = end;
        }
    }

    /// The overlap of two spans, if they overlap at all.
    pub fn intersection(&self, other: ByteSpan) -> Option<ByteSpan> {
        let start = if self.start > other.start { self.start } else { other.start };
        let end = if self.end < other.end { self.end } else { other.end };
        (start < end).then_some(ByteSpan { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        // local n = 1   -- `n` at [6, 7)
        let name = ByteSpan::new(6, 7);
        assert!(name.contains(6));
        assert!(!name.contains(7));
        assert!(!name.contains(5));
    }

    #[test]
    fn test_symbol_span_nesting() {
        // local n = 1 ... end of block at 40
        let location = ByteSpan::new(6, 7);
        let range = location.through(ByteSpan::new(10, 11));
        let scope = location.visible_from(ByteSpan::new(0, 40));

        assert_eq!(range, ByteSpan::new(6, 11));
        assert_eq!(scope, ByteSpan::new(6, 40));
        assert!(range.encloses(location));
        assert!(scope.encloses(range));
        assert!(!range.encloses(scope));
    }

    #[test]
    fn test_visible_from_starts_at_declaration() {
        let name = ByteSpan::new(9, 10);
        let vis = name.visible_from(ByteSpan::new(0, 18));
        assert!(!vis.contains(8));
        assert!(vis.contains(9));
        assert!(vis.contains(17));
        assert!(!vis.contains(18));
    }

    #[test]
    fn test_through_degrades_to_name_token() {
        // Initializer left of the name (or absent) never shrinks the range.
        let name = ByteSpan::new(20, 25);
        assert_eq!(name.through(ByteSpan::new(3, 8)), name);
        assert_eq!(name.through(name), name);
    }

    #[test]
    fn test_clamp_end_only_shrinks() {
        let mut scope = ByteSpan::new(16, 90);
        scope.clamp_end(60);
        assert_eq!(scope, ByteSpan::new(16, 60));
        scope.clamp_end(75);
        assert_eq!(scope, ByteSpan::new(16, 60));
    }

    #[test]
    fn test_zero_width_span() {
        // Synthesized `self` sits at the function's start with no token.
        let synthesized = ByteSpan::at(13);
        assert!(!synthesized.contains(13));
        assert!(ByteSpan::new(13, 51).encloses(synthesized));
    }

    #[test]
    fn test_intersection() {
        let a = ByteSpan::new(0, 10);
        assert_eq!(a.intersection(ByteSpan::new(5, 15)), Some(ByteSpan::new(5, 10)));
        assert_eq!(a.intersection(ByteSpan::new(10, 20)), None);
        assert_eq!(a.intersection(ByteSpan::new(25, 30)), None);
    }
}
