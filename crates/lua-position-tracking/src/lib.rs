//! Byte-offset position tracking for the Lua analysis ecosystem.
//!
//! The analyzer and its consumers address source text exclusively by byte
//! offsets; conversion to editor line/character positions belongs to the
//! protocol layer of the host.

mod span;

pub use span::ByteSpan;
