//! Source positions, used to point errors at the node that caused them.
use std::fmt::{self, Display};

/// A byte offset into the source text the syntax tree was parsed from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bytes(usize);
impl Bytes {
    pub fn new(pos: usize) -> Self {
        Self(pos)
    }
}
impl Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<Bytes> for usize {
    fn from(bytes: Bytes) -> Self {
        bytes.0
    }
}

/// A half-open byte range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    start: Bytes,
    end: Bytes,
}
impl Span {
    pub fn new(start: Bytes, end: Bytes) -> Self {
        Self { start, end }
    }

    /// The empty span at the start of the source, for nodes built without source text.
    pub fn zero() -> Self {
        Self::new(Bytes::new(0), Bytes::new(0))
    }

    pub fn start(&self) -> Bytes {
        self.start
    }

    pub fn end(&self) -> Bytes {
        self.end
    }

    /// Returns the smallest span covering both `self` and `other`.
    pub fn extend_to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Returns the spanned text, or `None` when the span does not fit `source` or splits a
    /// character.
    pub fn lookup<'t>(&self, source: &'t str) -> Option<&'t str> {
        source.get(usize::from(self.start)..usize::from(self.end))
    }
}
impl Default for Span {
    fn default() -> Self {
        Self::zero()
    }
}
impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
