//! Source coordinates for template trees
//!
//! Every node the host hands us carries a [`FileSpan`]. Generated nodes
//! carry the span of the template node they were fabricated from, which is
//! how diagnostics against a generation program find their way home.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a file id from its raw index
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    /// Create a span covering `start..end`
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Byte range of this span
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A span with associated file
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileSpan {
    /// File the span belongs to
    pub file: FileId,
    /// Offsets inside the file
    pub span: Span,
}

impl FileSpan {
    /// Create a new file span
    #[must_use]
    pub fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }

    /// Byte range inside the file
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    /// Smallest span covering both spans; keeps `self`'s file
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self {
            file: self.file,
            span: self.span.cover(other.span),
        }
    }
}

impl fmt::Display for FileSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file{}:{}..{}", self.file.0, self.span.start, self.span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_joins_spans() {
        let left = FileSpan::new(FileId(1), Span::new(4, 8));
        let right = FileSpan::new(FileId(1), Span::new(2, 6));
        let joined = left.cover(right);
        assert_eq!(joined.span, Span::new(2, 8));
        assert_eq!(joined.to_string(), "file1:2..8");
    }

    #[test]
    fn test_len_never_underflows() {
        let span = Span { start: 9, end: 3 };
        assert_eq!(span.len(), 0);
    }
}
