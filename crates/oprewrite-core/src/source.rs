// Source range model: byte spans into the immutable original buffer
use std::fmt;
use std::ops::Range;

use serde::Serialize;

/// Half-open byte interval `[begin, end)` into the original source.
///
/// Ranges compare by value and order by `(begin, end)`, so they can key
/// ordered sets and maps directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceRange {
    pub begin: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end, "range begins after it ends");
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Whether `other` lies entirely inside this range
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Whether the two ranges share at least one byte
    pub fn overlaps(&self, other: &SourceRange) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.begin..self.end
    }

    /// Slice `source` by this range, if it is in bounds and on char boundaries
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.as_range())
    }
}

impl From<Range<usize>> for SourceRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}
