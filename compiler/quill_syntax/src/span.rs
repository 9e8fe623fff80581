use std::ops::Range;

/// Byte range into the source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn from_range(range: Range<usize>) -> Self {
        Span::new(range.start as u32, range.end as u32)
    }

    /// Empty span at `offset`.
    pub const fn point(offset: u32) -> Self {
        Span::new(offset, offset)
    }

    /// Smallest span covering both.
    pub fn merge(self, other: Span) -> Self {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}
