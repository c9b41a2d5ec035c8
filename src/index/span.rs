//! ByteRange - start and end offsets into the source
//!
//! Ranges are what the offset index stores for every matched element. They
//! are absolute, so a range read back through the snippet reader yields the
//! element exactly as it appears in the source.

/// A half-open byte range `[start, end)` in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    /// Offset of the first byte (the element's `<`)
    pub start: u64,
    /// Offset one past the last byte (after the closing `>`)
    pub end: u64,
}

impl ByteRange {
    /// Create a new range
    #[inline]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if this range is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if `other` lies entirely within this range
    #[inline]
    pub const fn contains(&self, other: &ByteRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Extract the byte slice from an in-memory copy of the source
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = self.start as usize;
        let end = self.end as usize;
        if start <= end && end <= input.len() {
            &input[start..end]
        } else {
            &[]
        }
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
