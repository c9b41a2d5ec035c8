//! SIMD-accelerated markup scanning using memchr
//!
//! The scanner walks a byte window that may end mid-token. Every `find_*`
//! method returns `None` when the terminator is not inside the window, which
//! callers treat as "feed more input" rather than as an error.

use memchr::{memchr, memmem};

/// Scanner over one window of the source
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given window
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Find next '<' (tag start) using SIMD
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the '>' closing the tag at the current position, skipping any
    /// '>' that appears inside a quoted attribute value
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut quote: Option<u8> = None;
        for (i, &b) in self.input[self.pos..].iter().enumerate() {
            match (quote, b) {
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (Some(q), _) if q == b => quote = None,
                (None, b'>') => return Some(self.pos + i),
                _ => {}
            }
        }
        None
    }

    /// Find the first byte of `needle` at or after `from`
    #[inline]
    pub fn find_seq(&self, from: usize, needle: &[u8]) -> Option<usize> {
        let from = from.min(self.input.len());
        memmem::find(&self.input[from..], needle).map(|i| from + i)
    }

    /// Find the end of a DOCTYPE declaration, honouring an internal subset
    pub fn find_doctype_end(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (i, &b) in self.input[self.pos..].iter().enumerate() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(self.pos + i),
                _ => {}
            }
        }
        None
    }

    /// Read an XML name starting at `at` without moving the cursor
    pub fn name_at(&self, at: usize) -> Option<&'a [u8]> {
        let rest = self.input.get(at..)?;
        if !rest.first().copied().is_some_and(is_name_start_char) {
            return None;
        }
        let len = rest.iter().take_while(|&&b| is_name_char(b)).count();
        Some(&rest[..len])
    }
}

/// Strip a namespace prefix from a qualified name
#[inline]
pub fn local_name(name: &[u8]) -> &[u8] {
    match memchr(b':', name) {
        Some(colon) => &name[colon + 1..],
        None => name,
    }
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

/// Check if byte is XML whitespace
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}
