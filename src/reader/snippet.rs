//! Snippet Reader
//!
//! Reads the text between two byte offsets of the source and decodes it with
//! the encoding detected at index time. The source sits behind a mutex so
//! reads only need a shared reference.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

use encoding_rs::Encoding;
use log::{trace, warn};

use crate::error::{QcmlError, Result};
use crate::index::ByteRange;

/// Longest byte sequence of one character in any accepted encoding
const MAX_BYTES_PER_CHAR: u64 = 4;

pub struct SnippetReader<R> {
    source: Mutex<R>,
    encoding: &'static Encoding,
    len: u64,
}

impl<R: Read + Seek> SnippetReader<R> {
    /// Wrap a source of `len` bytes
    pub fn new(source: R, encoding: &'static Encoding, len: u64) -> Self {
        Self {
            source: Mutex::new(source),
            encoding,
            len,
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Length of the source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw bytes of a range
    pub fn read_bytes(&self, range: &ByteRange) -> Result<Vec<u8>> {
        self.check(range)?;
        self.read_span(range.start, range.len())
    }

    /// Text of a range
    pub fn read(&self, range: &ByteRange) -> Result<String> {
        self.read_capped(range, 0)
    }

    /// Text of a range, truncated to its first `max_chars` characters when
    /// `max_chars > 0`
    pub fn read_capped(&self, range: &ByteRange, max_chars: usize) -> Result<String> {
        self.check(range)?;
        let len = if max_chars > 0 {
            range.len().min(max_chars as u64 * MAX_BYTES_PER_CHAR)
        } else {
            range.len()
        };
        trace!("Reading snippet {} ({} bytes, cap {})", range, len, max_chars);

        let bytes = self.read_span(range.start, len)?;
        let (text, had_errors) = self.encoding.decode_without_bom_handling(&bytes);
        if had_errors && len == range.len() {
            warn!("Malformed {} in range {}", self.encoding.name(), range);
        }

        let mut text = text.into_owned();
        if max_chars > 0 {
            if let Some((cut, _)) = text.char_indices().nth(max_chars) {
                text.truncate(cut);
            }
        }
        Ok(text)
    }

    /// Consume the reader, returning the source
    pub fn into_inner(self) -> Result<R> {
        self.source.into_inner().map_err(|_| QcmlError::LockPoisoned)
    }

    fn check(&self, range: &ByteRange) -> Result<()> {
        let reason = if range.end < range.start {
            "end precedes start"
        } else if range.end > self.len {
            "range extends past the end of the source"
        } else {
            return Ok(());
        };
        Err(QcmlError::InvalidRange {
            start: range.start,
            end: range.end,
            reason,
        })
    }

    fn read_span(&self, start: u64, len: u64) -> Result<Vec<u8>> {
        let mut source = self.source.lock().map_err(|_| QcmlError::LockPoisoned)?;
        let mut buf = vec![0; len as usize];
        source.seek(SeekFrom::Start(start))?;
        source.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<R> std::fmt::Debug for SnippetReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetReader")
            .field("encoding", &self.encoding.name())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: &[u8], encoding: &'static Encoding) -> SnippetReader<Cursor<Vec<u8>>> {
        SnippetReader::new(Cursor::new(bytes.to_vec()), encoding, bytes.len() as u64)
    }

    #[test]
    fn test_read_range() {
        let r = reader(b"<a><b/></a>", encoding_rs::UTF_8);
        assert_eq!(r.read(&ByteRange::new(3, 7)).unwrap(), "<b/>");
        assert_eq!(r.read(&ByteRange::new(0, 0)).unwrap(), "");
    }

    #[test]
    fn test_read_capped() {
        let r = reader("<cv name=\"αβγδ\"/>".as_bytes(), encoding_rs::UTF_8);
        let all = ByteRange::new(0, r.len());
        assert_eq!(r.read_capped(&all, 12).unwrap(), "<cv name=\"αβ");
        assert_eq!(r.read_capped(&all, 0).unwrap(), "<cv name=\"αβγδ\"/>");
        assert_eq!(r.read_capped(&all, 1000).unwrap(), "<cv name=\"αβγδ\"/>");
    }

    #[test]
    fn test_decodes_with_source_encoding() {
        let r = reader(b"<cv name=\"caf\xE9\"/>", encoding_rs::WINDOWS_1252);
        assert_eq!(r.read(&ByteRange::new(0, r.len())).unwrap(), "<cv name=\"café\"/>");
    }

    #[test]
    fn test_invalid_ranges() {
        let r = reader(b"<a/>", encoding_rs::UTF_8);
        assert!(matches!(
            r.read(&ByteRange::new(3, 1)),
            Err(QcmlError::InvalidRange { .. })
        ));
        assert!(matches!(
            r.read(&ByteRange::new(0, 5)),
            Err(QcmlError::InvalidRange { end: 5, .. })
        ));
    }

    #[test]
    fn test_read_bytes() {
        let r = reader(b"<a/>", encoding_rs::UTF_8);
        assert_eq!(r.read_bytes(&ByteRange::new(1, 2)).unwrap(), b"a");
    }
}
