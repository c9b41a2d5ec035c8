//! Chunked Scanner with ScanHandler Trait
//!
//! Scans a source that is read in fixed-size chunks, so the whole document
//! is never resident. Only element boundaries are reported; text, comments,
//! CDATA, processing instructions and DOCTYPE are skipped. A token cut off by
//! a chunk boundary is kept in the buffer and rescanned once more input has
//! arrived; for comments, CDATA and processing instructions the terminator
//! search picks up where the previous window stopped. Offsets handed to the handler are absolute byte offsets into the
//! source.

use std::io::{ErrorKind, Read};

use super::scanner::Scanner;
use crate::error::{QcmlError, Result};

/// Default chunk size for reading the source (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Trait for handling element boundaries
///
/// Implement this trait to receive element events. `start` is the offset of
/// the `<` and `end` the offset one past the `>`.
pub trait ScanHandler {
    /// Called when an element starts
    ///
    /// # Arguments
    /// * `name` - Qualified element name
    /// * `tag` - The complete opening tag, from `<` to `>`
    /// * `is_empty` - True if this is a self-closing element (e.g., `<cv/>`)
    fn start_element(&mut self, name: &[u8], tag: &[u8], start: u64, end: u64, is_empty: bool);

    /// Called when an element ends
    fn end_element(&mut self, name: &[u8], start: u64, end: u64);
}

/// Result of scanning the currently buffered window
struct Window {
    /// Bytes fully processed and safe to discard
    consumed: usize,
    /// Offset (in the window) of a token that needs more input
    pending: Option<usize>,
    /// Terminator search progress for the pending token
    resume: Option<Resume>,
}

/// How far the terminator of a long token has already been searched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resume {
    /// Absolute offset of the token's `<`
    start: u64,
    /// Absolute offset the next search starts from
    from: u64,
}

/// Scanner that pulls chunks from a reader and dispatches to a ScanHandler
pub struct ChunkScanner<R> {
    source: R,
    chunk_size: usize,
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]`
    base: u64,
    eof: bool,
    resume: Option<Resume>,
}

impl<R: Read> ChunkScanner<R> {
    /// Create a scanner reading `chunk_size` bytes at a time
    pub fn new(source: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(16);
        Self {
            source,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            base: 0,
            eof: false,
            resume: None,
        }
    }

    /// Scan the entire source, calling handler methods for each element boundary
    ///
    /// Returns the total number of bytes read.
    pub fn scan<H: ScanHandler>(&mut self, handler: &mut H) -> Result<u64> {
        loop {
            self.fill()?;
            let window = self.scan_window(handler);
            self.resume = window.resume;
            self.buffer.drain(..window.consumed);
            self.base += window.consumed as u64;

            if self.eof {
                if let Some(pending) = window.pending {
                    return Err(QcmlError::UnterminatedMarkup(
                        self.base + (pending - window.consumed) as u64,
                    ));
                }
                return Ok(self.base + self.buffer.len() as u64);
            }
        }
    }

    /// Append up to one chunk to the buffer
    fn fill(&mut self) -> Result<()> {
        let old_len = self.buffer.len();
        self.buffer.resize(old_len + self.chunk_size, 0);
        loop {
            match self.source.read(&mut self.buffer[old_len..]) {
                Ok(n) => {
                    self.buffer.truncate(old_len + n);
                    self.eof = n == 0;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.truncate(old_len);
                    return Err(e.into());
                }
            }
        }
    }

    /// Dispatch every complete token in the buffer
    fn scan_window<H: ScanHandler>(&self, handler: &mut H) -> Window {
        let buf = &self.buffer[..];
        let mut scanner = Scanner::new(buf);

        loop {
            let Some(lt) = scanner.find_tag_start() else {
                return Window { consumed: buf.len(), pending: None, resume: None };
            };
            scanner.set_position(lt);
            let need_more = Window { consumed: lt, pending: Some(lt), resume: None };

            // "<![CDATA[" is the longest prefix we need to classify a token
            if buf.len() - lt < 9 && !self.eof {
                return need_more;
            }

            let next = match scanner.peek_at(1) {
                Some(b'/') => match scanner.find_tag_end_quoted() {
                    Some(gt) => {
                        let name = scanner.name_at(lt + 2).unwrap_or_default();
                        handler.end_element(name, self.abs(lt), self.abs(gt + 1));
                        gt + 1
                    }
                    None => return need_more,
                },
                Some(b'!') if scanner.starts_with(b"<!--") => {
                    match self.find_terminator(&scanner, lt, 4, b"-->") {
                        Ok(next) => next,
                        Err(resume) => return Window { resume: Some(resume), ..need_more },
                    }
                }
                Some(b'!') if scanner.starts_with(b"<![CDATA[") => {
                    match self.find_terminator(&scanner, lt, 9, b"]]>") {
                        Ok(next) => next,
                        Err(resume) => return Window { resume: Some(resume), ..need_more },
                    }
                }
                Some(b'!') => match scanner.find_doctype_end() {
                    Some(gt) => gt + 1,
                    None => return need_more,
                },
                Some(b'?') => match self.find_terminator(&scanner, lt, 2, b"?>") {
                    Ok(next) => next,
                    Err(resume) => return Window { resume: Some(resume), ..need_more },
                },
                Some(_) => match scanner.name_at(lt + 1) {
                    Some(name) => match scanner.find_tag_end_quoted() {
                        Some(gt) => {
                            let tag = &buf[lt..=gt];
                            let is_empty = gt > lt && buf[gt - 1] == b'/';
                            handler.start_element(
                                name,
                                tag,
                                self.abs(lt),
                                self.abs(gt + 1),
                                is_empty,
                            );
                            gt + 1
                        }
                        None => return need_more,
                    },
                    // Stray '<' in text
                    None => lt + 1,
                },
                None => return need_more,
            };
            scanner.set_position(next);
        }
    }

    /// Offset past `close` for the token at `lt`, skipping bytes an earlier
    /// window already searched. On a miss, returns where to continue.
    fn find_terminator(
        &self,
        scanner: &Scanner<'_>,
        lt: usize,
        open_len: usize,
        close: &[u8],
    ) -> std::result::Result<usize, Resume> {
        let mut from = lt + open_len;
        if let Some(resume) = self.resume.filter(|r| r.start == self.abs(lt)) {
            from = from.max((resume.from - self.base) as usize);
        }
        match scanner.find_seq(from, close) {
            Some(end) => Ok(end + close.len()),
            None => {
                // the terminator may straddle the refill
                let searched = self.buffer.len().saturating_sub(close.len() - 1).max(from);
                Err(Resume { start: self.abs(lt), from: self.abs(searched) })
            }
        }
    }

    #[inline]
    fn abs(&self, pos: usize) -> u64 {
        self.base + pos as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test handler that records events as strings
    #[derive(Default)]
    struct TestHandler {
        events: Vec<String>,
    }

    impl ScanHandler for TestHandler {
        fn start_element(&mut self, name: &[u8], _tag: &[u8], start: u64, end: u64, is_empty: bool) {
            self.events.push(format!(
                "start {} {}..{}{}",
                String::from_utf8_lossy(name),
                start,
                end,
                if is_empty { " empty" } else { "" }
            ));
        }

        fn end_element(&mut self, name: &[u8], start: u64, end: u64) {
            self.events
                .push(format!("end {} {}..{}", String::from_utf8_lossy(name), start, end));
        }
    }

    fn scan(input: &[u8], chunk: usize) -> Result<Vec<String>> {
        let mut handler = TestHandler::default();
        ChunkScanner::new(input, chunk).scan(&mut handler)?;
        Ok(handler.events)
    }

    #[test]
    fn test_simple_elements() {
        let events = scan(b"<a><b/></a>", 1024).unwrap();
        assert_eq!(
            events,
            vec!["start a 0..3", "start b 3..7 empty", "end a 7..11"]
        );
    }

    #[test]
    fn test_chunk_size_does_not_change_events() {
        let input = b"<?xml version=\"1.0\"?><!-- c > --><root x=\"a>b\"><![CDATA[<no/>]]><item id='1'/>text</root>";
        let expected = scan(input, 4096).unwrap();
        for chunk in [16, 17, 23, 31] {
            assert_eq!(scan(input, chunk).unwrap(), expected, "chunk size {}", chunk);
        }
        assert_eq!(expected.len(), 3);
    }

    #[test]
    fn test_skips_non_element_markup() {
        let events = scan(b"<!DOCTYPE r [<!ENTITY e 'x'>]><r><?pi data?></r>", 1024).unwrap();
        assert_eq!(events, vec!["start r 30..33", "end r 44..48"]);
    }

    #[test]
    fn test_stray_lt_is_text() {
        let events = scan(b"<a>1 < 2</a>", 1024).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unterminated_tag() {
        let err = scan(b"<a><b attr=\"x", 1024).unwrap_err();
        assert!(matches!(err, QcmlError::UnterminatedMarkup(3)));
    }

    #[test]
    fn test_long_comment_across_chunks() {
        let mut input = b"<r><!--".to_vec();
        for _ in 0..500 {
            input.extend_from_slice(b"- -- -> ]]> ?");
        }
        input.extend_from_slice(b"--><![CDATA[");
        for _ in 0..300 {
            input.extend_from_slice(b"]] ]>]");
        }
        input.extend_from_slice(b"]]><?pi ? ?? ?><a/></r>");
        let a = input.len() - 8;

        let expected = vec![
            "start r 0..3".to_string(),
            format!("start a {}..{} empty", a, a + 4),
            format!("end r {}..{}", a + 4, a + 8),
        ];
        for chunk in [16, 17, 18, 19, 64, 4096] {
            assert_eq!(scan(&input, chunk).unwrap(), expected, "chunk size {}", chunk);
        }
    }

    #[test]
    fn test_unterminated_comment() {
        let mut input = b"<r>".to_vec();
        input.extend_from_slice(b"<!-- never closed -");
        input.extend(std::iter::repeat(b'x').take(200));
        let err = scan(&input, 16).unwrap_err();
        assert!(matches!(err, QcmlError::UnterminatedMarkup(3)));
    }

    #[test]
    fn test_empty_source() {
        assert!(scan(b"", 1024).unwrap().is_empty());
    }
}
