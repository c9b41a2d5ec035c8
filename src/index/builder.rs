//! Index Builder
//!
//! Collects selector matches from scan events. Implements the ScanHandler
//! trait for use with ChunkScanner.
//!
//! Memory-efficient: the builder keeps only the stack of open element names
//! and one small record per match. Identifiers are extracted afterwards from
//! the opening-tag bytes, so nothing else of the document is retained.

use super::selector::{match_path, ElementKind};
use super::span::ByteRange;
use crate::core::attributes::{namespace_declarations, parse_tag_attributes};
use crate::core::chunk_scanner::ScanHandler;
use crate::core::scanner::local_name;
use crate::decode::NamespaceContext;
use crate::error::{QcmlError, Result};

/// An element matched by a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub kind: ElementKind,
    /// Whole element, opening tag to closing tag
    pub range: ByteRange,
    /// Opening tag only
    pub open_tag: ByteRange,
}

/// Everything the scan learned about the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    /// Selector matches in document order
    pub matches: Vec<Match>,
    pub namespaces: NamespaceContext,
    /// `version` attribute of the root element
    pub version: Option<String>,
}

/// Match whose closing tag has not been seen yet
struct OpenMatch {
    kind: ElementKind,
    start: u64,
    open_end: u64,
    end: Option<u64>,
}

/// Builder state for collecting selector matches
pub struct IndexBuilder {
    /// Local names of open elements, root first
    path: Vec<Vec<u8>>,
    /// For each open element, the match it started (if any)
    open: Vec<Option<usize>>,
    matches: Vec<OpenMatch>,
    namespaces: Option<NamespaceContext>,
    version: Option<String>,
}

impl IndexBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            path: Vec::with_capacity(16),
            open: Vec::with_capacity(16),
            matches: Vec::new(),
            namespaces: None,
            version: None,
        }
    }

    /// Handle start of an element
    pub fn start_element(&mut self, name: &[u8], tag: &[u8], start: u64, end: u64, is_empty: bool) {
        if self.path.is_empty() && self.namespaces.is_none() {
            self.namespaces = Some(NamespaceContext::new(
                String::from_utf8_lossy(name).into_owned(),
                namespace_declarations(tag),
            ));
            self.version = parse_tag_attributes(tag)
                .into_iter()
                .find(|attr| attr.name == b"version")
                .and_then(|attr| attr.value_str().map(str::to_owned));
        }

        self.path.push(local_name(name).to_vec());
        let matched = match_path(&self.path).map(|kind| {
            self.matches.push(OpenMatch {
                kind,
                start,
                open_end: end,
                end: is_empty.then_some(end),
            });
            self.matches.len() - 1
        });

        if is_empty {
            self.path.pop();
        } else {
            self.open.push(matched);
        }
    }

    /// Handle end of an element
    ///
    /// End tags are trusted to close the innermost open element; name
    /// mismatches are left for the fragment decoder to report.
    pub fn end_element(&mut self, _name: &[u8], end: u64) {
        self.path.pop();
        if let Some(Some(idx)) = self.open.pop() {
            self.matches[idx].end = Some(end);
        }
    }

    /// Finish building; fails if a matched element was never closed
    pub fn finish(self) -> Result<ScanOutput> {
        let matches = self
            .matches
            .into_iter()
            .map(|m| match m.end {
                Some(end) => Ok(Match {
                    kind: m.kind,
                    range: ByteRange::new(m.start, end),
                    open_tag: ByteRange::new(m.start, m.open_end),
                }),
                None => Err(QcmlError::UnclosedElement {
                    tag: m.kind.tag_name().to_string(),
                    offset: m.start,
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ScanOutput {
            matches,
            namespaces: self.namespaces.unwrap_or_default(),
            version: self.version,
        })
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanHandler for IndexBuilder {
    fn start_element(&mut self, name: &[u8], tag: &[u8], start: u64, end: u64, is_empty: bool) {
        IndexBuilder::start_element(self, name, tag, start, end, is_empty);
    }

    fn end_element(&mut self, name: &[u8], _start: u64, end: u64) {
        IndexBuilder::end_element(self, name, end);
    }
}
