//! Offset Index
//!
//! One pass over the source records where every selected element starts and
//! ends. Identifiers are pulled from the opening tags afterwards, without
//! parsing anything else.
//!
//! ## Build steps
//!
//! 1. Sniff the encoding from the first bytes
//! 2. Stream the source through [`ChunkScanner`] into an [`IndexBuilder`]
//! 3. Re-read the opening tag of each match and extract its identifier
//!
//! The resulting index is immutable and meant to be shared via `Arc`.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use encoding_rs::Encoding;
use log::{debug, info, warn};

use super::builder::{IndexBuilder, Match, ScanOutput};
use super::selector::{ElementKind, IndexedType};
use super::span::ByteRange;
use crate::core::attributes::find_identifier;
use crate::core::chunk_scanner::{ChunkScanner, DEFAULT_CHUNK_SIZE};
use crate::core::encoding::detect_encoding;
use crate::decode::NamespaceContext;
use crate::error::{QcmlError, Result};

/// Bytes read up front for encoding detection
const HEAD_LEN: usize = 1024;

/// Options controlling how an index is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Bytes read from the source per scan step
    pub chunk_size: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// One indexed element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: String,
    pub kind: ElementKind,
    /// The whole element
    pub range: ByteRange,
    /// The opening tag only
    pub open_tag: ByteRange,
}

/// Entries of one indexed type plus identifier lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TypeIndex {
    entries: Vec<IndexEntry>,
    /// Identifier -> position in `entries` (last occurrence)
    by_id: HashMap<String, usize>,
}

impl TypeIndex {
    fn push(&mut self, entry: IndexEntry) {
        let pos = self.entries.len();
        if let Some(prev) = self.by_id.insert(entry.id.clone(), pos) {
            warn!(
                "Duplicate identifier '{}' for <{}> at {} (previous at {}); lookup uses the later one",
                entry.id,
                entry.kind.tag_name(),
                entry.range,
                self.entries[prev].range
            );
        }
        self.entries.push(entry);
    }
}

/// Byte-offset index over the records and terms of one source
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetIndex {
    records: TypeIndex,
    terms: TypeIndex,
    encoding: &'static Encoding,
    namespaces: NamespaceContext,
    version: Option<String>,
    source_len: u64,
}

impl OffsetIndex {
    /// Build an index with default options
    pub fn build<R: Read + Seek>(source: R) -> Result<Self> {
        Self::build_with(source, &IndexOptions::default())
    }

    /// Build an index, scanning the source in `options.chunk_size` pieces
    pub fn build_with<R: Read + Seek>(mut source: R, options: &IndexOptions) -> Result<Self> {
        info!("Building offset index (chunk size {})", options.chunk_size);

        source.seek(SeekFrom::Start(0))?;
        let mut head = Vec::with_capacity(HEAD_LEN);
        (&mut source).take(HEAD_LEN as u64).read_to_end(&mut head)?;
        let encoding = detect_encoding(&head)?;
        source.seek(SeekFrom::Start(0))?;

        let mut builder = IndexBuilder::new();
        let source_len = ChunkScanner::new(&mut source, options.chunk_size).scan(&mut builder)?;
        let ScanOutput {
            matches,
            namespaces,
            version,
        } = builder.finish()?;
        debug!("Scanned {} bytes, {} selector matches", source_len, matches.len());

        let tags = read_open_tags(&mut source, &matches)?;
        let ids = extract_identifiers(&tags, encoding);

        let mut index = OffsetIndex {
            records: TypeIndex::default(),
            terms: TypeIndex::default(),
            encoding,
            namespaces,
            version,
            source_len,
        };
        for (m, id) in matches.into_iter().zip(ids) {
            let id = id.ok_or_else(|| QcmlError::MissingIdentifier {
                tag: m.kind.tag_name().to_string(),
                offset: m.range.start,
            })?;
            index.type_index_mut(m.kind.indexed_type()).push(IndexEntry {
                id,
                kind: m.kind,
                range: m.range,
                open_tag: m.open_tag,
            });
        }

        info!(
            "Offset index built: {} records, {} terms",
            index.records.entries.len(),
            index.terms.entries.len()
        );
        Ok(index)
    }

    /// Byte range of the element of type `ty` with identifier `id`
    pub fn lookup(&self, ty: IndexedType, id: &str) -> Option<ByteRange> {
        self.lookup_entry(ty, id).map(|entry| entry.range)
    }

    /// Full entry of the element of type `ty` with identifier `id`
    pub fn lookup_entry(&self, ty: IndexedType, id: &str) -> Option<&IndexEntry> {
        let index = self.type_index(ty);
        index.by_id.get(id).map(|&pos| &index.entries[pos])
    }

    /// All entries of a type, in document order
    pub fn entries(&self, ty: IndexedType) -> &[IndexEntry] {
        &self.type_index(ty).entries
    }

    /// Entries produced by one selector, in document order
    pub fn entries_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &IndexEntry> + '_ {
        self.entries(kind.indexed_type())
            .iter()
            .filter(move |entry| entry.kind == kind)
    }

    /// Encoding the source was detected to use
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Namespace declarations of the root element
    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    /// `version` attribute of the root element
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Total length of the source in bytes
    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    fn type_index(&self, ty: IndexedType) -> &TypeIndex {
        match ty {
            IndexedType::Record => &self.records,
            IndexedType::Term => &self.terms,
        }
    }

    fn type_index_mut(&mut self, ty: IndexedType) -> &mut TypeIndex {
        match ty {
            IndexedType::Record => &mut self.records,
            IndexedType::Term => &mut self.terms,
        }
    }
}

/// Read the opening-tag bytes of every match
fn read_open_tags<R: Read + Seek>(source: &mut R, matches: &[Match]) -> Result<Vec<Vec<u8>>> {
    matches
        .iter()
        .map(|m| {
            let mut tag = vec![0; m.open_tag.len() as usize];
            source.seek(SeekFrom::Start(m.open_tag.start))?;
            source.read_exact(&mut tag)?;
            Ok(tag)
        })
        .collect()
}

/// Identifier of one opening tag, read in the source encoding
fn tag_identifier(tag: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _) = encoding.decode_without_bom_handling(tag);
    find_identifier(text.as_bytes())
}

#[cfg(feature = "parallel")]
fn extract_identifiers(tags: &[Vec<u8>], encoding: &'static Encoding) -> Vec<Option<String>> {
    use rayon::prelude::*;

    tags.par_iter().map(|tag| tag_identifier(tag, encoding)).collect()
}

#[cfg(not(feature = "parallel"))]
fn extract_identifiers(tags: &[Vec<u8>], encoding: &'static Encoding) -> Vec<Option<String>> {
    tags.iter().map(|tag| tag_identifier(tag, encoding)).collect()
}
