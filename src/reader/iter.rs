//! Lazy iterators over indexed elements.
//!
//! Nothing is read ahead: each call to `next` reads exactly one byte range
//! and decodes it. A decode failure is yielded for that element only and the
//! walk carries on with the next one.
//!
//! 1. [`LazyIter`] - decodes each element of one indexed type into any
//!    [`FromElement`] value
//! 2. [`RecordIter`] - decodes records and resolves their term references,
//!    registering decoded terms in the handle's document

use std::io::{Read, Seek};
use std::marker::PhantomData;
use std::slice;
use std::sync::Arc;

use log::trace;

use super::snippet::SnippetReader;
use crate::decode::{DecodeContext, FromElement};
use crate::error::{QcmlError, Result};
use crate::index::{IndexEntry, IndexedType, OffsetIndex};
use crate::model::{Document, Record, RecordKind, Term};
use crate::resolve::{resolve, ResolveReport, TermCache, TermSource};
use crate::shape::{from_wire, WireRecord};

/// Iterator decoding every element of one indexed type
///
/// Created by [`QcmlReader::iter()`](crate::QcmlReader::iter).
pub struct LazyIter<'a, T, R> {
    entries: slice::Iter<'a, IndexEntry>,
    snippets: &'a SnippetReader<R>,
    decoder: &'a DecodeContext,
    _target: PhantomData<fn() -> T>,
}

impl<'a, T, R> LazyIter<'a, T, R> {
    pub(super) fn new(
        entries: &'a [IndexEntry],
        snippets: &'a SnippetReader<R>,
        decoder: &'a DecodeContext,
    ) -> Self {
        Self {
            entries: entries.iter(),
            snippets,
            decoder,
            _target: PhantomData,
        }
    }
}

impl<T: FromElement, R: Read + Seek> Iterator for LazyIter<'_, T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        trace!("Decoding <{}> '{}' at {}", entry.kind.tag_name(), entry.id, entry.range);
        Some(
            self.snippets
                .read(&entry.range)
                .and_then(|text| self.decoder.decode_as(&text)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<T: FromElement, R: Read + Seek> ExactSizeIterator for LazyIter<'_, T, R> {}

/// Term lookup through a document's registry, falling back to decoding the
/// term from the index and registering it
pub struct DocumentTerms<'a, R> {
    pub(super) index: &'a OffsetIndex,
    pub(super) snippets: &'a SnippetReader<R>,
    pub(super) decoder: &'a DecodeContext,
    pub(super) document: &'a mut Document,
}

impl<R: Read + Seek> TermSource for DocumentTerms<'_, R> {
    fn find_term(&mut self, id: &str) -> Result<Option<Arc<Term>>> {
        if let Some(term) = self.document.term(id) {
            return Ok(Some(Arc::clone(term)));
        }
        let Some(range) = self.index.lookup(IndexedType::Term, id) else {
            return Ok(None);
        };
        trace!("Decoding term '{}' at {}", id, range);
        let text = self.snippets.read(&range)?;
        let term: Term = self.decoder.decode_as(&text)?;
        Ok(Some(self.document.register_term(term)))
    }
}

/// Decode one record entry: generic decode, reshape, then resolve
pub(super) fn decode_record<R: Read + Seek>(
    entry: &IndexEntry,
    terms: &mut DocumentTerms<'_, R>,
    cache: &mut TermCache,
) -> Result<(Record, ResolveReport)> {
    trace!("Decoding <{}> '{}' at {}", entry.kind.tag_name(), entry.id, entry.range);
    let text = terms.snippets.read(&entry.range)?;
    let element = terms.decoder.decode_generic(&text)?;
    let wire = WireRecord::from_element(&element)?;
    if wire.kind.element_kind() != entry.kind {
        return Err(QcmlError::decode(
            &element.name,
            format!("indexed as <{}>", entry.kind.tag_name()),
        ));
    }
    let mut record = from_wire(wire)?;
    let report = resolve(&mut record, cache, terms)?;
    Ok((record, report))
}

/// Iterator over records with references resolved
///
/// Each iterator owns its resolution cache. It borrows the handle mutably,
/// because terms it decodes are registered in the handle's document.
///
/// Created by [`QcmlReader::records()`](crate::QcmlReader::records),
/// [`runs()`](crate::QcmlReader::runs) and [`sets()`](crate::QcmlReader::sets).
pub struct RecordIter<'a, R> {
    entries: slice::Iter<'a, IndexEntry>,
    kind: Option<RecordKind>,
    terms: DocumentTerms<'a, R>,
    cache: TermCache,
    last_report: Option<ResolveReport>,
}

impl<'a, R> RecordIter<'a, R> {
    pub(super) fn new(
        entries: &'a [IndexEntry],
        kind: Option<RecordKind>,
        terms: DocumentTerms<'a, R>,
    ) -> Self {
        Self {
            entries: entries.iter(),
            kind,
            terms,
            cache: TermCache::new(),
            last_report: None,
        }
    }

    /// The resolution cache owned by this iterator
    pub fn cache(&self) -> &TermCache {
        &self.cache
    }

    /// Resolution outcome of the most recently yielded record
    pub fn last_report(&self) -> Option<&ResolveReport> {
        self.last_report.as_ref()
    }
}

impl<R: Read + Seek> Iterator for RecordIter<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.kind;
        let entry = self
            .entries
            .by_ref()
            .find(|e| kind.is_none_or(|k| k.element_kind() == e.kind))?;

        self.last_report = None;
        Some(
            decode_record(entry, &mut self.terms, &mut self.cache).map(|(record, report)| {
                self.last_report = Some(report);
                record
            }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.kind {
            None => self.entries.size_hint(),
            Some(_) => (0, Some(self.entries.len())),
        }
    }
}
