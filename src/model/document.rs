//! The document root and its registries

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::record::{Record, RecordKind};
use super::term::{Term, TermRef};
use crate::error::{QcmlError, Result};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Document`], used as back-reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// A qcML document: term registry plus run and set records
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    /// External key a store files the document under
    key: Option<String>,
    /// `version` attribute of the root
    version: Option<String>,
    terms: HashMap<String, Arc<Term>>,
    runs: HashMap<String, Record>,
    sets: HashMap<String, Record>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: DocumentId::next(),
            key: None,
            version: None,
            terms: HashMap::new(),
            runs: HashMap::new(),
            sets: HashMap::new(),
        }
    }

    /// Create a document filed under `key`
    pub fn with_key(key: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.key = Some(key.into());
        doc
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    // Terms

    /// Register a term, unique by identifier
    ///
    /// If the identifier is already registered the existing shared term is
    /// returned and `term` is dropped.
    pub fn register_term(&mut self, term: impl Into<Arc<Term>>) -> Arc<Term> {
        let term = term.into();
        Arc::clone(self.terms.entry(term.id.clone()).or_insert(term))
    }

    pub fn term(&self, id: &str) -> Option<&Arc<Term>> {
        self.terms.get(id)
    }

    pub fn terms(&self) -> impl Iterator<Item = &Arc<Term>> {
        self.terms.values()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    // Records

    /// Add a record, replacing any record of the same kind and identifier
    ///
    /// Every term the record references must already be registered; its
    /// references are pointed at the registered terms. Returns the replaced
    /// record, detached.
    pub fn add_record(&mut self, mut record: Record) -> Result<Option<Record>> {
        if let Some(term) = record.term_ids().into_iter().find(|id| !self.terms.contains_key(id)) {
            return Err(QcmlError::UnknownTerm {
                owner: record.id().to_string(),
                term,
            });
        }

        let terms = &self.terms;
        record.visit_term_refs_mut(&mut |r: &mut TermRef| {
            if let Some(term) = terms.get(r.id()) {
                r.resolve(Arc::clone(term));
            }
        });
        record.set_document(Some(self.id));

        let replaced = self
            .records_mut(record.kind())
            .insert(record.id().to_string(), record);
        Ok(replaced.map(|mut old| {
            old.set_document(None);
            old
        }))
    }

    /// Remove a record, clearing its back-reference
    pub fn remove_record(&mut self, kind: RecordKind, id: &str) -> Option<Record> {
        self.records_mut(kind).remove(id).map(|mut record| {
            record.set_document(None);
            record
        })
    }

    pub fn record(&self, kind: RecordKind, id: &str) -> Option<&Record> {
        self.records_map(kind).get(id)
    }

    /// Records of one kind, in no particular order
    pub fn records(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records_map(kind).values()
    }

    pub fn runs(&self) -> impl Iterator<Item = &Record> {
        self.records(RecordKind::Run)
    }

    pub fn sets(&self) -> impl Iterator<Item = &Record> {
        self.records(RecordKind::Set)
    }

    pub fn record_count(&self, kind: RecordKind) -> usize {
        self.records_map(kind).len()
    }

    /// Detach all records, leaving the term registry in place
    pub fn take_records(&mut self) -> Vec<Record> {
        let mut records: Vec<Record> = self.runs.drain().chain(self.sets.drain()).map(|(_, r)| r).collect();
        for record in &mut records {
            record.set_document(None);
        }
        records
    }

    fn records_map(&self, kind: RecordKind) -> &HashMap<String, Record> {
        match kind {
            RecordKind::Run => &self.runs,
            RecordKind::Set => &self.sets,
        }
    }

    fn records_mut(&mut self, kind: RecordKind) -> &mut HashMap<String, Record> {
        match kind {
            RecordKind::Run => &mut self.runs,
            RecordKind::Set => &mut self.sets,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::{CvParameter, QualityParameter};

    fn run_with(term: &str) -> Record {
        let mut record = Record::new("run_0", RecordKind::Run);
        record.add_quality(QualityParameter::new(CvParameter::new("QC:1", "n", term)));
        record
    }

    #[test]
    fn test_register_term_returns_existing() {
        let mut doc = Document::new();
        let first = doc.register_term(Term::new("cv_0", "A", "u", None));
        let second = doc.register_term(Term::new("cv_0", "B", "v", None));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name, "A");
        assert_eq!(doc.term_count(), 1);
    }

    #[test]
    fn test_add_record_requires_registered_terms() {
        let mut doc = Document::new();
        let err = doc.add_record(run_with("cv_0")).unwrap_err();
        assert!(matches!(err, QcmlError::UnknownTerm { ref term, .. } if term == "cv_0"));
        assert_eq!(doc.record_count(RecordKind::Run), 0);
    }

    #[test]
    fn test_add_record_points_at_registry() {
        let mut doc = Document::new();
        let term = doc.register_term(Term::new("cv_0", "A", "u", None));
        doc.add_record(run_with("cv_0")).unwrap();

        let record = doc.record(RecordKind::Run, "run_0").unwrap();
        assert_eq!(record.document(), Some(doc.id()));
        let qp = record.quality("QC:1").unwrap();
        assert!(Arc::ptr_eq(qp.param.term().term().unwrap(), &term));
    }

    #[test]
    fn test_replace_and_remove_clear_back_reference() {
        let mut doc = Document::new();
        doc.register_term(Term::new("cv_0", "A", "u", None));
        doc.add_record(run_with("cv_0")).unwrap();
        let replaced = doc.add_record(run_with("cv_0")).unwrap().unwrap();
        assert_eq!(replaced.document(), None);

        let removed = doc.remove_record(RecordKind::Run, "run_0").unwrap();
        assert_eq!(removed.document(), None);
        assert_eq!(doc.runs().count(), 0);
    }

    #[test]
    fn test_document_ids_unique() {
        assert_ne!(Document::new().id(), Document::new().id());
    }
}
