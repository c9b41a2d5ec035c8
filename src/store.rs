//! Document store
//!
//! The contract a persistent store fulfils, and an in-memory implementation.
//!
//! Writing a document under a key it was stored under before replaces that
//! document's records wholesale but merges its terms by identifier: a term
//! already in the store stays the same shared value and keeps its storage
//! key. Caches of terms keyed by identifier therefore survive writes.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};

use crate::error::{QcmlError, Result};
use crate::model::{Document, Record, RecordKind, Term};

/// Persistence contract for decoded documents
pub trait DocumentStore {
    /// Persist `document` under its key
    fn put(&mut self, document: Document) -> Result<()>;

    /// The document stored under `key`
    fn document(&self, key: &str) -> Option<&Document>;

    /// A record of the document stored under `key`
    fn record(&self, key: &str, kind: RecordKind, id: &str) -> Option<&Record> {
        self.document(key).and_then(|doc| doc.record(kind, id))
    }

    /// A stored term by identifier
    fn term(&self, id: &str) -> Option<Arc<Term>>;
}

/// Store keeping everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    terms: HashMap<String, Arc<Term>>,
    documents: HashMap<String, Document>,
    next_key: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Shared stored term for `term`, storing it if its identifier is new
    fn merge_term(&mut self, term: &Arc<Term>) -> Arc<Term> {
        if let Some(existing) = self.terms.get(&term.id) {
            return Arc::clone(existing);
        }
        if term.storage_key().is_none() {
            self.next_key += 1;
            term.assign_storage_key(self.next_key);
        }
        self.terms.insert(term.id.clone(), Arc::clone(term));
        Arc::clone(term)
    }
}

impl DocumentStore for MemoryStore {
    fn put(&mut self, mut document: Document) -> Result<()> {
        let Some(key) = document.key().map(str::to_owned) else {
            return Err(QcmlError::InvalidReference(
                "document has no key to be stored under".to_string(),
            ));
        };

        let incoming: Vec<Arc<Term>> = document.terms().cloned().collect();
        let merged: Vec<Arc<Term>> = incoming.iter().map(|term| self.merge_term(term)).collect();
        let records = document.take_records();

        let mut stored = match self.documents.remove(&key) {
            Some(mut previous) => {
                let dropped = previous.take_records().len();
                debug!("Replacing {} records of '{}'", dropped, key);
                previous
            }
            None => Document::with_key(key.clone()),
        };
        stored.set_version(document.version().map(str::to_owned));
        for term in merged {
            stored.register_term(term);
        }

        let count = records.len();
        let result = records
            .into_iter()
            .try_for_each(|record| stored.add_record(record).map(drop));
        // The stored document goes back even when a record is rejected
        self.documents.insert(key.clone(), stored);
        result?;

        info!("Stored '{}': {} records, {} terms", key, count, incoming.len());
        Ok(())
    }

    fn document(&self, key: &str) -> Option<&Document> {
        self.documents.get(key)
    }

    fn term(&self, id: &str) -> Option<Arc<Term>> {
        self.terms.get(id).cloned()
    }
}
