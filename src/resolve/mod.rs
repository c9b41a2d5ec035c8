//! Reference Resolver
//!
//! Points every term reference of a decoded record at a shared term.
//! Lookups go through a [`TermCache`] first, then a [`TermSource`] that may
//! decode the term on demand. A term that cannot be found leaves its
//! reference unresolved and is reported, not raised.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::error::Result;
use crate::model::{Record, Term, TermRef};

/// Somewhere terms can be looked up by identifier
pub trait TermSource {
    /// Find a term; `Ok(None)` when it does not exist
    fn find_term(&mut self, id: &str) -> Result<Option<Arc<Term>>>;
}

impl TermSource for HashMap<String, Arc<Term>> {
    fn find_term(&mut self, id: &str) -> Result<Option<Arc<Term>>> {
        Ok(self.get(id).cloned())
    }
}

/// Resolution cache keyed by term identifier
#[derive(Debug, Default, Clone)]
pub struct TermCache {
    terms: HashMap<String, Arc<Term>>,
    hits: u64,
    misses: u64,
}

impl TermCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, id: &str) -> Option<Arc<Term>> {
        let found = self.terms.get(id).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, term: Arc<Term>) {
        self.terms.insert(term.id.clone(), term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Outcome of resolving one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// References pointed at a term
    pub resolved: usize,
    /// Term identifiers that could not be found, sorted and deduplicated
    pub missing: Vec<String>,
    /// Attachment links to quality parameters missing from the record
    pub dangling_links: Vec<String>,
}

impl ResolveReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.dangling_links.is_empty()
    }
}

/// Resolve every term reference in `record`, and its attachment links
pub fn resolve<S: TermSource + ?Sized>(
    record: &mut Record,
    cache: &mut TermCache,
    source: &mut S,
) -> Result<ResolveReport> {
    let mut report = ResolveReport::default();

    // Lookups may fail; no reference is touched until all are done
    let mut ids = record.term_ids();
    ids.sort();
    ids.dedup();

    let mut found: HashMap<String, Arc<Term>> = HashMap::with_capacity(ids.len());
    for id in ids {
        let term = match cache.get(&id) {
            Some(term) => Some(term),
            None => {
                let term = source.find_term(&id)?;
                if let Some(term) = &term {
                    trace!("Term '{}' fetched from source", id);
                    cache.insert(Arc::clone(term));
                }
                term
            }
        };
        match term {
            Some(term) => {
                found.insert(id, term);
            }
            None => report.missing.push(id),
        }
    }

    record.visit_term_refs_mut(&mut |r: &mut TermRef| match found.get(r.id()) {
        Some(term) => {
            r.resolve(Arc::clone(term));
            report.resolved += 1;
        }
        None => r.unresolve(),
    });
    report.dangling_links = record.link_attachments();

    if !report.is_complete() {
        debug!(
            "Record '{}': missing terms {:?}, dangling links {:?}",
            record.id(),
            report.missing,
            report.dangling_links
        );
    }
    Ok(report)
}
