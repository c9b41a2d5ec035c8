//! Controlled-vocabulary terms and references to them

use std::sync::{Arc, OnceLock};

/// A controlled vocabulary (`cvList/cv`)
///
/// Immutable once decoded. The only later change is the key a store may
/// assign, which can be set exactly once.
#[derive(Debug, Clone)]
pub struct Term {
    pub id: String,
    /// Display name (`fullName`)
    pub name: String,
    pub uri: String,
    pub version: Option<String>,
    storage_key: OnceLock<u64>,
}

impl Term {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        uri: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            uri: uri.into(),
            version,
            storage_key: OnceLock::new(),
        }
    }

    /// Key assigned by a store, if persisted
    pub fn storage_key(&self) -> Option<u64> {
        self.storage_key.get().copied()
    }

    /// Assign the storage key; returns false if one was already set
    pub fn assign_storage_key(&self, key: u64) -> bool {
        self.storage_key.set(key).is_ok()
    }
}

/// Equality is on the decoded fields; the storage key is not part of it.
impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.uri == other.uri
            && self.version == other.version
    }
}

impl Eq for Term {}

/// Reference from an entity to a term
///
/// The raw identifier is always present. The shared term is only present
/// after resolution.
#[derive(Debug, Clone)]
pub struct TermRef {
    id: String,
    resolved: Option<Arc<Term>>,
}

impl TermRef {
    /// An unresolved reference
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resolved: None,
        }
    }

    /// A reference already pointing at its term
    pub fn to_term(term: Arc<Term>) -> Self {
        Self {
            id: term.id.clone(),
            resolved: Some(term),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resolved term, if any
    pub fn term(&self) -> Option<&Arc<Term>> {
        self.resolved.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Point at `term`; its identifier must match the raw one
    pub fn resolve(&mut self, term: Arc<Term>) {
        debug_assert_eq!(term.id, self.id);
        self.resolved = Some(term);
    }

    /// Forget the resolved term, keeping the identifier
    pub fn unresolve(&mut self) {
        self.resolved = None;
    }
}

/// References compare by identifier; resolution state is transient.
impl PartialEq for TermRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TermRef {}
