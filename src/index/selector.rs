//! Indexed element selectors
//!
//! The set of elements reachable by random access is fixed: primary and
//! aggregate quality records, and the controlled-vocabulary terms.

/// Which selector produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `/qcML/runQuality`
    Run,
    /// `/qcML/setQuality`
    Set,
    /// `/qcML/cvList/cv`
    Term,
}

/// Output type an element decodes to
///
/// Runs and sets share one wire shape, so both are indexed as `Record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedType {
    Record,
    Term,
}

impl ElementKind {
    /// The indexed type this kind of element decodes to
    pub const fn indexed_type(self) -> IndexedType {
        match self {
            ElementKind::Run | ElementKind::Set => IndexedType::Record,
            ElementKind::Term => IndexedType::Term,
        }
    }

    /// Local element name as it appears in the source
    pub const fn tag_name(self) -> &'static str {
        match self {
            ElementKind::Run => "runQuality",
            ElementKind::Set => "setQuality",
            ElementKind::Term => "cv",
        }
    }

    /// Map a local element name back to its kind
    pub fn from_tag_name(name: &str) -> Option<Self> {
        SELECTORS
            .iter()
            .map(|s| s.kind)
            .find(|kind| kind.tag_name() == name)
    }
}

/// A path-like expression matching elements by their chain of local names
#[derive(Debug, Clone, Copy)]
pub struct Selector {
    pub steps: &'static [&'static str],
    pub kind: ElementKind,
}

impl Selector {
    /// Check whether an open-element path (root first) matches this selector
    pub fn matches<P: AsRef<[u8]>>(&self, path: &[P]) -> bool {
        self.steps.len() == path.len()
            && self
                .steps
                .iter()
                .zip(path)
                .all(|(step, name)| step.as_bytes() == name.as_ref())
    }
}

/// The configured selectors
pub const SELECTORS: &[Selector] = &[
    Selector {
        steps: &["qcML", "runQuality"],
        kind: ElementKind::Run,
    },
    Selector {
        steps: &["qcML", "setQuality"],
        kind: ElementKind::Set,
    },
    Selector {
        steps: &["qcML", "cvList", "cv"],
        kind: ElementKind::Term,
    },
];

/// Find the selector matching an open-element path
pub fn match_path<P: AsRef<[u8]>>(path: &[P]) -> Option<ElementKind> {
    SELECTORS.iter().find(|s| s.matches(path)).map(|s| s.kind)
}
