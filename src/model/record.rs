//! Quality records (`runQuality` / `setQuality`)

use std::collections::HashMap;

use super::document::DocumentId;
use super::entry::{Attachment, Entry, MetaDataParameter, QualityParameter};
use super::term::TermRef;
use crate::index::ElementKind;

/// Whether a record describes one run or a set of runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Run,
    Set,
}

impl RecordKind {
    /// The selector that indexes records of this kind
    pub const fn element_kind(self) -> ElementKind {
        match self {
            RecordKind::Run => ElementKind::Run,
            RecordKind::Set => ElementKind::Set,
        }
    }

    /// Kind for a record element; terms are not records
    pub const fn from_element_kind(kind: ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Run => Some(RecordKind::Run),
            ElementKind::Set => Some(RecordKind::Set),
            ElementKind::Term => None,
        }
    }

    pub const fn tag_name(self) -> &'static str {
        self.element_kind().tag_name()
    }
}

/// A quality record: three entry maps keyed by accession
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    kind: RecordKind,
    metadata: HashMap<String, MetaDataParameter>,
    quality: HashMap<String, QualityParameter>,
    attachments: HashMap<String, Attachment>,
    /// Owning document, set by `Document::add_record`
    document: Option<DocumentId>,
}

/// Insert an entry keyed by accession, attaching it to `record_id`; the
/// replaced entry comes back detached
fn insert_entry<E: Entry>(map: &mut HashMap<String, E>, record_id: &str, mut entry: E) -> Option<E> {
    entry.set_record(Some(record_id.to_string()));
    let replaced = map.insert(entry.accession().to_string(), entry);
    replaced.map(detach)
}

fn detach<E: Entry>(mut entry: E) -> E {
    entry.set_record(None);
    entry
}

impl Record {
    pub fn new(id: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            id: id.into(),
            kind,
            metadata: HashMap::new(),
            quality: HashMap::new(),
            attachments: HashMap::new(),
            document: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Owning document, if the record has been added to one
    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    pub(crate) fn set_document(&mut self, document: Option<DocumentId>) {
        self.document = document;
    }

    // Metadata

    pub fn add_metadata(&mut self, entry: MetaDataParameter) -> Option<MetaDataParameter> {
        insert_entry(&mut self.metadata, &self.id, entry)
    }

    pub fn metadata(&self, accession: &str) -> Option<&MetaDataParameter> {
        self.metadata.get(accession)
    }

    pub fn remove_metadata(&mut self, accession: &str) -> Option<MetaDataParameter> {
        self.metadata.remove(accession).map(detach)
    }

    pub fn metadata_entries(&self) -> impl Iterator<Item = &MetaDataParameter> {
        self.metadata.values()
    }

    // Quality parameters

    pub fn add_quality(&mut self, entry: QualityParameter) -> Option<QualityParameter> {
        insert_entry(&mut self.quality, &self.id, entry)
    }

    pub fn quality(&self, accession: &str) -> Option<&QualityParameter> {
        self.quality.get(accession)
    }

    pub fn quality_mut(&mut self, accession: &str) -> Option<&mut QualityParameter> {
        self.quality.get_mut(accession)
    }

    pub fn remove_quality(&mut self, accession: &str) -> Option<QualityParameter> {
        self.quality.remove(accession).map(detach)
    }

    pub fn quality_entries(&self) -> impl Iterator<Item = &QualityParameter> {
        self.quality.values()
    }

    // Attachments

    pub fn add_attachment(&mut self, entry: Attachment) -> Option<Attachment> {
        insert_entry(&mut self.attachments, &self.id, entry)
    }

    pub fn attachment(&self, accession: &str) -> Option<&Attachment> {
        self.attachments.get(accession)
    }

    pub fn attachment_mut(&mut self, accession: &str) -> Option<&mut Attachment> {
        self.attachments.get_mut(accession)
    }

    pub fn remove_attachment(&mut self, accession: &str) -> Option<Attachment> {
        self.attachments.remove(accession).map(detach)
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.values()
    }

    /// The quality parameter an attachment links to, if it exists here
    pub fn linked_parameter(&self, attachment: &str) -> Option<&QualityParameter> {
        let link = self.attachments.get(attachment)?.link()?;
        self.quality.get(&link.accession)
    }

    /// Mark every attachment link as linked or not, by looking the target
    /// up in this record's quality parameters
    ///
    /// Returns the accessions of links with no target.
    pub fn link_attachments(&mut self) -> Vec<String> {
        let mut dangling = Vec::new();
        for attachment in self.attachments.values_mut() {
            if let Some(link) = attachment.link_mut() {
                link.linked = self.quality.contains_key(&link.accession);
                if !link.linked {
                    dangling.push(link.accession.clone());
                }
            }
        }
        dangling
    }

    /// Total number of entries across all three maps
    pub fn entry_count(&self) -> usize {
        self.metadata.len() + self.quality.len() + self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Visit every term reference held by this record's entries
    pub fn visit_term_refs(&self, visit: &mut dyn FnMut(&TermRef)) {
        for entry in self.metadata.values() {
            entry.visit_term_refs(&mut *visit);
        }
        for entry in self.quality.values() {
            entry.visit_term_refs(&mut *visit);
        }
        for entry in self.attachments.values() {
            entry.visit_term_refs(&mut *visit);
        }
    }

    pub fn visit_term_refs_mut(&mut self, visit: &mut dyn FnMut(&mut TermRef)) {
        for entry in self.metadata.values_mut() {
            entry.visit_term_refs_mut(&mut *visit);
        }
        for entry in self.quality.values_mut() {
            entry.visit_term_refs_mut(&mut *visit);
        }
        for entry in self.attachments.values_mut() {
            entry.visit_term_refs_mut(&mut *visit);
        }
    }

    /// Identifiers of every referenced term, possibly repeated
    pub fn term_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.visit_term_refs(&mut |r| ids.push(r.id().to_string()));
        ids
    }
}
