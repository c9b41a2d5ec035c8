//! Record entries
//!
//! Every entry shares the [`CvParameter`] fields: a mandatory term
//! reference, an optional unit term reference and a few strings. Owning
//! containers set and clear the back-references.

use std::collections::HashMap;
use std::sync::Arc;

use super::table::Table;
use super::term::{Term, TermRef};
use crate::error::{QcmlError, Result};

/// Fields common to every entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvParameter {
    /// `ID` attribute; thresholds usually have none
    pub id: Option<String>,
    pub name: String,
    pub accession: String,
    pub value: Option<String>,
    pub unit_accession: Option<String>,
    pub unit_name: Option<String>,
    term: TermRef,
    unit: Option<TermRef>,
}

impl CvParameter {
    pub fn new(accession: impl Into<String>, name: impl Into<String>, term_id: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            accession: accession.into(),
            value: None,
            unit_accession: None,
            unit_name: None,
            term: TermRef::new(term_id),
            unit: None,
        }
    }

    /// Mandatory term reference (`cvRef`)
    pub fn term(&self) -> &TermRef {
        &self.term
    }

    /// Optional unit term reference (`unitCvRef`)
    pub fn unit(&self) -> Option<&TermRef> {
        self.unit.as_ref()
    }

    /// Replace the term; a mandatory reference cannot be cleared
    pub fn set_term(&mut self, term: Option<Arc<Term>>) -> Result<()> {
        match term {
            Some(term) => {
                self.term = TermRef::to_term(term);
                Ok(())
            }
            None => Err(QcmlError::InvalidReference(format!(
                "term of '{}' is mandatory",
                self.accession
            ))),
        }
    }

    /// Replace or clear the unit term
    pub fn set_unit_term(&mut self, term: Option<Arc<Term>>) {
        self.unit = term.map(TermRef::to_term);
    }

    /// Set an unresolved unit reference by identifier
    pub fn set_unit_ref(&mut self, term_id: impl Into<String>) {
        self.unit = Some(TermRef::new(term_id));
    }

    /// Both references, mandatory first
    pub fn term_refs(&self) -> impl Iterator<Item = &TermRef> {
        std::iter::once(&self.term).chain(self.unit.as_ref())
    }

    pub fn term_refs_mut(&mut self) -> impl Iterator<Item = &mut TermRef> {
        std::iter::once(&mut self.term).chain(self.unit.as_mut())
    }
}

/// Access shared by every entry kind a record holds
pub trait Entry {
    fn param(&self) -> &CvParameter;
    fn param_mut(&mut self) -> &mut CvParameter;
    /// Identifier of the owning record
    fn record(&self) -> Option<&str>;
    fn set_record(&mut self, record: Option<String>);

    fn accession(&self) -> &str {
        &self.param().accession
    }

    /// Visit every term reference held by this entry
    fn visit_term_refs_mut(&mut self, visit: &mut dyn FnMut(&mut TermRef)) {
        self.param_mut().term_refs_mut().for_each(visit);
    }

    fn visit_term_refs(&self, visit: &mut dyn FnMut(&TermRef)) {
        self.param().term_refs().for_each(visit);
    }
}

/// `metaDataParameter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDataParameter {
    pub param: CvParameter,
    record: Option<String>,
}

impl MetaDataParameter {
    pub fn new(param: CvParameter) -> Self {
        Self { param, record: None }
    }
}

impl Entry for MetaDataParameter {
    fn param(&self) -> &CvParameter {
        &self.param
    }

    fn param_mut(&mut self) -> &mut CvParameter {
        &mut self.param
    }

    fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    fn set_record(&mut self, record: Option<String>) {
        self.record = record;
    }
}

/// `threshold` below a quality parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold {
    pub param: CvParameter,
    pub file_name: Option<String>,
    /// Accession of the owning quality parameter
    parameter: Option<String>,
}

impl Threshold {
    pub fn new(param: CvParameter) -> Self {
        Self {
            param,
            file_name: None,
            parameter: None,
        }
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }
}

/// `qualityParameter`, a measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityParameter {
    pub param: CvParameter,
    pub flag: bool,
    thresholds: HashMap<String, Threshold>,
    record: Option<String>,
}

impl QualityParameter {
    pub fn new(param: CvParameter) -> Self {
        Self {
            param,
            flag: false,
            thresholds: HashMap::new(),
            record: None,
        }
    }

    /// Add a threshold keyed by accession
    ///
    /// Returns the threshold it replaced, detached from this parameter.
    pub fn add_threshold(&mut self, mut threshold: Threshold) -> Option<Threshold> {
        threshold.parameter = Some(self.param.accession.clone());
        let replaced = self
            .thresholds
            .insert(threshold.param.accession.clone(), threshold);
        replaced.map(|mut old| {
            old.parameter = None;
            old
        })
    }

    pub fn threshold(&self, accession: &str) -> Option<&Threshold> {
        self.thresholds.get(accession)
    }

    pub fn remove_threshold(&mut self, accession: &str) -> Option<Threshold> {
        self.thresholds.remove(accession).map(|mut t| {
            t.parameter = None;
            t
        })
    }

    pub fn thresholds(&self) -> impl Iterator<Item = &Threshold> {
        self.thresholds.values()
    }

    pub fn threshold_count(&self) -> usize {
        self.thresholds.len()
    }
}

impl Entry for QualityParameter {
    fn param(&self) -> &CvParameter {
        &self.param
    }

    fn param_mut(&mut self) -> &mut CvParameter {
        &mut self.param
    }

    fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    fn set_record(&mut self, record: Option<String>) {
        self.record = record;
    }

    fn visit_term_refs_mut(&mut self, visit: &mut dyn FnMut(&mut TermRef)) {
        self.param.term_refs_mut().for_each(&mut *visit);
        for threshold in self.thresholds.values_mut() {
            threshold.param.term_refs_mut().for_each(&mut *visit);
        }
    }

    fn visit_term_refs(&self, visit: &mut dyn FnMut(&TermRef)) {
        self.param.term_refs().for_each(&mut *visit);
        for threshold in self.thresholds.values() {
            threshold.param.term_refs().for_each(&mut *visit);
        }
    }
}

/// Payload of an attachment; exactly one is present
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentContent {
    Binary(Vec<u8>),
    Table(Table),
}

/// Link from an attachment to a quality parameter of the same record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLink {
    /// Accession of the target parameter
    pub accession: String,
    /// Whether the target was found in the record
    pub linked: bool,
}

/// `attachment`
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub param: CvParameter,
    content: AttachmentContent,
    link: Option<ParameterLink>,
    record: Option<String>,
}

impl Attachment {
    pub fn new(param: CvParameter, content: AttachmentContent) -> Self {
        let mut attachment = Self {
            param,
            content: AttachmentContent::Binary(Vec::new()),
            link: None,
            record: None,
        };
        attachment.set_content(content);
        attachment
    }

    pub fn content(&self) -> &AttachmentContent {
        &self.content
    }

    /// Replace the payload; a table is attached to this entry
    pub fn set_content(&mut self, mut content: AttachmentContent) {
        if let AttachmentContent::Table(table) = &mut content {
            table.set_attachment(Some(self.param.accession.clone()));
        }
        if let AttachmentContent::Table(old) = &mut self.content {
            old.set_attachment(None);
        }
        self.content = content;
    }

    pub fn binary(&self) -> Option<&[u8]> {
        match &self.content {
            AttachmentContent::Binary(data) => Some(data),
            AttachmentContent::Table(_) => None,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match &self.content {
            AttachmentContent::Table(table) => Some(table),
            AttachmentContent::Binary(_) => None,
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        match &mut self.content {
            AttachmentContent::Table(table) => Some(table),
            AttachmentContent::Binary(_) => None,
        }
    }

    pub fn link(&self) -> Option<&ParameterLink> {
        self.link.as_ref()
    }

    /// Link to a quality parameter by accession, unresolved
    pub fn set_link(&mut self, accession: Option<String>) {
        self.link = accession.map(|accession| ParameterLink {
            accession,
            linked: false,
        });
    }

    pub(crate) fn link_mut(&mut self) -> Option<&mut ParameterLink> {
        self.link.as_mut()
    }
}

impl Entry for Attachment {
    fn param(&self) -> &CvParameter {
        &self.param
    }

    fn param_mut(&mut self) -> &mut CvParameter {
        &mut self.param
    }

    fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    fn set_record(&mut self, record: Option<String>) {
        self.record = record;
    }
}
