//! Wire shapes
//!
//! The shape records have in the markup: a flat, ordered list of mixed
//! entries with every term reference as a raw identifier.

use crate::model::RecordKind;

/// Fields shared by every wire entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireParameter {
    pub id: Option<String>,
    pub name: String,
    pub accession: String,
    pub cv_ref: String,
    pub value: Option<String>,
    pub unit_accession: Option<String>,
    pub unit_name: Option<String>,
    pub unit_cv_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireThreshold {
    pub param: WireParameter,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireQuality {
    pub param: WireParameter,
    pub flag: bool,
    pub thresholds: Vec<WireThreshold>,
}

/// Table as text: whitespace-separated header and rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireTable {
    pub column_types: String,
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireAttachment {
    pub param: WireParameter,
    /// `qualityParameterRef`
    pub quality_parameter_ref: Option<String>,
    /// Base64 payload
    pub binary: Option<String>,
    pub table: Option<WireTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEntry {
    MetaData(WireParameter),
    Quality(WireQuality),
    Attachment(WireAttachment),
}

impl WireEntry {
    pub fn param(&self) -> &WireParameter {
        match self {
            WireEntry::MetaData(param) => param,
            WireEntry::Quality(quality) => &quality.param,
            WireEntry::Attachment(attachment) => &attachment.param,
        }
    }
}

/// A record as it appears in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    pub id: String,
    pub kind: RecordKind,
    pub entries: Vec<WireEntry>,
}
