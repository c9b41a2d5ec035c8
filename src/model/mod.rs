//! Domain model
//!
//! Plain data populated by the decoder. Containers own their children by
//! value; children point back at their owner by identifier only.
//!
//! ```text
//! Document
//! ├── terms: id -> Arc<Term>
//! ├── runs / sets: id -> Record
//! │   ├── metadata:    accession -> MetaDataParameter
//! │   ├── quality:     accession -> QualityParameter
//! │   │   └── thresholds: accession -> Threshold
//! │   └── attachments: accession -> Attachment (binary | Table)
//! ```

pub mod document;
pub mod entry;
pub mod record;
pub mod table;
pub mod term;

pub use document::{Document, DocumentId};
pub use entry::{
    Attachment, AttachmentContent, CvParameter, Entry, MetaDataParameter, ParameterLink,
    QualityParameter, Threshold,
};
pub use record::{Record, RecordKind};
pub use table::{Cell, CellKind, Table};
pub use term::{Term, TermRef};
