//! RustyQcML - Random-access reading of large qcML documents
//!
//! Components:
//! - index: one-pass offset index over runs, sets and cv terms
//! - reader: snippet reads, lazy iterators and the document handle
//! - decode: fragment decoding with the root namespace context
//! - shape: wire shape <-> domain model
//! - resolve: term references to shared terms, decoded on demand
//! - store: persistence contract and an in-memory store
//!
//! ```no_run
//! use rustyqcml::{QcmlReader, RecordKind};
//!
//! # fn main() -> rustyqcml::Result<()> {
//! let mut reader = QcmlReader::open("run.qcML")?;
//! for record in reader.runs() {
//!     let record = record?;
//!     println!("{} has {} entries", record.id(), record.entry_count());
//! }
//! if let Some(set) = reader.load_record(RecordKind::Set, "set_0")? {
//!     println!("{}", set.id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod decode;
pub mod error;
pub mod index;
pub mod model;
pub mod reader;
pub mod resolve;
pub mod shape;
pub mod store;

pub use decode::{DecodeContext, Element, FromElement, NamespaceContext};
pub use error::{QcmlError, Result};
pub use index::{ByteRange, ElementKind, IndexCache, IndexEntry, IndexOptions, IndexedType, OffsetIndex};
pub use model::{
    Attachment, AttachmentContent, Cell, CellKind, CvParameter, Document, DocumentId, Entry,
    MetaDataParameter, QualityParameter, Record, RecordKind, Table, Term, TermRef, Threshold,
};
pub use reader::{LazyIter, QcmlReader, RecordIter, SnippetReader};
pub use resolve::{resolve, ResolveReport, TermCache, TermSource};
pub use store::{DocumentStore, MemoryStore};
