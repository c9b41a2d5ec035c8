//! Offset Index Module
//!
//! Random access into a large document without keeping it in memory. The
//! index stores only byte ranges and identifiers for the selected element
//! types; everything else is read back from the source on demand.
//!
//! ## Architecture
//!
//! ```text
//! OffsetIndex
//! ├── records: Vec<IndexEntry>      # runQuality + setQuality, document order
//! ├── terms: Vec<IndexEntry>        # cvList/cv, document order
//! ├── by_id: identifier -> entry    # one map per indexed type
//! ├── encoding                      # detected from BOM / XML declaration
//! └── namespaces                    # root element declarations
//! ```
//!
//! An `IndexEntry` is an identifier plus two ranges: the whole element and
//! its opening tag.

pub mod builder;
pub mod cache;
pub mod offset;
pub mod selector;
pub mod span;

pub use cache::IndexCache;
pub use offset::{IndexEntry, IndexOptions, OffsetIndex};
pub use selector::{ElementKind, IndexedType};
pub use span::ByteRange;
