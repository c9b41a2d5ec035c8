//! Random-access reading
//!
//! - Snippet: byte range of the source to decoded text
//! - Iter: lazy per-element decoding over index entries
//! - Handle: [`QcmlReader`], owning the source, index, decoder and document

pub mod handle;
pub mod iter;
pub mod snippet;

pub use handle::QcmlReader;
pub use iter::{DocumentTerms, LazyIter, RecordIter};
pub use snippet::SnippetReader;
