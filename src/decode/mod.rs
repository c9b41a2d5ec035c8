//! Fragment decoding
//!
//! - Namespace: root declarations captured by the index, replayed around fragments
//! - Decoder: quick-xml based parse of a fragment into an [`Element`] tree
//! - Schema: required attributes and permitted children per element

pub mod decoder;
pub mod element;
pub mod namespace;
pub mod schema;

pub use decoder::{DecodeContext, FromElement, ValidationSuspended};
pub use element::Element;
pub use namespace::NamespaceContext;
