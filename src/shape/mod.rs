//! Shape adapter
//!
//! Converts between the wire shape of records (flat ordered entry lists,
//! raw identifiers, text tables) and the domain model (maps keyed by
//! accession, shared terms). Every field mapping is written out by hand.

pub mod element;
pub mod record;
pub mod table;
pub mod terms;
pub mod wire;

pub use record::{from_wire, to_wire};
pub use table::{table_from_wire, table_to_wire};
pub use terms::terms_from_wire;
pub use wire::{
    WireAttachment, WireEntry, WireParameter, WireQuality, WireRecord, WireTable, WireThreshold,
};
