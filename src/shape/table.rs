//! Table text conversion
//!
//! Header and rows are split on runs of whitespace and joined with single
//! spaces, so values containing whitespace do not survive a round trip.
//! Missing cells are written as empty strings, which then collapse.

use crate::model::Table;

use super::wire::WireTable;

/// Build a table from its text form
///
/// Surplus values in a row are dropped; short rows leave cells missing.
pub fn table_from_wire(wire: &WireTable) -> Table {
    let mut table = Table::new(wire.column_types.split_whitespace());
    for row in &wire.rows {
        table.push_row(row.split_whitespace());
    }
    table
}

/// Write a table as text, columns in header order
pub fn table_to_wire(table: &Table) -> WireTable {
    WireTable {
        column_types: table.columns().join(" "),
        rows: (0..table.row_count())
            .map(|row| {
                table
                    .row(row)
                    .into_iter()
                    .map(|cell| cell.unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect(),
    }
}
