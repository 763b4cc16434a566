//! Conceptual table reconstruction from a walk.

use std::collections::HashMap;

use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// A walked table, one row per distinct index.
///
/// Column instances are named `table.entry.column.index`; everything after
/// the column arc is the row index. Rows keep the order in which their index
/// was first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    table_oid: Oid,
    columns: usize,
    rows: Vec<(Oid, Vec<Option<Value>>)>,
}

impl Table {
    /// Arrange walked bindings into rows.
    ///
    /// Assumes the walk visited every column for every row, column by column,
    /// so the column count is `entries / rows`. Incomplete columns leave
    /// `None` cells; surplus entries grow the affected rows.
    pub fn from_varbinds(table_oid: &Oid, varbinds: &[VarBind]) -> Self {
        let prefix_len = table_oid.len() + 2;
        let mut positions: HashMap<Oid, usize> = HashMap::new();
        let mut indices: Vec<Oid> = Vec::new();
        let mut cells: Vec<(usize, &Value)> = Vec::with_capacity(varbinds.len());

        for vb in varbinds {
            let index = vb
                .oid
                .suffix(prefix_len)
                .filter(|index| !index.is_empty() && vb.oid.starts_with(table_oid));
            let Some(index) = index else {
                tracing::debug!(target: "snmp_engine::client", { snmp.oid = %vb.oid, snmp.table = %table_oid }, "skipping binding outside table column layout");
                continue;
            };
            let row = *positions.entry(index.clone()).or_insert_with(|| {
                indices.push(index);
                indices.len() - 1
            });
            cells.push((row, &vb.value));
        }

        let entries = cells.len();
        let row_count = indices.len();
        let columns = entries.checked_div(row_count).unwrap_or(0);

        let mut rows: Vec<(Oid, Vec<Option<Value>>)> = indices
            .into_iter()
            .map(|index| (index, vec![None; columns]))
            .collect();

        let mut column = 0;
        let mut grown = false;
        for (row, value) in cells {
            let row_cells = &mut rows[row].1;
            if column >= row_cells.len() {
                row_cells.resize(column + 1, None);
                grown = true;
            }
            row_cells[column] = Some(value.clone());
            if row + 1 == row_count {
                column += 1;
            }
        }

        if grown || entries % row_count.max(1) != 0 {
            tracing::warn!(target: "snmp_engine::client", { snmp.table = %table_oid, entries, rows = row_count, columns }, "table rows have unequal populations");
        }

        Self {
            table_oid: table_oid.clone(),
            columns,
            rows,
        }
    }

    pub fn table_oid(&self) -> &Oid {
        &self.table_oid
    }

    /// Column count derived from the walk.
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in first-seen order.
    pub fn rows(&self) -> impl Iterator<Item = (&Oid, &[Option<Value>])> {
        self.rows
            .iter()
            .map(|(index, cells)| (index, cells.as_slice()))
    }

    /// Cells of the row with `index`.
    pub fn get(&self, index: &Oid) -> Option<&[Option<Value>]> {
        self.rows
            .iter()
            .find(|(i, _)| i == index)
            .map(|(_, cells)| cells.as_slice())
    }
}
