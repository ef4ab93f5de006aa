//! Pending edits tracked as per-row diffs

use std::collections::BTreeMap;
use gv_core::{CellValue, Row, RowDiff};
use crate::DataError;

/// Records cell edits as one diff per row, keyed by row index.
///
/// The tracker never writes to the store. Edits stay visible only through
/// the tracker until the save controller reconciles them.
#[derive(Debug, Default)]
pub struct EditTracker {
    pending: BTreeMap<usize, RowDiff>,
}

impl EditTracker {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Edit one cell.
    ///
    /// The first edit of a row snapshots `current` as the diff's source;
    /// later edits update the existing diff and ignore `current`.
    pub fn edit_cell_value(
        &mut self,
        row_index: usize,
        current: &Row,
        column: usize,
        value: CellValue,
    ) -> Result<&RowDiff, DataError> {
        let arity = self.pending
            .get(&row_index)
            .map_or(current.len(), |diff| diff.edited.len());
        if column >= arity {
            return Err(DataError::ColumnOutOfRange { column, arity });
        }
        
        let diff = self.pending
            .entry(row_index)
            .or_insert_with(|| RowDiff::new(row_index, current.clone()));
        diff.edited[column] = value;
        
        Ok(&*diff)
    }
    
    /// Pending diffs in ascending row order
    pub fn get_changes(&self) -> Vec<RowDiff> {
        self.pending.values().cloned().collect()
    }
    
    /// Edited value of a row, if it has pending edits
    pub fn edited_row(&self, row_index: usize) -> Option<&Row> {
        self.pending.get(&row_index).map(|diff| &diff.edited)
    }
    
    pub fn len(&self) -> usize {
        self.pending.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
    
    /// Drop the pending diffs matching `sent`.
    ///
    /// A row edited again after `sent` was taken keeps its diff. Returns the
    /// indices of those rows.
    pub fn settle(&mut self, sent: &[RowDiff]) -> Vec<usize> {
        let mut still_pending = Vec::new();
        for diff in sent {
            match self.pending.get(&diff.row_index) {
                Some(current) if current.edited != diff.edited => still_pending.push(diff.row_index),
                _ => {
                    self.pending.remove(&diff.row_index);
                }
            }
        }
        still_pending
    }
    
    /// Replace the source snapshot of a pending row
    pub fn rebase(&mut self, row_index: usize, source: Row) {
        if let Some(diff) = self.pending.get_mut(&row_index) {
            diff.source = source;
        }
    }
    
    /// Clear the pending set without writing anything back
    pub fn cancel_changes(&mut self) {
        self.pending.clear();
    }
}
