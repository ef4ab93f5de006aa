//! Pending edit records

use serde::{Deserialize, Serialize};
use crate::Row;

/// The pending edit of one row, holding both the pristine and the edited values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDiff {
    /// Position of the row in the table
    pub row_index: usize,
    /// Row as it was before the first edit
    pub source: Row,
    /// Row with all pending edits applied
    pub edited: Row,
}

impl RowDiff {
    /// Start a diff from the pristine row
    pub fn new(row_index: usize, source: Row) -> Self {
        Self {
            row_index,
            edited: source.clone(),
            source,
        }
    }
    
    /// Indices of the columns whose edited value differs from the source
    pub fn changed_columns(&self) -> Vec<usize> {
        self.source.iter()
            .zip(self.edited.iter())
            .enumerate()
            .filter(|(_, (before, after))| before != after)
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    
    #[test]
    fn test_changed_columns() {
        let mut diff = RowDiff::new(4, vec![CellValue::Int(1), CellValue::from("a")]);
        assert!(diff.changed_columns().is_empty());
        
        diff.edited[1] = CellValue::from("b");
        assert_eq!(diff.changed_columns(), vec![1]);
    }
}
