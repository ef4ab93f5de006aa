//! Sparse row/column store with loaded-range tracking

use std::ops::Range;
use ahash::AHashMap;
use gv_core::{Column, Row};
use crate::DataError;

/// Ordered, sparse-capable table of rows.
///
/// Materialized rows are tracked as sorted, disjoint, non-adjacent ranges so
/// presence checks cost O(log ranges) rather than a scan.
#[derive(Debug, Default)]
pub struct RowStore {
    rows: Vec<Option<Row>>,
    columns: Vec<Column>,
    loaded: Vec<Range<usize>>,
}

impl RowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Number of known row positions, including gaps
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
    
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    
    pub fn loaded_ranges(&self) -> &[Range<usize>] {
        &self.loaded
    }
    
    /// Whether every row in `[offset, offset + count)` has been materialized
    pub fn is_chunk_loaded(&self, offset: usize, count: usize) -> bool {
        if count == 0 {
            return true;
        }
        let end = offset.saturating_add(count);
        let idx = self.loaded.partition_point(|r| r.start <= offset);
        idx > 0 && self.loaded[idx - 1].end >= end
    }
    
    /// Materialized rows in `[offset, offset + count)`.
    ///
    /// Positions past the end or not yet loaded are skipped; callers check
    /// `is_chunk_loaded` first.
    pub fn get_chunk(&self, offset: usize, count: usize) -> Vec<Row> {
        let end = offset.saturating_add(count).min(self.rows.len());
        if offset >= end {
            return Vec::new();
        }
        self.rows[offset..end]
            .iter()
            .filter_map(|row| row.clone())
            .collect()
    }
    
    /// Get a single materialized row
    pub fn get_row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index).and_then(|row| row.as_ref())
    }
    
    /// Write rows starting at `position`, extending the store if needed.
    /// Rows already present at those positions are overwritten.
    pub fn insert_rows(&mut self, position: usize, rows: Vec<Row>) -> Result<(), DataError> {
        for (i, row) in rows.iter().enumerate() {
            self.check_arity(position + i, row)?;
        }
        if rows.is_empty() {
            return Ok(());
        }
        
        let end = position + rows.len();
        if self.rows.len() < end {
            self.rows.resize(end, None);
        }
        for (slot, row) in self.rows[position..end].iter_mut().zip(rows) {
            *slot = Some(row);
        }
        self.mark_loaded(position..end);
        Ok(())
    }
    
    /// Append rows at the current end
    pub fn push_rows(&mut self, rows: Vec<Row>) -> Result<(), DataError> {
        self.insert_rows(self.rows.len(), rows)
    }
    
    /// Replace the column schema. Only valid while no schema is set.
    pub fn over_write(&mut self, columns: Vec<Column>) -> Result<(), DataError> {
        if !self.columns.is_empty() {
            return Err(DataError::SchemaAlreadySet);
        }
        self.columns = columns;
        Ok(())
    }
    
    /// Insert a fetched window, adopting `columns` if no schema is set yet.
    ///
    /// Every row is checked against the resulting schema before the schema
    /// or any row is written.
    pub fn insert_window(&mut self, position: usize, columns: Vec<Column>, rows: Vec<Row>) -> Result<(), DataError> {
        let adopt = self.columns.is_empty() && !columns.is_empty();
        let arity = if adopt { columns.len() } else { self.columns.len() };
        for (i, row) in rows.iter().enumerate() {
            check_arity(position + i, row, arity)?;
        }
        
        if adopt {
            self.columns = columns;
        }
        self.insert_rows(position, rows)
    }
    
    /// Drop the column schema so a refresh can adopt a new one
    pub fn reset_schema(&mut self) {
        self.columns.clear();
    }
    
    /// Overwrite already materialized rows. Nothing is written if any entry is invalid.
    pub fn update_rows(&mut self, mapping: AHashMap<usize, Row>) -> Result<(), DataError> {
        for (&index, row) in &mapping {
            if self.get_row(index).is_none() {
                return Err(DataError::RowNotLoaded(index));
            }
            self.check_arity(index, row)?;
        }
        for (index, row) in mapping {
            self.rows[index] = Some(row);
        }
        Ok(())
    }
    
    /// Clear all rows and loaded ranges. Columns are kept.
    pub fn reset_data(&mut self) {
        self.rows.clear();
        self.loaded.clear();
    }
    
    fn check_arity(&self, index: usize, row: &Row) -> Result<(), DataError> {
        check_arity(index, row, self.columns.len())
    }
    
    fn mark_loaded(&mut self, range: Range<usize>) {
        let mut merged = range;
        let mut kept = Vec::with_capacity(self.loaded.len() + 1);
        
        for existing in self.loaded.drain(..) {
            // Adjacent ranges merge too
            if existing.end < merged.start || existing.start > merged.end {
                kept.push(existing);
            } else {
                merged.start = merged.start.min(existing.start);
                merged.end = merged.end.max(existing.end);
            }
        }
        
        let idx = kept.partition_point(|r| r.start < merged.start);
        kept.insert(idx, merged);
        self.loaded = kept;
    }
}

/// A zero arity means no schema is known yet and accepts any row
fn check_arity(index: usize, row: &Row, arity: usize) -> Result<(), DataError> {
    if arity > 0 && row.len() != arity {
        return Err(DataError::ArityMismatch {
            row: index,
            expected: arity,
            actual: row.len(),
        });
    }
    Ok(())
}
