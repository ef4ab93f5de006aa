//! In-process table source

use std::time::Instant;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use gv_core::{Column, RemoteError, Row, RowDiff, TableResponse, TableSource};

/// Table held entirely in memory
pub struct MemorySource {
    name: String,
    columns: Vec<Column>,
    rows: RwLock<Vec<Row>>,
}

impl MemorySource {
    /// Create a new in-memory source
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl TableSource for MemorySource {
    async fn request_data(&self, row_offset: usize, count: usize) -> Result<TableResponse, RemoteError> {
        let started = Instant::now();
        let rows = self.rows.read();
        
        let end = row_offset.saturating_add(count).min(rows.len());
        let window = if row_offset < end {
            rows[row_offset..end].to_vec()
        } else {
            Vec::new()
        };
        
        Ok(TableResponse {
            status_message: format!("Fetched {} rows from {}", window.len(), self.name),
            rows: window,
            columns: self.columns.clone(),
            is_fully_loaded: end >= rows.len(),
            duration: Some(started.elapsed()),
        })
    }
    
    async fn save_changes(&self, diffs: &[RowDiff]) -> Result<TableResponse, RemoteError> {
        let started = Instant::now();
        let mut rows = self.rows.write();
        
        // Validate everything before writing anything
        for diff in diffs {
            if diff.row_index >= rows.len() {
                return Err(RemoteError::structured(
                    format!("Row {} does not exist", diff.row_index),
                    Some(json!({ "row_index": diff.row_index, "row_count": rows.len() })),
                ));
            }
            if !self.columns.is_empty() && diff.edited.len() != self.columns.len() {
                return Err(RemoteError::structured(
                    format!("Row {} has {} cells, table has {} columns", diff.row_index, diff.edited.len(), self.columns.len()),
                    None,
                ));
            }
        }
        
        let saved: Vec<Row> = diffs.iter()
            .map(|diff| {
                rows[diff.row_index] = diff.edited.clone();
                diff.edited.clone()
            })
            .collect();
        
        Ok(TableResponse {
            status_message: format!("Saved {} rows to {}", saved.len(), self.name),
            rows: saved,
            columns: self.columns.clone(),
            is_fully_loaded: false,
            duration: Some(started.elapsed()),
        })
    }
    
    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;
    use gv_core::CellValue;
    
    fn source(n: i64) -> MemorySource {
        MemorySource::new(
            "numbers",
            vec![Column::new("n", DataType::Int64, 0)],
            (0..n).map(|i| vec![CellValue::Int(i)]).collect(),
        )
    }
    
    #[tokio::test]
    async fn test_windows() {
        let source = source(5);
        
        let first = source.request_data(0, 3).await.unwrap();
        assert_eq!(first.rows.len(), 3);
        assert!(!first.is_fully_loaded);
        
        let last = source.request_data(3, 3).await.unwrap();
        assert_eq!(last.rows, vec![vec![CellValue::Int(3)], vec![CellValue::Int(4)]]);
        assert!(last.is_fully_loaded);
        
        let past_end = source.request_data(10, 3).await.unwrap();
        assert!(past_end.rows.is_empty());
        assert!(past_end.is_fully_loaded);
    }
    
    #[tokio::test]
    async fn test_save_returns_rows_in_diff_order() {
        let source = source(5);
        let mut a = RowDiff::new(3, vec![CellValue::Int(3)]);
        a.edited = vec![CellValue::Int(30)];
        let mut b = RowDiff::new(1, vec![CellValue::Int(1)]);
        b.edited = vec![CellValue::Int(10)];
        
        let response = source.save_changes(&[a, b]).await.unwrap();
        assert_eq!(response.rows, vec![vec![CellValue::Int(30)], vec![CellValue::Int(10)]]);
        assert_eq!(source.rows.read()[1], vec![CellValue::Int(10)]);
    }
    
    #[tokio::test]
    async fn test_save_unknown_row_writes_nothing() {
        let source = source(2);
        let mut ok = RowDiff::new(0, vec![CellValue::Int(0)]);
        ok.edited = vec![CellValue::Int(99)];
        let missing = RowDiff::new(7, vec![CellValue::Int(7)]);
        
        let err = source.save_changes(&[ok, missing]).await.unwrap_err();
        assert!(err.has_details());
        assert_eq!(source.rows.read()[0], vec![CellValue::Int(0)]);
    }
}
