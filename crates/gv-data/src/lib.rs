//! Row storage, edit tracking and table sources for the grid view-model

pub mod edits;
pub mod sources;
pub mod store;

use thiserror::Error;

// Re-exports
pub use edits::EditTracker;
pub use sources::{MemorySource, SqliteSource};
pub use store::RowStore;

/// Errors that can occur in data operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Row {0} has not been loaded")]
    RowNotLoaded(usize),
    
    #[error("Column {column} out of range for a row of {arity} cells")]
    ColumnOutOfRange { column: usize, arity: usize },
    
    #[error("Row {row} has {actual} cells, schema has {expected} columns")]
    ArityMismatch { row: usize, expected: usize, actual: usize },
    
    #[error("Column schema is already set")]
    SchemaAlreadySet,
    
    #[error("SQLite error: {0}")]
    Sqlite(String),
    
    #[error("Schema detection error: {0}")]
    SchemaDetection(String),
}

impl From<rusqlite::Error> for DataError {
    fn from(error: rusqlite::Error) -> Self {
        DataError::Sqlite(error.to_string())
    }
}
