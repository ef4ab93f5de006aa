//! Column schema

use arrow::datatypes::DataType;

/// A column of the table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Semantic type of the column
    pub data_type: DataType,
    /// Ordinal position within the row
    pub ordinal: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, data_type: DataType, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            ordinal,
        }
    }
}
