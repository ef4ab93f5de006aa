//! Core types for the grid view-model
//! 
//! This crate provides the shared model (cells, rows, columns, diffs), the
//! remote collaborator contract, configuration and change notification.

pub mod cell;
pub mod config;
pub mod diff;
pub mod error;
pub mod events;
pub mod schema;
pub mod state;

// Re-export commonly used types
pub use cell::{CellValue, Row};
pub use config::{FetchLimits, GridConfig};
pub use diff::RowDiff;
pub use error::RemoteError;
pub use events::EventBus;
pub use schema::Column;
pub use state::{SessionState, SubscriberList, ViewModelSubscriber};
pub use data::{TableResponse, TableSource};

/// Remote tabular data contract
pub mod data {
    use std::time::Duration;
    use crate::{Column, RemoteError, Row, RowDiff};
    
    /// Response of a remote fetch or save
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct TableResponse {
        /// Rows of the window (fetch) or the confirmed rows in diff order (save)
        pub rows: Vec<Row>,
        /// Column schema as known by the server
        pub columns: Vec<Column>,
        /// Whether no further rows exist past this response
        pub is_fully_loaded: bool,
        /// Server-side duration, if reported
        pub duration: Option<Duration>,
        pub status_message: String,
    }
    
    /// Trait for remote table sources
    #[async_trait::async_trait]
    pub trait TableSource: Send + Sync {
        /// Fetch `count` rows starting at `row_offset`
        async fn request_data(&self, row_offset: usize, count: usize) -> Result<TableResponse, RemoteError>;
        
        /// Persist edited rows. The returned rows align positionally with `diffs`.
        async fn save_changes(&self, diffs: &[RowDiff]) -> Result<TableResponse, RemoteError>;
        
        /// Get the source name
        fn source_name(&self) -> &str;
    }
}
