use thiserror::Error;
use gv_core::RemoteError;
use gv_data::DataError;

/// Errors surfaced by the grid view-model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    
    #[error(transparent)]
    Data(#[from] DataError),
    
    /// The save returned a different number of rows than it was given.
    /// Not recoverable by retrying.
    #[error("Save returned {actual} rows for {expected} changed rows")]
    ResultLengthMismatch { expected: usize, actual: usize },
    
    /// The response resolved after the view was reset and was not applied
    #[error("Response discarded, view was reset (request generation {generation})")]
    Superseded { generation: u64 },
}
