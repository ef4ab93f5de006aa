//! Presentation bridge between the view-model and the grid widget

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use gv_core::{Column, RemoteError, Row};

use crate::view_model::GridViewModel;

/// Actions handle injected by the grid widget. Calls are notifications only.
pub trait GridActions: Send + Sync {
    fn change_chunk_size(&self, chunk_size: usize);
    
    /// Drop every row the widget holds
    fn reset_data(&self);
    
    /// Replace the displayed values of one row
    fn update_row_value(&self, row_index: usize, row: &Row);
}

/// Request shown to the user after a failed save
#[derive(Debug, Clone, PartialEq)]
pub struct RetryRequest {
    pub message: String,
    /// Present only when the error carries structured detail
    pub details: Option<serde_json::Value>,
}

impl RetryRequest {
    pub fn from_error(error: &RemoteError) -> Self {
        Self {
            message: error.user_message(),
            details: error.detail().cloned(),
        }
    }
    
    pub fn can_show_details(&self) -> bool {
        self.details.is_some()
    }
}

/// Dialog layer used for the retry prompt and the error details view
#[async_trait]
pub trait DialogPresenter: Send + Sync {
    /// Ask whether a failed save should be retried
    async fn confirm_retry(&self, request: &RetryRequest) -> bool;
    
    /// Open the details view of an error
    fn show_details(&self, message: &str, detail: &serde_json::Value);
}

/// Initial props for mounting the grid widget
#[derive(Debug, Clone, PartialEq)]
pub struct GridBinding {
    pub initial_rows: Vec<Row>,
    pub initial_columns: Vec<Column>,
    pub chunk_size: usize,
}

/// Forwards notifications to the attached widget, if any
#[derive(Default)]
pub struct PresentationBridge {
    actions: RwLock<Option<Arc<dyn GridActions>>>,
}

impl PresentationBridge {
    pub fn attach(&self, actions: Arc<dyn GridActions>) {
        *self.actions.write() = Some(actions);
    }
    
    pub fn is_attached(&self) -> bool {
        self.actions.read().is_some()
    }
    
    fn actions(&self) -> Option<Arc<dyn GridActions>> {
        self.actions.read().clone()
    }
    
    pub fn change_chunk_size(&self, chunk_size: usize) {
        if let Some(actions) = self.actions() {
            actions.change_chunk_size(chunk_size);
        }
    }
    
    pub fn reset_data(&self) {
        if let Some(actions) = self.actions() {
            actions.reset_data();
        }
    }
    
    pub fn update_row_value(&self, row_index: usize, row: &Row) {
        match self.actions() {
            Some(actions) => actions.update_row_value(row_index, row),
            None => debug!("No widget attached, dropping update of row {}", row_index),
        }
    }
}

impl GridViewModel {
    /// Inject the widget's actions handle
    pub fn attach_widget(&self, actions: Arc<dyn GridActions>) {
        self.bridge.attach(actions);
    }
    
    /// Props for mounting the widget on the rows loaded so far
    pub fn grid_binding(&self) -> GridBinding {
        let chunk_size = self.state().chunk_size;
        let store = self.store.read();
        GridBinding {
            initial_rows: store.get_chunk(0, chunk_size),
            initial_columns: store.columns().to_vec(),
            chunk_size,
        }
    }
    
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }
    
    pub fn is_loader_visible(&self) -> bool {
        self.state().is_loader_visible
    }
    
    pub fn is_fully_loaded(&self) -> bool {
        self.state().is_fully_loaded()
    }
    
    /// Status message with the duration of the last remote call
    pub fn status_line(&self) -> Option<String> {
        let state = self.state();
        let message = state.status_message?;
        Some(match state.duration {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                let millis = Duration::from_millis(millis);
                format!("{} ({})", message, humantime::format_duration(millis))
            }
            None => message,
        })
    }
    
    /// Open the details view when the last error carries structured detail.
    /// Returns whether it was opened.
    pub fn show_error_details(&self) -> bool {
        let Some(error) = self.last_error() else {
            return false;
        };
        match error.detail() {
            Some(detail) => {
                self.dialogs.show_details(&error.user_message(), detail);
                true
            }
            None => false,
        }
    }
}
