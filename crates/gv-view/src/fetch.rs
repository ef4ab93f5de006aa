//! Fetch orchestration: serve windows from the store or the remote source

use tracing::{debug, error, info, warn};

use gv_core::events::events::{FetchFailed, WindowLoaded};
use gv_core::{Column, Row, TableResponse};

use crate::view_model::{GridViewModel, LoaderGuard};
use crate::GridError;

/// A window of rows handed to the grid widget
#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
    pub is_fully_loaded: bool,
}

impl GridViewModel {
    /// Resolve a window of rows, from the store when possible.
    ///
    /// Window bounds are trusted; clamping happens in `set_chunk_size`.
    pub async fn request_window(&self, offset: usize, count: usize) -> Result<WindowData, GridError> {
        if self.is_window_cached(offset, count) {
            debug!("Serving rows {}..{} from store", offset, offset.saturating_add(count));
            let window = self.window_from_store(offset, count);
            self.publish_loaded(offset, count, &window, true);
            return Ok(window);
        }
        
        let generation = self.generation();
        let show_loader = !self.config.no_loader_while_requesting_data;
        let loader = LoaderGuard::show(self, show_loader);
        
        info!("Requesting {} rows at offset {} from {}", count, offset, self.source.source_name());
        let result = self.source.request_data(offset, count).await;
        
        if self.generation() != generation {
            warn!("Discarding rows at offset {} fetched before a reset or cancel", offset);
            return Err(GridError::Superseded { generation });
        }
        
        match result {
            Ok(response) => {
                if let Err(err) = self.apply_window(offset, response) {
                    error!("Rejected rows fetched at offset {}: {}", offset, err);
                    self.update_state(|state| state.record_failure(err.to_string()));
                    drop(loader);
                    
                    self.publish_failed(offset, count, err.to_string());
                    return Err(err);
                }
                drop(loader);
                
                let window = self.window_from_store(offset, count);
                self.publish_loaded(offset, count, &window, false);
                Ok(window)
            }
            Err(remote) => {
                error!("Failed to fetch rows at offset {}: {}", offset, remote);
                self.record_error(&remote);
                drop(loader);
                
                self.publish_failed(offset, count, remote.user_message());
                Err(GridError::Remote(remote))
            }
        }
    }
    
    /// Whether a window can be served without a remote call.
    ///
    /// Once fully loaded, nothing exists past the known rows, so only the
    /// part of the window inside them has to be materialized.
    fn is_window_cached(&self, offset: usize, count: usize) -> bool {
        let fully_loaded = self.state().is_fully_loaded();
        let store = self.store.read();
        
        if store.is_chunk_loaded(offset, count) {
            return true;
        }
        if fully_loaded {
            let available = store.len().saturating_sub(offset).min(count);
            return store.is_chunk_loaded(offset, available);
        }
        false
    }
    
    fn window_from_store(&self, offset: usize, count: usize) -> WindowData {
        let is_fully_loaded = self.state().is_fully_loaded();
        let store = self.store.read();
        WindowData {
            rows: store.get_chunk(offset, count),
            columns: store.columns().to_vec(),
            is_fully_loaded,
        }
    }
    
    /// Merge a fetched window into the store and session state
    fn apply_window(&self, offset: usize, response: TableResponse) -> Result<(), GridError> {
        let TableResponse {
            rows,
            columns,
            is_fully_loaded,
            duration,
            status_message,
        } = response;
        
        let extends = {
            let mut store = self.store.write();
            if store.columns().is_empty() && !columns.is_empty() {
                info!("Adopting schema with {} columns", columns.len());
            }
            
            // Only a window reaching past the known rows may change has_more_rows
            let previous_len = store.len();
            let extends = offset >= previous_len || offset + rows.len() > previous_len;
            debug!("Merging {} rows at offset {} (known rows: {})", rows.len(), offset, previous_len);
            store.insert_window(offset, columns, rows)?;
            extends
        };
        
        self.update_state(|state| {
            // Never reopened by a partial fetch
            if extends && state.has_more_rows {
                state.has_more_rows = !is_fully_loaded;
            }
        });
        self.record_success(status_message, duration);
        Ok(())
    }
    
    fn publish_failed(&self, offset: usize, count: usize, error: String) {
        self.events().publish(FetchFailed { offset, count, error });
    }
    
    fn publish_loaded(&self, offset: usize, count: usize, window: &WindowData, from_cache: bool) {
        self.events().publish(WindowLoaded {
            offset,
            count,
            rows: window.rows.len(),
            from_cache,
            fully_loaded: window.is_fully_loaded,
        });
    }
}
