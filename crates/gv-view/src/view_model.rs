//! The grid view-model: owned state, edits and reset handling

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::{debug, info};

use gv_core::events::events::{ChangesReverted, DataReset};
use gv_core::{
    CellValue, Column, EventBus, GridConfig, RemoteError, RowDiff, SessionState,
    SubscriberList, TableSource, ViewModelSubscriber,
};
use gv_data::{DataError, EditTracker, RowStore};

use crate::bridge::{DialogPresenter, PresentationBridge};
use crate::GridError;

/// View-model of one table view.
///
/// All mutation goes through its own methods. State changes are pushed to
/// subscribers after every mutation, with no lock held.
pub struct GridViewModel {
    pub(crate) source: Arc<dyn TableSource>,
    pub(crate) dialogs: Arc<dyn DialogPresenter>,
    pub(crate) config: GridConfig,
    pub(crate) store: RwLock<RowStore>,
    pub(crate) edits: RwLock<EditTracker>,
    pub(crate) bridge: PresentationBridge,
    state: RwLock<SessionState>,
    last_error: RwLock<Option<RemoteError>>,
    generation: AtomicU64,
    resets: AtomicU64,
    subscribers: SubscriberList,
    events: EventBus,
}

impl GridViewModel {
    /// Create a new view-model over a remote source
    pub fn new(
        source: Arc<dyn TableSource>,
        dialogs: Arc<dyn DialogPresenter>,
        config: GridConfig,
    ) -> Self {
        let chunk_size = config.initial_chunk_size();
        info!("Creating grid view over {} (chunk size {})", source.source_name(), chunk_size);
        
        Self {
            source,
            dialogs,
            config,
            store: RwLock::new(RowStore::new()),
            edits: RwLock::new(EditTracker::new()),
            bridge: PresentationBridge::default(),
            state: RwLock::new(SessionState::new(chunk_size)),
            last_error: RwLock::new(None),
            generation: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            subscribers: SubscriberList::new(),
            events: EventBus::new(),
        }
    }
    
    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }
    
    pub fn columns(&self) -> Vec<Column> {
        self.store.read().columns().to_vec()
    }
    
    /// Lifecycle events of this view
    pub fn events(&self) -> &EventBus {
        &self.events
    }
    
    /// Add a state subscriber. It is held weakly.
    pub fn subscribe(&self, subscriber: Arc<dyn ViewModelSubscriber>) {
        self.subscribers.add(subscriber);
    }
    
    /// Last error reported by the remote source, cleared by the next success
    pub fn last_error(&self) -> Option<RemoteError> {
        self.last_error.read().clone()
    }
    
    /// Current fetch generation. Bumped by every reset and by `cancel_fetch`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
    
    /// Number of resets so far. Saves are only discarded by a reset.
    pub(crate) fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::SeqCst)
    }
    
    /// Clamp and apply a new window size, then tell the widget
    pub fn set_chunk_size(&self, requested: usize) -> usize {
        let chunk_size = self.config.limits.clamp(requested);
        self.update_state(|state| state.chunk_size = chunk_size);
        self.bridge.change_chunk_size(chunk_size);
        debug!("Chunk size set to {} (requested {})", chunk_size, requested);
        chunk_size
    }
    
    /// Edit one cell of a loaded row. The store is not touched until commit.
    pub fn edit_cell_value(&self, row_index: usize, column: usize, value: CellValue) -> Result<(), GridError> {
        let current = self.store
            .read()
            .get_row(row_index)
            .cloned()
            .ok_or(DataError::RowNotLoaded(row_index))?;
        
        let mut edits = self.edits.write();
        edits.edit_cell_value(row_index, &current, column, value)?;
        debug!("Edited row {} column {} ({} rows pending)", row_index, column, edits.len());
        Ok(())
    }
    
    /// Pending diffs in ascending row order
    pub fn pending_changes(&self) -> Vec<RowDiff> {
        self.edits.read().get_changes()
    }
    
    pub fn has_pending_changes(&self) -> bool {
        !self.edits.read().is_empty()
    }
    
    /// Value of a cell as the user sees it, pending edits included
    pub fn cell_value(&self, row_index: usize, column: usize) -> Option<CellValue> {
        if let Some(row) = self.edits.read().edited_row(row_index) {
            return row.get(column).cloned();
        }
        self.store.read().get_row(row_index)?.get(column).cloned()
    }
    
    /// Discard pending edits and restore their source rows in the widget
    pub fn cancel_changes(&self) -> usize {
        let diffs = self.edits.read().get_changes();
        self.revert(&diffs)
    }
    
    /// Drop all rows, pending edits and session state. The schema is kept.
    ///
    /// Responses to requests started before the reset are discarded.
    pub fn reset_data(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.resets.fetch_add(1, Ordering::SeqCst);
        
        self.store.write().reset_data();
        self.edits.write().cancel_changes();
        *self.last_error.write() = None;
        self.update_state(|state| {
            // A request still in flight keeps its loader until it resolves
            let loader_visible = state.is_loader_visible;
            *state = SessionState::new(state.chunk_size);
            state.is_loader_visible = loader_visible;
        });
        
        self.bridge.reset_data();
        self.events.publish(DataReset { generation });
        info!("Grid data reset (generation {})", generation);
    }
    
    /// Full reset, including the column schema
    pub fn refresh(&self) {
        self.store.write().reset_schema();
        self.reset_data();
    }
    
    /// Discard the response of any in-flight fetch. Saves are unaffected.
    pub fn cancel_fetch(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("In-flight requests cancelled (generation {})", generation);
    }
    
    /// Drop `diffs` and restore their source rows in the widget.
    /// Rows edited again since `diffs` was taken keep the newer edit.
    pub(crate) fn revert(&self, diffs: &[RowDiff]) -> usize {
        let still_pending = self.edits.write().settle(diffs);
        let reverted: Vec<&RowDiff> = diffs
            .iter()
            .filter(|diff| !still_pending.contains(&diff.row_index))
            .collect();
        for diff in &reverted {
            self.bridge.update_row_value(diff.row_index, &diff.source);
        }
        
        let row_indices: Vec<usize> = reverted.iter().map(|d| d.row_index).collect();
        info!("Reverted {} changed rows ({} edited again)", row_indices.len(), still_pending.len());
        self.events.publish(ChangesReverted { row_indices });
        reverted.len()
    }
    
    /// Apply a state transition and notify subscribers
    pub(crate) fn update_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = f(&mut state);
            (result, state.clone())
        };
        self.subscribers.notify(&snapshot);
        result
    }
    
    pub(crate) fn record_error(&self, error: &RemoteError) {
        *self.last_error.write() = Some(error.clone());
        self.update_state(|state| state.record_error(error));
    }
    
    pub(crate) fn record_success(&self, status_message: String, duration: Option<std::time::Duration>) {
        *self.last_error.write() = None;
        self.update_state(|state| state.record_success(status_message, duration));
    }
}

/// Keeps the loader visible while alive. Dropping it hides the loader on
/// every exit path.
pub(crate) struct LoaderGuard<'a> {
    view_model: &'a GridViewModel,
    active: bool,
}

impl<'a> LoaderGuard<'a> {
    pub(crate) fn show(view_model: &'a GridViewModel, visible: bool) -> Self {
        if visible {
            view_model.update_state(|state| state.is_loader_visible = true);
        }
        Self {
            view_model,
            active: visible,
        }
    }
}

impl Drop for LoaderGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            self.view_model.update_state(|state| state.is_loader_visible = false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    
    #[tokio::test]
    async fn test_edit_requires_loaded_row() {
        let h = Harness::new(10);
        let err = h.vm.edit_cell_value(3, 0, "x".into()).unwrap_err();
        assert_eq!(err, GridError::Data(DataError::RowNotLoaded(3)));
    }
    
    #[tokio::test]
    async fn test_edits_do_not_touch_store() {
        let h = Harness::new(10);
        h.vm.request_window(0, 5).await.unwrap();
        
        h.vm.edit_cell_value(2, 1, "X".into()).unwrap();
        h.vm.edit_cell_value(2, 1, "Y".into()).unwrap();
        
        assert_eq!(h.vm.cell_value(2, 1), Some(CellValue::from("Y")));
        assert_eq!(h.vm.store.read().get_row(2).unwrap()[1], CellValue::from("name-2"));
        
        let pending = h.vm.pending_changes();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].source[1], CellValue::from("name-2"));
    }
    
    #[tokio::test]
    async fn test_cancel_changes_restores_widget_rows() {
        let h = Harness::new(10);
        h.vm.request_window(0, 5).await.unwrap();
        h.vm.edit_cell_value(1, 1, "X".into()).unwrap();
        h.vm.edit_cell_value(4, 1, "Y".into()).unwrap();
        
        assert_eq!(h.vm.cancel_changes(), 2);
        assert!(!h.vm.has_pending_changes());
        
        let updates = h.widget.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].0, 1);
        assert_eq!(updates[0].1[1], CellValue::from("name-1"));
        assert_eq!(h.source.save_count(), 0);
    }
    
    #[tokio::test]
    async fn test_set_chunk_size_clamps_and_notifies() {
        let h = Harness::new(10);
        assert_eq!(h.vm.set_chunk_size(0), 200);
        assert_eq!(h.vm.set_chunk_size(10_000), 5000);
        assert_eq!(h.vm.set_chunk_size(50), 50);
        
        assert_eq!(h.vm.state().chunk_size, 50);
        assert_eq!(*h.widget.chunk_sizes.lock(), vec![200, 5000, 50]);
    }
    
    #[tokio::test]
    async fn test_reset_is_like_first_load() {
        let h = Harness::new(10);
        h.source.fail_next_fetch(RemoteError::generic("Timeout", "too slow"));
        assert!(h.vm.request_window(0, 5).await.is_err());
        h.vm.request_window(0, 5).await.unwrap();
        h.vm.edit_cell_value(0, 1, "X".into()).unwrap();
        h.vm.set_chunk_size(5);
        
        h.vm.reset_data();
        
        let state = h.vm.state();
        assert_eq!(state, SessionState::new(5));
        assert!(h.vm.is_empty());
        assert!(!h.vm.has_pending_changes());
        assert_eq!(h.vm.last_error(), None);
        assert_eq!(h.widget.resets.load(std::sync::atomic::Ordering::SeqCst), 1);
        
        // Columns survive a data reset
        assert_eq!(h.vm.columns().len(), 2);
        
        let fetches_before = h.source.fetch_count();
        let window = h.vm.request_window(0, 5).await.unwrap();
        assert_eq!(window.rows.len(), 5);
        assert_eq!(h.source.fetch_count(), fetches_before + 1);
        
        let state = h.vm.state();
        assert_eq!(state.error_message, None);
        assert!(state.status_message.is_some());
    }
    
    #[tokio::test]
    async fn test_refresh_drops_schema() {
        let h = Harness::new(3);
        h.vm.request_window(0, 3).await.unwrap();
        h.vm.refresh();
        assert!(h.vm.columns().is_empty());
        
        h.vm.request_window(0, 3).await.unwrap();
        assert_eq!(h.vm.columns().len(), 2);
    }
}
