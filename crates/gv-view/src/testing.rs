//! Scripted collaborators for view-model tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use arrow::datatypes::DataType;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use gv_core::{
    CellValue, Column, GridConfig, RemoteError, Row, RowDiff, SessionState, TableResponse,
    TableSource, ViewModelSubscriber,
};
use gv_data::MemorySource;

use crate::bridge::{DialogPresenter, GridActions, RetryRequest};
use crate::GridViewModel;

pub(crate) fn person(i: usize) -> Row {
    vec![CellValue::Int(i as i64), CellValue::Text(format!("name-{}", i))]
}

pub(crate) fn people_columns() -> Vec<Column> {
    vec![
        Column::new("id", DataType::Int64, 0),
        Column::new("name", DataType::Utf8, 1),
    ]
}

/// Tracks the loader flag as subscribers see it
#[derive(Default)]
pub(crate) struct LoaderWatch {
    visible: AtomicBool,
    history: Mutex<Vec<bool>>,
}

impl LoaderWatch {
    pub(crate) fn visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
    
    pub(crate) fn history(&self) -> Vec<bool> {
        self.history.lock().clone()
    }
}

impl ViewModelSubscriber for LoaderWatch {
    fn on_state_change(&self, state: &SessionState) {
        self.visible.store(state.is_loader_visible, Ordering::SeqCst);
        self.history.lock().push(state.is_loader_visible);
    }
}

/// Memory-backed source with scripted failures and overrides
pub(crate) struct ScriptedSource {
    inner: MemorySource,
    watch: Arc<LoaderWatch>,
    fetches: AtomicUsize,
    pub(crate) saves: Mutex<Vec<Vec<RowDiff>>>,
    pub(crate) loader_seen: Mutex<Vec<bool>>,
    fetch_errors: Mutex<VecDeque<RemoteError>>,
    save_errors: Mutex<VecDeque<RemoteError>>,
    fully_loaded_override: Mutex<Option<bool>>,
    columns_override: Mutex<Option<Vec<Column>>>,
    save_rows_override: Mutex<Option<Vec<Row>>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedSource {
    fn new(row_count: usize, watch: Arc<LoaderWatch>) -> Self {
        Self {
            inner: MemorySource::new("people", people_columns(), (0..row_count).map(person).collect()),
            watch,
            fetches: AtomicUsize::new(0),
            saves: Mutex::new(Vec::new()),
            loader_seen: Mutex::new(Vec::new()),
            fetch_errors: Mutex::new(VecDeque::new()),
            save_errors: Mutex::new(VecDeque::new()),
            fully_loaded_override: Mutex::new(None),
            columns_override: Mutex::new(None),
            save_rows_override: Mutex::new(None),
            gate: Mutex::new(None),
        }
    }
    
    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
    
    pub(crate) fn save_count(&self) -> usize {
        self.saves.lock().len()
    }
    
    pub(crate) fn fail_next_fetch(&self, error: RemoteError) {
        self.fetch_errors.lock().push_back(error);
    }
    
    pub(crate) fn fail_next_save(&self, error: RemoteError) {
        self.save_errors.lock().push_back(error);
    }
    
    pub(crate) fn set_fully_loaded_override(&self, value: Option<bool>) {
        *self.fully_loaded_override.lock() = value;
    }
    
    pub(crate) fn set_columns_override(&self, columns: Option<Vec<Column>>) {
        *self.columns_override.lock() = columns;
    }
    
    pub(crate) fn set_save_rows_override(&self, rows: Option<Vec<Row>>) {
        *self.save_rows_override.lock() = rows;
    }
    
    /// Hold the next remote call until the returned gate is notified
    pub(crate) fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }
    
    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl TableSource for ScriptedSource {
    async fn request_data(&self, row_offset: usize, count: usize) -> Result<TableResponse, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.loader_seen.lock().push(self.watch.visible());
        self.wait_for_gate().await;
        
        let error = self.fetch_errors.lock().pop_front();
        if let Some(error) = error {
            return Err(error);
        }
        
        let mut response = self.inner.request_data(row_offset, count).await?;
        if let Some(value) = *self.fully_loaded_override.lock() {
            response.is_fully_loaded = value;
        }
        if let Some(columns) = self.columns_override.lock().clone() {
            response.columns = columns;
        }
        Ok(response)
    }
    
    async fn save_changes(&self, diffs: &[RowDiff]) -> Result<TableResponse, RemoteError> {
        self.saves.lock().push(diffs.to_vec());
        self.loader_seen.lock().push(self.watch.visible());
        self.wait_for_gate().await;
        
        let error = self.save_errors.lock().pop_front();
        if let Some(error) = error {
            return Err(error);
        }
        
        let mut response = self.inner.save_changes(diffs).await?;
        if let Some(rows) = self.save_rows_override.lock().clone() {
            response.rows = rows;
        }
        Ok(response)
    }
    
    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}

/// Dialog answering retry prompts from a script. Unscripted prompts decline.
#[derive(Default)]
pub(crate) struct ScriptedDialog {
    watch: Arc<LoaderWatch>,
    answers: Mutex<VecDeque<bool>>,
    pub(crate) requests: Mutex<Vec<RetryRequest>>,
    pub(crate) loader_seen: Mutex<Vec<bool>>,
    pub(crate) details_shown: Mutex<Vec<String>>,
}

impl ScriptedDialog {
    pub(crate) fn answer(&self, retry: bool) {
        self.answers.lock().push_back(retry);
    }
    
    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl DialogPresenter for ScriptedDialog {
    async fn confirm_retry(&self, request: &RetryRequest) -> bool {
        self.requests.lock().push(request.clone());
        self.loader_seen.lock().push(self.watch.visible());
        self.answers.lock().pop_front().unwrap_or(false)
    }
    
    fn show_details(&self, message: &str, _detail: &serde_json::Value) {
        self.details_shown.lock().push(message.to_string());
    }
}

/// Widget double recording every notification
#[derive(Default)]
pub(crate) struct RecordingWidget {
    pub(crate) updates: Mutex<Vec<(usize, Row)>>,
    pub(crate) chunk_sizes: Mutex<Vec<usize>>,
    pub(crate) resets: AtomicUsize,
}

impl RecordingWidget {
    pub(crate) fn updates(&self) -> Vec<(usize, Row)> {
        self.updates.lock().clone()
    }
}

impl GridActions for RecordingWidget {
    fn change_chunk_size(&self, chunk_size: usize) {
        self.chunk_sizes.lock().push(chunk_size);
    }
    
    fn reset_data(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
    
    fn update_row_value(&self, row_index: usize, row: &Row) {
        self.updates.lock().push((row_index, row.clone()));
    }
}

pub(crate) struct Harness {
    pub(crate) vm: GridViewModel,
    pub(crate) source: Arc<ScriptedSource>,
    pub(crate) dialogs: Arc<ScriptedDialog>,
    pub(crate) widget: Arc<RecordingWidget>,
    pub(crate) watch: Arc<LoaderWatch>,
}

impl Harness {
    pub(crate) fn new(row_count: usize) -> Self {
        Self::with_config(row_count, GridConfig::default())
    }
    
    pub(crate) fn with_config(row_count: usize, config: GridConfig) -> Self {
        let watch = Arc::new(LoaderWatch::default());
        let source = Arc::new(ScriptedSource::new(row_count, watch.clone()));
        let dialogs = Arc::new(ScriptedDialog {
            watch: watch.clone(),
            ..ScriptedDialog::default()
        });
        let widget = Arc::new(RecordingWidget::default());
        
        let vm = GridViewModel::new(source.clone(), dialogs.clone(), config);
        vm.attach_widget(widget.clone());
        vm.subscribe(watch.clone());
        
        Self {
            vm,
            source,
            dialogs,
            widget,
            watch,
        }
    }
}
