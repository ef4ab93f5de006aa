//! Save and reconcile pending edits

use ahash::AHashMap;
use tracing::{debug, error, info, warn};

use gv_core::events::events::ChangesCommitted;
use gv_core::{Row, RowDiff, TableResponse};

use crate::bridge::RetryRequest;
use crate::view_model::{GridViewModel, LoaderGuard};
use crate::GridError;

/// How a commit cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// There were no pending edits
    NothingToCommit,
    /// The server confirmed the rows and they were written back
    Committed { rows: usize },
    /// The user declined to retry and the source rows were restored
    Reverted { rows: usize },
    /// The view was reset while the save was in flight
    Superseded,
}

impl GridViewModel {
    /// Save all pending edits.
    ///
    /// A failed save asks the user whether to retry. Retrying resends the
    /// same diffs; declining reverts them. Remote failures are therefore
    /// never returned as errors, only a row count mismatch is.
    ///
    /// Edits made while the save is in flight stay pending for the next commit.
    pub async fn commit_changes(&self) -> Result<CommitOutcome, GridError> {
        let diffs = self.edits.read().get_changes();
        if diffs.is_empty() {
            debug!("Nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }
        
        let resets = self.reset_count();
        let mut attempt = 0;
        
        loop {
            attempt += 1;
            let result = {
                // The loader covers the save itself, not the user's decision
                let _loader = LoaderGuard::show(self, true);
                info!("Saving {} changed rows (attempt {})", diffs.len(), attempt);
                self.source.save_changes(&diffs).await
            };
            
            if self.reset_count() != resets {
                warn!("Discarding save result for a view that was reset");
                return Ok(CommitOutcome::Superseded);
            }
            
            let remote = match result {
                Ok(response) => return self.reconcile(&diffs, response),
                Err(remote) => remote,
            };
            
            warn!("Save failed: {}", remote);
            self.record_error(&remote);
            
            let request = RetryRequest::from_error(&remote);
            let retry = self.dialogs.confirm_retry(&request).await;
            
            if self.reset_count() != resets {
                return Ok(CommitOutcome::Superseded);
            }
            if !retry {
                let rows = self.revert(&diffs);
                return Ok(CommitOutcome::Reverted { rows });
            }
            info!("Retrying save");
        }
    }
    
    /// Write the confirmed rows back, pairing them with the diffs by position
    fn reconcile(&self, diffs: &[RowDiff], response: TableResponse) -> Result<CommitOutcome, GridError> {
        if response.rows.len() != diffs.len() {
            let mismatch = GridError::ResultLengthMismatch {
                expected: diffs.len(),
                actual: response.rows.len(),
            };
            error!("{}", mismatch);
            self.update_state(|state| state.record_failure(mismatch.to_string()));
            return Err(mismatch);
        }
        
        let confirmed: Vec<(usize, Row)> = diffs.iter()
            .map(|diff| diff.row_index)
            .zip(response.rows)
            .collect();
        let mapping: AHashMap<usize, Row> = confirmed.iter().cloned().collect();
        
        self.store.write().update_rows(mapping)?;
        let still_pending = {
            let mut edits = self.edits.write();
            let still_pending = edits.settle(diffs);
            for (row_index, row) in &confirmed {
                if still_pending.contains(row_index) {
                    edits.rebase(*row_index, row.clone());
                }
            }
            still_pending
        };
        if !still_pending.is_empty() {
            debug!("Rows {:?} were edited during the save and stay pending", still_pending);
        }
        
        // The widget keeps showing newer edits
        for (row_index, row) in &confirmed {
            if !still_pending.contains(row_index) {
                self.bridge.update_row_value(*row_index, row);
            }
        }
        
        self.record_success(response.status_message, response.duration);
        
        let row_indices: Vec<usize> = confirmed.iter().map(|(index, _)| *index).collect();
        info!("Committed {} rows", row_indices.len());
        self.events().publish(ChangesCommitted { row_indices });
        
        Ok(CommitOutcome::Committed { rows: confirmed.len() })
    }
}
