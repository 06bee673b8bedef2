//! Backing store that persists sync batches

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rowsync_core::{GridModel, GridState, SyncChange, SyncProgress, SyncResult};

/// Persists a batch of row changes.
///
/// Returns one result per change. A per-row failure is reported with
/// `success == false`; an `Err` means the whole batch was rejected and no
/// row is touched, except for results already handed to the reporter.
#[async_trait]
pub trait SyncBackend<M: GridModel>: Send + Sync {
    async fn sync_changes(
        &self,
        batch: Vec<SyncChange<M>>,
        reporter: ProgressReporter<M>,
    ) -> anyhow::Result<Vec<SyncResult<M>>>;
}

/// Handle a backend uses to publish progress while a sync runs.
///
/// Each call locks the grid briefly, records the progress and reconciles any
/// interim results straight away. Calls after the sync finished only apply
/// their results.
pub struct ProgressReporter<M> {
    state: Arc<Mutex<GridState<M>>>,
    on_report: Arc<dyn Fn() + Send + Sync>,
}

impl<M> Clone for ProgressReporter<M> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            on_report: self.on_report.clone(),
        }
    }
}

impl<M: GridModel> ProgressReporter<M> {
    pub(crate) fn new(
        state: Arc<Mutex<GridState<M>>>,
        on_report: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        Self { state, on_report }
    }

    pub fn report(&self, progress: SyncProgress, interim: Option<Vec<SyncResult<M>>>) {
        let summary = self
            .state
            .lock()
            .report_progress(progress, interim.as_deref());
        tracing::debug!(
            current = progress.current,
            total = progress.total,
            committed = summary.committed.len(),
            "Sync progress"
        );
        (self.on_report)();
    }
}
